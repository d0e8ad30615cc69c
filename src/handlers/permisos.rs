// src/handlers/permisos.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{
        error::AppError,
        extract::{PathParam, ValidatedJson},
    },
    config::AppState,
    middleware::rbac::RequireAdmin,
    models::permiso::{CreatePermisoPayload, Permiso, PermisoDetalle, UpdatePermisoPayload},
};

#[utoipa::path(
    get,
    path = "/api/permisos",
    tag = "Permisos",
    responses(
        (status = 200, description = "Permisos con usuario, dirección y departamento", body = [PermisoDetalle])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_permisos(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
) -> Result<impl IntoResponse, AppError> {
    let permisos = app_state.permiso_service.list().await?;
    Ok((StatusCode::OK, Json(permisos)))
}

#[utoipa::path(
    get,
    path = "/api/permisos/usuario/{id}",
    tag = "Permisos",
    params(("id" = i32, Path, description = "ID del usuario")),
    responses(
        (status = 200, description = "Permisos del usuario", body = [PermisoDetalle])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_permisos_by_usuario(
    State(app_state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, AppError> {
    let permisos = app_state.permiso_service.list_by_usuario(id).await?;
    Ok((StatusCode::OK, Json(permisos)))
}

#[utoipa::path(
    get,
    path = "/api/permisos/{id}",
    tag = "Permisos",
    params(("id" = i32, Path, description = "ID del permiso")),
    responses(
        (status = 200, description = "Permiso", body = PermisoDetalle),
        (status = 404, description = "Permiso no encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_permiso(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, AppError> {
    let permiso = app_state.permiso_service.get(id).await?;
    Ok((StatusCode::OK, Json(permiso)))
}

#[utoipa::path(
    post,
    path = "/api/permisos",
    tag = "Permisos",
    request_body = CreatePermisoPayload,
    responses(
        (status = 201, description = "Permiso otorgado", body = Permiso),
        (status = 404, description = "Usuario, dirección o departamento inexistente"),
        (status = 409, description = "Permiso duplicado o departamento fuera de la dirección")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_permiso(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    ValidatedJson(payload): ValidatedJson<CreatePermisoPayload>,
) -> Result<impl IntoResponse, AppError> {
    let permiso = app_state.permiso_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(permiso)))
}

#[utoipa::path(
    put,
    path = "/api/permisos/{id}",
    tag = "Permisos",
    params(("id" = i32, Path, description = "ID del permiso")),
    request_body = UpdatePermisoPayload,
    responses(
        (status = 200, description = "Permiso actualizado", body = Permiso),
        (status = 404, description = "Permiso o entidad referenciada inexistente"),
        (status = 409, description = "Permiso duplicado o departamento fuera de la dirección")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_permiso(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    PathParam(id): PathParam<i32>,
    ValidatedJson(payload): ValidatedJson<UpdatePermisoPayload>,
) -> Result<impl IntoResponse, AppError> {
    let permiso = app_state.permiso_service.update(id, payload).await?;
    Ok((StatusCode::OK, Json(permiso)))
}

#[utoipa::path(
    delete,
    path = "/api/permisos/{id}",
    tag = "Permisos",
    params(("id" = i32, Path, description = "ID del permiso")),
    responses(
        (status = 204, description = "Permiso revocado"),
        (status = 404, description = "Permiso no encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_permiso(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    PathParam(id): PathParam<i32>,
) -> Result<StatusCode, AppError> {
    app_state.permiso_service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
