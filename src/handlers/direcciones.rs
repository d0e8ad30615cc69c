// src/handlers/direcciones.rs

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
    models::direccion::{CreateDireccionPayload, Direccion, DireccionDetalle, UpdateDireccionPayload},
};

#[utoipa::path(
    get,
    path = "/api/direcciones",
    tag = "Direcciones",
    responses(
        (status = 200, description = "Direcciones con sus departamentos", body = [DireccionDetalle])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_direcciones(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let direcciones = app_state.direccion_service.list().await?;
    Ok((StatusCode::OK, Json(direcciones)))
}

#[utoipa::path(
    get,
    path = "/api/direcciones/{id}",
    tag = "Direcciones",
    params(("id" = i32, Path, description = "ID de la dirección")),
    responses(
        (status = 200, description = "Dirección con sus departamentos", body = DireccionDetalle),
        (status = 404, description = "Dirección no encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_direccion(
    State(app_state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, AppError> {
    let direccion = app_state.direccion_service.get(id).await?;
    Ok((StatusCode::OK, Json(direccion)))
}

#[utoipa::path(
    post,
    path = "/api/direcciones",
    tag = "Direcciones",
    request_body = CreateDireccionPayload,
    responses(
        (status = 201, description = "Dirección creada", body = Direccion),
        (status = 403, description = "Solo administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_direccion(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    ValidatedJson(payload): ValidatedJson<CreateDireccionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let direccion = app_state.direccion_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(direccion)))
}

#[utoipa::path(
    put,
    path = "/api/direcciones/{id}",
    tag = "Direcciones",
    params(("id" = i32, Path, description = "ID de la dirección")),
    request_body = UpdateDireccionPayload,
    responses(
        (status = 200, description = "Dirección actualizada", body = Direccion),
        (status = 404, description = "Dirección no encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_direccion(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    PathParam(id): PathParam<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateDireccionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let direccion = app_state.direccion_service.update(id, payload).await?;
    Ok((StatusCode::OK, Json(direccion)))
}

#[utoipa::path(
    delete,
    path = "/api/direcciones/{id}",
    tag = "Direcciones",
    params(("id" = i32, Path, description = "ID de la dirección")),
    responses(
        (status = 204, description = "Dirección eliminada"),
        (status = 404, description = "Dirección no encontrada"),
        (status = 409, description = "La dirección tiene departamentos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_direccion(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    PathParam(id): PathParam<i32>,
) -> Result<StatusCode, AppError> {
    app_state.direccion_service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
