// src/handlers/usuarios.rs

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
    middleware::{auth::AuthenticatedUser, rbac::RequireAdmin},
    models::usuario::{CreateUsuarioPayload, UpdateUsuarioPayload, Usuario, UsuarioDetalle},
};

#[utoipa::path(
    get,
    path = "/api/usuarios",
    tag = "Usuarios",
    responses(
        (status = 200, description = "Usuarios activos", body = [UsuarioDetalle])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_usuarios(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let usuarios = app_state.usuario_service.list(false).await?;
    Ok((StatusCode::OK, Json(usuarios)))
}

#[utoipa::path(
    get,
    path = "/api/usuarios/todos",
    tag = "Usuarios",
    responses(
        (status = 200, description = "Usuarios activos e inactivos", body = [UsuarioDetalle]),
        (status = 403, description = "Solo administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_todos_usuarios(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
) -> Result<impl IntoResponse, AppError> {
    let usuarios = app_state.usuario_service.list(true).await?;
    Ok((StatusCode::OK, Json(usuarios)))
}

// Perfil del usuario del token.
#[utoipa::path(
    get,
    path = "/api/usuarios/perfil",
    tag = "Usuarios",
    responses(
        (status = 200, description = "Usuario autenticado", body = UsuarioDetalle)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_perfil(
    State(app_state): State<AppState>,
    AuthenticatedUser(usuario): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let perfil = app_state.usuario_service.get(usuario.id).await?;
    Ok((StatusCode::OK, Json(perfil)))
}

#[utoipa::path(
    get,
    path = "/api/usuarios/{id}",
    tag = "Usuarios",
    params(("id" = i32, Path, description = "ID del usuario")),
    responses(
        (status = 200, description = "Usuario (activo o no) con su dirección y departamento", body = UsuarioDetalle),
        (status = 404, description = "Usuario no encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_usuario(
    State(app_state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, AppError> {
    let usuario = app_state.usuario_service.get(id).await?;
    Ok((StatusCode::OK, Json(usuario)))
}

#[utoipa::path(
    post,
    path = "/api/usuarios",
    tag = "Usuarios",
    request_body = CreateUsuarioPayload,
    responses(
        (status = 201, description = "Usuario creado", body = Usuario),
        (status = 404, description = "Dirección o departamento inexistente"),
        (status = 409, description = "Correo o cédula duplicados, o departamento fuera de la dirección")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_usuario(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    ValidatedJson(payload): ValidatedJson<CreateUsuarioPayload>,
) -> Result<impl IntoResponse, AppError> {
    let usuario = app_state.usuario_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(usuario)))
}

#[utoipa::path(
    put,
    path = "/api/usuarios/{id}",
    tag = "Usuarios",
    params(("id" = i32, Path, description = "ID del usuario")),
    request_body = UpdateUsuarioPayload,
    responses(
        (status = 200, description = "Usuario actualizado", body = Usuario),
        (status = 404, description = "Usuario, dirección o departamento inexistente"),
        (status = 409, description = "Correo o cédula duplicados, o departamento fuera de la dirección")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_usuario(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    PathParam(id): PathParam<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateUsuarioPayload>,
) -> Result<impl IntoResponse, AppError> {
    let usuario = app_state.usuario_service.update(id, payload).await?;
    Ok((StatusCode::OK, Json(usuario)))
}

// Baja lógica: el usuario queda inactivo, no se borra.
#[utoipa::path(
    delete,
    path = "/api/usuarios/{id}",
    tag = "Usuarios",
    params(("id" = i32, Path, description = "ID del usuario")),
    responses(
        (status = 204, description = "Usuario desactivado"),
        (status = 404, description = "Usuario no encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_usuario(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    PathParam(id): PathParam<i32>,
) -> Result<StatusCode, AppError> {
    app_state.usuario_service.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
