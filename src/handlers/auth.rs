use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::{error::AppError, extract::ValidatedJson},
    config::AppState,
    models::auth::{AuthResponse, LoginPayload, RegistroPayload},
};

// Handler de registro
#[utoipa::path(
    post,
    path = "/api/auth/registro",
    tag = "Auth",
    request_body = RegistroPayload,
    responses(
        (status = 201, description = "Usuario registrado con rol 'usuario'", body = AuthResponse),
        (status = 400, description = "Datos inválidos"),
        (status = 409, description = "Correo o cédula ya registrados")
    )
)]
pub async fn registro(
    State(app_state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegistroPayload>,
) -> Result<impl IntoResponse, AppError> {
    let respuesta = app_state.auth_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(respuesta)))
}

// Handler de login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token emitido", body = AuthResponse),
        (status = 401, description = "Credenciales inválidas o usuario inactivo")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    let respuesta = app_state
        .auth_service
        .login(&payload.correo, &payload.password)
        .await?;
    Ok((StatusCode::OK, Json(respuesta)))
}
