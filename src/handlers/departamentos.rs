// src/handlers/departamentos.rs

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
    models::departamento::{
        CreateDepartamentoPayload, Departamento, DepartamentoDetalle, DepartamentoNodo,
        UpdateDepartamentoPayload,
    },
};

#[utoipa::path(
    get,
    path = "/api/departamentos",
    tag = "Departamentos",
    responses(
        (status = 200, description = "Departamentos con dirección, usuarios y subdepartamentos", body = [DepartamentoDetalle])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_departamentos(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let departamentos = app_state.departamento_service.list().await?;
    Ok((StatusCode::OK, Json(departamentos)))
}

#[utoipa::path(
    get,
    path = "/api/departamentos/jerarquia/completa",
    tag = "Departamentos",
    responses(
        (status = 200, description = "Árbol completo desde los departamentos raíz", body = [DepartamentoNodo])
    ),
    security(("api_jwt" = []))
)]
pub async fn get_jerarquia(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let arbol = app_state.departamento_service.jerarquia().await?;
    Ok((StatusCode::OK, Json(arbol)))
}

#[utoipa::path(
    get,
    path = "/api/departamentos/direccion/{id}",
    tag = "Departamentos",
    params(("id" = i32, Path, description = "ID de la dirección")),
    responses(
        (status = 200, description = "Departamentos de la dirección", body = [DepartamentoDetalle]),
        (status = 404, description = "La dirección no tiene departamentos")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_departamentos_by_direccion(
    State(app_state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, AppError> {
    let departamentos = app_state.departamento_service.get_by_direccion(id).await?;
    Ok((StatusCode::OK, Json(departamentos)))
}

#[utoipa::path(
    get,
    path = "/api/departamentos/{id}",
    tag = "Departamentos",
    params(("id" = i32, Path, description = "ID del departamento")),
    responses(
        (status = 200, description = "Departamento con sus relaciones", body = DepartamentoDetalle),
        (status = 404, description = "Departamento no encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_departamento(
    State(app_state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<impl IntoResponse, AppError> {
    let departamento = app_state.departamento_service.get(id).await?;
    Ok((StatusCode::OK, Json(departamento)))
}

#[utoipa::path(
    post,
    path = "/api/departamentos",
    tag = "Departamentos",
    request_body = CreateDepartamentoPayload,
    responses(
        (status = 201, description = "Departamento creado", body = Departamento),
        (status = 404, description = "Dirección o padre inexistente"),
        (status = 409, description = "El padre pertenece a otra dirección")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_departamento(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    ValidatedJson(payload): ValidatedJson<CreateDepartamentoPayload>,
) -> Result<impl IntoResponse, AppError> {
    let departamento = app_state.departamento_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(departamento)))
}

#[utoipa::path(
    put,
    path = "/api/departamentos/{id}",
    tag = "Departamentos",
    params(("id" = i32, Path, description = "ID del departamento")),
    request_body = UpdateDepartamentoPayload,
    responses(
        (status = 200, description = "Departamento actualizado", body = Departamento),
        (status = 400, description = "La jerarquía resultante tendría un ciclo"),
        (status = 404, description = "Departamento, dirección o padre inexistente"),
        (status = 409, description = "Cambio incompatible con sus dependientes")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_departamento(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    PathParam(id): PathParam<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateDepartamentoPayload>,
) -> Result<impl IntoResponse, AppError> {
    let departamento = app_state.departamento_service.update(id, payload).await?;
    Ok((StatusCode::OK, Json(departamento)))
}

#[utoipa::path(
    delete,
    path = "/api/departamentos/{id}",
    tag = "Departamentos",
    params(("id" = i32, Path, description = "ID del departamento")),
    responses(
        (status = 204, description = "Departamento eliminado junto con sus permisos"),
        (status = 404, description = "Departamento no encontrado"),
        (status = 409, description = "Tiene usuarios o subdepartamentos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_departamento(
    State(app_state): State<AppState>,
    _guard: RequireAdmin,
    PathParam(id): PathParam<i32>,
) -> Result<StatusCode, AppError> {
    app_state.departamento_service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
