use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Tipo de error único de la aplicación; cada variante sabe qué status HTTP le toca.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de validación")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Cuerpo de la petición inválido: {0}")]
    MalformedPayload(String),

    #[error("Parámetro de ruta inválido: {0}")]
    InvalidPathParam(String),

    #[error("{0}")]
    NotFound(String),

    // Unicidad o consistencia entre entidades (duplicados, departamento
    // fuera de su dirección, borrado bloqueado por dependientes).
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidHierarchy(String),

    #[error("Credenciales inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuario inactivo")]
    InactiveUser,

    #[error("Permisos insuficientes")]
    Forbidden,

    #[error("Error de base de datos")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Error interno del servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Error de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Error de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn not_found(entidad: &str, id: i32) -> Self {
        AppError::NotFound(format!("{} con ID {} no encontrado", entidad, id))
    }

    pub fn direccion_not_found(id: i32) -> Self {
        AppError::NotFound(format!("Dirección con ID {} no encontrada", id))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MalformedPayload(_)
            | AppError::InvalidPathParam(_)
            | AppError::InvalidHierarchy(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::InactiveUser => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match self {
            // Devuelve el detalle de cada campo inválido.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Uno o más campos son inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::MalformedPayload(_)
            | AppError::InvalidPathParam(_)
            | AppError::NotFound(_)
            | AppError::Conflict(_)
            | AppError::InvalidHierarchy(_) => self.to_string(),
            AppError::InvalidCredentials => "Correo o contraseña inválidos.".to_string(),
            AppError::InvalidToken => "Token de autenticación inválido o ausente.".to_string(),
            AppError::InactiveUser => "El usuario está inactivo.".to_string(),
            AppError::Forbidden => "No tiene permisos para realizar esta acción.".to_string(),

            // El resto (base de datos, bcrypt, jwt, anyhow) termina en 500;
            // el detalle queda en el log y no se expone al cliente.
            ref e => {
                tracing::error!("Error interno del servidor: {:?}", e);
                "Ocurrió un error inesperado.".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_http_status() {
        assert_eq!(AppError::not_found("Permiso", 2).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("duplicado").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InvalidHierarchy("ciclo".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::InactiveUser.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = AppError::not_found("Usuario", 2);
        assert_eq!(err.to_string(), "Usuario con ID 2 no encontrado");
    }
}
