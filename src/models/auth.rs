// src/models/auth.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::usuario::{validate_fecha_pasada, CreateUsuarioPayload, Rol, Usuario};

// Registro público. No admite rol: todo registro nace como `usuario`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegistroPayload {
    #[validate(length(min = 1, message = "El nombre es requerido"))]
    pub nombre: String,

    #[validate(email(message = "Formato de correo inválido"))]
    pub correo: String,

    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres"))]
    pub password: String,

    #[validate(length(min = 1, message = "El número de cédula es requerido"))]
    pub numero_cedula: String,

    #[validate(custom(function = "validate_fecha_pasada"))]
    #[schema(value_type = String, example = "1990-01-31")]
    pub fecha_nacimiento: NaiveDate,

    #[validate(length(min = 1, message = "El número de celular es requerido"))]
    pub celular: String,

    pub nom_contacto_emerg: Option<String>,
    pub tel_contacto_emerg: Option<String>,

    #[serde(rename = "direccionId")]
    pub direccion_id: i32,

    #[serde(rename = "departamentoId")]
    pub departamento_id: i32,
}

impl From<RegistroPayload> for CreateUsuarioPayload {
    fn from(p: RegistroPayload) -> Self {
        CreateUsuarioPayload {
            nombre: p.nombre,
            correo: p.correo,
            password: p.password,
            rol: Some(Rol::Usuario),
            activo: Some(true),
            numero_cedula: p.numero_cedula,
            fecha_nacimiento: p.fecha_nacimiento,
            fecha_salida: None,
            celular: p.celular,
            nom_contacto_emerg: p.nom_contacto_emerg,
            tel_contacto_emerg: p.tel_contacto_emerg,
            direccion_id: p.direccion_id,
            departamento_id: p.departamento_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "Formato de correo inválido"))]
    #[schema(example = "admin@gadjaramijo.gob.ec")]
    pub correo: String,

    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres"))]
    pub password: String,
}

// Datos públicos del usuario que acompañan al token.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsuarioResumen {
    pub id: i32,
    pub nombre: String,
    pub correo: String,
    pub rol: Rol,
}

impl From<&Usuario> for UsuarioResumen {
    fn from(u: &Usuario) -> Self {
        UsuarioResumen {
            id: u.id,
            nombre: u.nombre.clone(),
            correo: u.correo.clone(),
            rol: u.rol,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub usuario: UsuarioResumen,
    pub access_token: String,
}

// "claims" del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32, // ID del usuario
    pub correo: String,
    pub nombre: String,
    pub rol: Rol,
    pub exp: usize,
    pub iat: usize,
}
