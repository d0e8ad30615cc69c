// src/models/usuario.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::{departamento::Departamento, direccion::Direccion};

// Mapea el CREATE TYPE rol_usuario de la migración.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "rol_usuario", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Admin,
    #[default]
    Usuario,
    Supervisor,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Usuario {
    #[schema(example = 3)]
    pub id: i32,

    #[schema(example = "María Zambrano")]
    pub nombre: String,

    #[schema(example = "maria.zambrano@gadjaramijo.gob.ec")]
    pub correo: String,

    #[serde(skip_serializing)] // nunca sale en las respuestas
    #[schema(ignore)]
    pub password: String,

    pub rol: Rol,
    pub activo: bool,

    #[schema(example = "1301234567")]
    pub numero_cedula: String,

    pub fecha_nacimiento: NaiveDate,
    pub fecha_registro: DateTime<Utc>,
    pub fecha_salida: Option<DateTime<Utc>>,

    #[schema(example = "0997654321")]
    pub celular: String,

    pub nom_contacto_emerg: Option<String>,
    pub tel_contacto_emerg: Option<String>,

    #[serde(rename = "direccionId")]
    pub direccion_id: i32,

    #[serde(rename = "departamentoId")]
    pub departamento_id: i32,
}

// Usuario con su dirección y su departamento.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsuarioDetalle {
    #[serde(flatten)]
    pub usuario: Usuario,

    pub direccion: Option<Direccion>,
    pub departamento: Option<Departamento>,
}

// Fila lista para insertar: relaciones ya validadas y contraseña ya hasheada.
#[derive(Debug, Clone)]
pub struct NuevoUsuario {
    pub nombre: String,
    pub correo: String,
    pub password: String,
    pub rol: Rol,
    pub activo: bool,
    pub numero_cedula: String,
    pub fecha_nacimiento: NaiveDate,
    pub fecha_registro: DateTime<Utc>,
    pub fecha_salida: Option<DateTime<Utc>>,
    pub celular: String,
    pub nom_contacto_emerg: Option<String>,
    pub tel_contacto_emerg: Option<String>,
    pub direccion_id: i32,
    pub departamento_id: i32,
}

pub(crate) fn validate_fecha_pasada(fecha: &NaiveDate) -> Result<(), ValidationError> {
    if *fecha > Utc::now().date_naive() {
        let mut err = ValidationError::new("fecha_futura");
        err.message = Some("La fecha de nacimiento no puede estar en el futuro".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUsuarioPayload {
    #[validate(length(min = 1, message = "El nombre es requerido"))]
    pub nombre: String,

    #[validate(email(message = "Formato de correo inválido"))]
    pub correo: String,

    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres"))]
    pub password: String,

    pub rol: Option<Rol>,

    pub activo: Option<bool>,

    #[validate(length(min = 1, message = "El número de cédula es requerido"))]
    pub numero_cedula: String,

    #[validate(custom(function = "validate_fecha_pasada"))]
    #[schema(value_type = String, example = "1985-05-10")]
    pub fecha_nacimiento: NaiveDate,

    pub fecha_salida: Option<DateTime<Utc>>,

    #[validate(length(min = 1, message = "El número de celular es requerido"))]
    pub celular: String,

    pub nom_contacto_emerg: Option<String>,
    pub tel_contacto_emerg: Option<String>,

    #[serde(rename = "direccionId")]
    #[schema(example = 1)]
    pub direccion_id: i32,

    #[serde(rename = "departamentoId")]
    #[schema(example = 5)]
    pub departamento_id: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUsuarioPayload {
    #[validate(length(min = 1, message = "El nombre no puede estar vacío"))]
    pub nombre: Option<String>,

    #[validate(email(message = "Formato de correo inválido"))]
    pub correo: Option<String>,

    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres"))]
    pub password: Option<String>,

    pub rol: Option<Rol>,

    pub activo: Option<bool>,

    #[validate(length(min = 1, message = "El número de cédula no puede estar vacío"))]
    pub numero_cedula: Option<String>,

    #[validate(custom(function = "validate_fecha_pasada"))]
    #[schema(value_type = Option<String>)]
    pub fecha_nacimiento: Option<NaiveDate>,

    pub fecha_salida: Option<DateTime<Utc>>,

    #[validate(length(min = 1, message = "El número de celular no puede estar vacío"))]
    pub celular: Option<String>,

    pub nom_contacto_emerg: Option<String>,
    pub tel_contacto_emerg: Option<String>,

    #[serde(rename = "direccionId")]
    pub direccion_id: Option<i32>,

    #[serde(rename = "departamentoId")]
    pub departamento_id: Option<i32>,
}
