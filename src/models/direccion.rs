// src/models/direccion.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::departamento::Departamento;

// Unidad organizativa de primer nivel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Direccion {
    #[schema(example = 1)]
    pub id: i32,

    #[schema(example = "DIRECCIÓN FINANCIERA")]
    pub nombre: String,

    pub estado: bool,
}

// Dirección con sus departamentos.
#[derive(Debug, Serialize, ToSchema)]
pub struct DireccionDetalle {
    #[serde(flatten)]
    pub direccion: Direccion,

    pub departamentos: Vec<Departamento>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDireccionPayload {
    #[validate(length(min = 1, message = "El nombre es requerido"))]
    #[schema(example = "DIRECCIÓN FINANCIERA")]
    pub nombre: String,

    pub estado: Option<bool>,
}

// Actualización parcial: los campos ausentes no se tocan.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateDireccionPayload {
    #[validate(length(min = 1, message = "El nombre no puede estar vacío"))]
    pub nombre: Option<String>,

    pub estado: Option<bool>,
}
