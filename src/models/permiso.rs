// src/models/permiso.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{departamento::Departamento, direccion::Direccion, usuario::Usuario};

// Mapea el CREATE TYPE nivel_permiso de la migración.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "nivel_permiso", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NivelPermiso {
    #[default]
    Lectura,
    Escritura,
    Admin,
}

// Acceso de un usuario a un par dirección+departamento.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Permiso {
    pub id: i32,
    pub fecha_registro: DateTime<Utc>,
    pub nivel: NivelPermiso,

    #[serde(rename = "usuarioId")]
    pub usuario_id: i32,

    #[serde(rename = "direccionId")]
    pub direccion_id: i32,

    #[serde(rename = "departamentoId")]
    pub departamento_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermisoDetalle {
    #[serde(flatten)]
    pub permiso: Permiso,

    pub usuario: Option<Usuario>,
    pub direccion: Option<Direccion>,
    pub departamento: Option<Departamento>,
}

#[derive(Debug, Clone)]
pub struct NuevoPermiso {
    pub nivel: NivelPermiso,
    pub usuario_id: i32,
    pub direccion_id: i32,
    pub departamento_id: i32,
    pub fecha_registro: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePermisoPayload {
    #[serde(rename = "usuarioId")]
    #[schema(example = 3)]
    pub usuario_id: i32,

    #[serde(rename = "direccionId")]
    #[schema(example = 1)]
    pub direccion_id: i32,

    #[serde(rename = "departamentoId")]
    #[schema(example = 5)]
    pub departamento_id: i32,

    #[serde(default)]
    pub nivel: NivelPermiso,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePermisoPayload {
    #[serde(rename = "usuarioId")]
    pub usuario_id: Option<i32>,

    #[serde(rename = "direccionId")]
    pub direccion_id: Option<i32>,

    #[serde(rename = "departamentoId")]
    pub departamento_id: Option<i32>,

    pub nivel: Option<NivelPermiso>,
}
