// src/models/departamento.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::{extract::deserialize_some, tree::TreeItem};
use crate::models::{direccion::Direccion, usuario::Usuario};

// Sub-unidad. Pertenece siempre a una dirección y, opcionalmente, cuelga de
// otro departamento de la misma dirección.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Departamento {
    #[schema(example = 5)]
    pub id: i32,

    #[schema(example = "CONTABILIDAD")]
    pub nombre: String,

    #[schema(example = "Manejo de cuentas y finanzas")]
    pub descripcion: Option<String>,

    pub estado: bool,

    #[serde(rename = "direccionId")]
    #[schema(example = 1)]
    pub direccion_id: i32,

    #[serde(rename = "padreId")]
    pub padre_id: Option<i32>,
}

impl TreeItem for Departamento {
    fn id(&self) -> i32 {
        self.id
    }

    fn parent_id(&self) -> Option<i32> {
        self.padre_id
    }
}

// Departamento con sus relaciones directas.
#[derive(Debug, Serialize, ToSchema)]
pub struct DepartamentoDetalle {
    #[serde(flatten)]
    pub departamento: Departamento,

    pub direccion: Option<Direccion>,
    pub usuarios: Vec<Usuario>,
    pub subdepartamentos: Vec<Departamento>,
}

// Nodo de la jerarquía completa.
#[derive(Debug, Serialize, ToSchema)]
pub struct DepartamentoNodo {
    #[serde(flatten)]
    pub departamento: Departamento,

    #[schema(no_recursion)]
    pub subdepartamentos: Vec<DepartamentoNodo>,
}

// Datos de alta ya resueltos que recibe el repositorio.
#[derive(Debug, Clone)]
pub struct NuevoDepartamento {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub estado: bool,
    pub direccion_id: i32,
    pub padre_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDepartamentoPayload {
    #[validate(length(min = 1, message = "El nombre es requerido"))]
    #[schema(example = "CONTABILIDAD")]
    pub nombre: String,

    pub descripcion: Option<String>,

    pub estado: Option<bool>,

    #[serde(rename = "direccionId")]
    #[validate(range(min = 1, message = "El ID de la dirección debe ser un entero positivo"))]
    #[schema(example = 1)]
    pub direccion_id: i32,

    #[serde(rename = "padreId")]
    pub padre_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateDepartamentoPayload {
    #[validate(length(min = 1, message = "El nombre no puede estar vacío"))]
    pub nombre: Option<String>,

    pub descripcion: Option<String>,

    pub estado: Option<bool>,

    #[serde(rename = "direccionId")]
    pub direccion_id: Option<i32>,

    // `null` desengancha el departamento y lo deja como raíz.
    #[serde(rename = "padreId", default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub padre_id: Option<Option<i32>>,
}
