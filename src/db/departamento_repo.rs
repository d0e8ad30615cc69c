// src/db/departamento_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::db_utils::{
    map_constraint_violation, map_departamento_write, MSG_DEPARTAMENTO_CON_DEPENDIENTES,
};
use crate::common::error::AppError;
use crate::models::departamento::{Departamento, NuevoDepartamento};

#[async_trait]
pub trait DepartamentoRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Departamento>, AppError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Departamento>, AppError>;
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Departamento>, AppError>;
    async fn find_by_direccion(&self, direccion_id: i32) -> Result<Vec<Departamento>, AppError>;
    /// Departamentos sin padre.
    async fn find_roots(&self) -> Result<Vec<Departamento>, AppError>;
    /// Hijos directos de cualquiera de `padre_ids`, en una sola consulta.
    async fn find_children_of(&self, padre_ids: &[i32]) -> Result<Vec<Departamento>, AppError>;
    async fn count_by_direccion(&self, direccion_id: i32) -> Result<i64, AppError>;
    async fn count_children(&self, id: i32) -> Result<i64, AppError>;
    async fn create(&self, nuevo: NuevoDepartamento) -> Result<Departamento, AppError>;
    async fn update(&self, departamento: &Departamento) -> Result<Departamento, AppError>;
    async fn delete(&self, id: i32) -> Result<u64, AppError>;
}

const COLUMNS: &str = "id, nombre, descripcion, estado, direccion_id, padre_id";

#[derive(Clone)]
pub struct PgDepartamentoRepository {
    pool: PgPool,
}

impl PgDepartamentoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DepartamentoRepository for PgDepartamentoRepository {
    async fn find_all(&self) -> Result<Vec<Departamento>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM departamentos ORDER BY id");
        Ok(sqlx::query_as::<_, Departamento>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Departamento>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM departamentos WHERE id = $1");
        Ok(sqlx::query_as::<_, Departamento>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Departamento>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM departamentos WHERE id = ANY($1) ORDER BY id");
        Ok(sqlx::query_as::<_, Departamento>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_direccion(&self, direccion_id: i32) -> Result<Vec<Departamento>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM departamentos WHERE direccion_id = $1 ORDER BY id");
        Ok(sqlx::query_as::<_, Departamento>(&sql)
            .bind(direccion_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_roots(&self) -> Result<Vec<Departamento>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM departamentos WHERE padre_id IS NULL ORDER BY id");
        Ok(sqlx::query_as::<_, Departamento>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_children_of(&self, padre_ids: &[i32]) -> Result<Vec<Departamento>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM departamentos WHERE padre_id = ANY($1) ORDER BY id");
        Ok(sqlx::query_as::<_, Departamento>(&sql)
            .bind(padre_ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count_by_direccion(&self, direccion_id: i32) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM departamentos WHERE direccion_id = $1")
            .bind(direccion_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn count_children(&self, id: i32) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM departamentos WHERE padre_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn create(&self, nuevo: NuevoDepartamento) -> Result<Departamento, AppError> {
        let sql = format!(
            r#"
            INSERT INTO departamentos (nombre, descripcion, estado, direccion_id, padre_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        );
        sqlx::query_as::<_, Departamento>(&sql)
            .bind(&nuevo.nombre)
            .bind(&nuevo.descripcion)
            .bind(nuevo.estado)
            .bind(nuevo.direccion_id)
            .bind(nuevo.padre_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_departamento_write(e, nuevo.direccion_id))
    }

    async fn update(&self, departamento: &Departamento) -> Result<Departamento, AppError> {
        let sql = format!(
            r#"
            UPDATE departamentos
            SET nombre = $2, descripcion = $3, estado = $4, direccion_id = $5, padre_id = $6
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        );
        sqlx::query_as::<_, Departamento>(&sql)
            .bind(departamento.id)
            .bind(&departamento.nombre)
            .bind(&departamento.descripcion)
            .bind(departamento.estado)
            .bind(departamento.direccion_id)
            .bind(departamento.padre_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_departamento_write(e, departamento.direccion_id))?
            .ok_or_else(|| AppError::not_found("Departamento", departamento.id))
    }

    async fn delete(&self, id: i32) -> Result<u64, AppError> {
        // Los permisos caen en cascada; usuarios y subdepartamentos bloquean (RESTRICT).
        let result = sqlx::query("DELETE FROM departamentos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match map_constraint_violation(e) {
                AppError::Conflict(_) => AppError::conflict(MSG_DEPARTAMENTO_CON_DEPENDIENTES),
                other => other,
            })?;
        Ok(result.rows_affected())
    }
}
