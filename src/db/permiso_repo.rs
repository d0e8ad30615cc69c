// src/db/permiso_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::{db_utils::map_constraint_violation, error::AppError};
use crate::models::permiso::{NuevoPermiso, Permiso};

#[async_trait]
pub trait PermisoRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Permiso>, AppError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Permiso>, AppError>;
    async fn find_by_usuario(&self, usuario_id: i32) -> Result<Vec<Permiso>, AppError>;
    async fn find_by_triple(
        &self,
        usuario_id: i32,
        direccion_id: i32,
        departamento_id: i32,
    ) -> Result<Option<Permiso>, AppError>;
    async fn count_by_departamento(&self, departamento_id: i32) -> Result<i64, AppError>;
    async fn create(&self, nuevo: NuevoPermiso) -> Result<Permiso, AppError>;
    async fn update(&self, permiso: &Permiso) -> Result<Permiso, AppError>;
    async fn delete(&self, id: i32) -> Result<u64, AppError>;
}

const COLUMNS: &str = "id, fecha_registro, nivel, usuario_id, direccion_id, departamento_id";

#[derive(Clone)]
pub struct PgPermisoRepository {
    pool: PgPool,
}

impl PgPermisoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermisoRepository for PgPermisoRepository {
    async fn find_all(&self) -> Result<Vec<Permiso>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM permisos ORDER BY id");
        Ok(sqlx::query_as::<_, Permiso>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Permiso>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM permisos WHERE id = $1");
        Ok(sqlx::query_as::<_, Permiso>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_usuario(&self, usuario_id: i32) -> Result<Vec<Permiso>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM permisos WHERE usuario_id = $1 ORDER BY id");
        Ok(sqlx::query_as::<_, Permiso>(&sql)
            .bind(usuario_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_triple(
        &self,
        usuario_id: i32,
        direccion_id: i32,
        departamento_id: i32,
    ) -> Result<Option<Permiso>, AppError> {
        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM permisos
            WHERE usuario_id = $1 AND direccion_id = $2 AND departamento_id = $3
            "#
        );
        Ok(sqlx::query_as::<_, Permiso>(&sql)
            .bind(usuario_id)
            .bind(direccion_id)
            .bind(departamento_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn count_by_departamento(&self, departamento_id: i32) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM permisos WHERE departamento_id = $1")
            .bind(departamento_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn create(&self, nuevo: NuevoPermiso) -> Result<Permiso, AppError> {
        let sql = format!(
            r#"
            INSERT INTO permisos (fecha_registro, nivel, usuario_id, direccion_id, departamento_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        );
        sqlx::query_as::<_, Permiso>(&sql)
            .bind(nuevo.fecha_registro)
            .bind(nuevo.nivel)
            .bind(nuevo.usuario_id)
            .bind(nuevo.direccion_id)
            .bind(nuevo.departamento_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_constraint_violation)
    }

    async fn update(&self, permiso: &Permiso) -> Result<Permiso, AppError> {
        let sql = format!(
            r#"
            UPDATE permisos
            SET nivel = $2, usuario_id = $3, direccion_id = $4, departamento_id = $5
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        );
        sqlx::query_as::<_, Permiso>(&sql)
            .bind(permiso.id)
            .bind(permiso.nivel)
            .bind(permiso.usuario_id)
            .bind(permiso.direccion_id)
            .bind(permiso.departamento_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_constraint_violation)?
            .ok_or_else(|| AppError::not_found("Permiso", permiso.id))
    }

    async fn delete(&self, id: i32) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM permisos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
