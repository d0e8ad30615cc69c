// src/db/direccion_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::{db_utils::map_constraint_violation, error::AppError};
use crate::models::direccion::Direccion;

#[async_trait]
pub trait DireccionRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Direccion>, AppError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Direccion>, AppError>;
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Direccion>, AppError>;
    async fn create(&self, nombre: &str, estado: bool) -> Result<Direccion, AppError>;
    async fn update(&self, direccion: &Direccion) -> Result<Direccion, AppError>;
    /// Devuelve las filas afectadas.
    async fn delete(&self, id: i32) -> Result<u64, AppError>;
}

// Implementación sobre la tabla 'direcciones'.
#[derive(Clone)]
pub struct PgDireccionRepository {
    pool: PgPool,
}

impl PgDireccionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DireccionRepository for PgDireccionRepository {
    async fn find_all(&self) -> Result<Vec<Direccion>, AppError> {
        let direcciones = sqlx::query_as::<_, Direccion>(
            "SELECT id, nombre, estado FROM direcciones ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(direcciones)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Direccion>, AppError> {
        let direccion = sqlx::query_as::<_, Direccion>(
            "SELECT id, nombre, estado FROM direcciones WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(direccion)
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Direccion>, AppError> {
        let direcciones = sqlx::query_as::<_, Direccion>(
            "SELECT id, nombre, estado FROM direcciones WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(direcciones)
    }

    async fn create(&self, nombre: &str, estado: bool) -> Result<Direccion, AppError> {
        let direccion = sqlx::query_as::<_, Direccion>(
            r#"
            INSERT INTO direcciones (nombre, estado)
            VALUES ($1, $2)
            RETURNING id, nombre, estado
            "#,
        )
        .bind(nombre)
        .bind(estado)
        .fetch_one(&self.pool)
        .await?;
        Ok(direccion)
    }

    async fn update(&self, direccion: &Direccion) -> Result<Direccion, AppError> {
        sqlx::query_as::<_, Direccion>(
            r#"
            UPDATE direcciones SET nombre = $2, estado = $3
            WHERE id = $1
            RETURNING id, nombre, estado
            "#,
        )
        .bind(direccion.id)
        .bind(&direccion.nombre)
        .bind(direccion.estado)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::direccion_not_found(direccion.id))
    }

    async fn delete(&self, id: i32) -> Result<u64, AppError> {
        // La FK RESTRICT de departamentos cubre el caso de una inserción concurrente.
        let result = sqlx::query("DELETE FROM direcciones WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_constraint_violation)?;
        Ok(result.rows_affected())
    }
}
