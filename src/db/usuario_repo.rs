// src/db/usuario_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::{db_utils::map_constraint_violation, error::AppError};
use crate::models::usuario::{NuevoUsuario, Usuario};

#[async_trait]
pub trait UsuarioRepository: Send + Sync {
    async fn find_all(&self, include_inactive: bool) -> Result<Vec<Usuario>, AppError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Usuario>, AppError>;
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Usuario>, AppError>;
    async fn find_by_departamentos(&self, departamento_ids: &[i32]) -> Result<Vec<Usuario>, AppError>;
    /// Busca entre activos e inactivos.
    async fn find_by_correo(&self, correo: &str) -> Result<Option<Usuario>, AppError>;
    async fn find_by_cedula(&self, cedula: &str) -> Result<Option<Usuario>, AppError>;
    async fn count_by_departamento(&self, departamento_id: i32) -> Result<i64, AppError>;
    async fn create(&self, nuevo: NuevoUsuario) -> Result<Usuario, AppError>;
    /// Guarda el registro completo. No existe borrado físico de usuarios.
    async fn update(&self, usuario: &Usuario) -> Result<Usuario, AppError>;
}

const COLUMNS: &str = r#"
    id, nombre, correo, password, rol, activo, numero_cedula,
    fecha_nacimiento, fecha_registro, fecha_salida, celular,
    nom_contacto_emerg, tel_contacto_emerg, direccion_id, departamento_id
"#;

// Repositorio sobre la tabla 'usuarios'.
#[derive(Clone)]
pub struct PgUsuarioRepository {
    pool: PgPool,
}

impl PgUsuarioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsuarioRepository for PgUsuarioRepository {
    async fn find_all(&self, include_inactive: bool) -> Result<Vec<Usuario>, AppError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM usuarios WHERE ($1 OR activo = TRUE) ORDER BY id"
        );
        Ok(sqlx::query_as::<_, Usuario>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Usuario>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM usuarios WHERE id = $1");
        Ok(sqlx::query_as::<_, Usuario>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Usuario>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM usuarios WHERE id = ANY($1) ORDER BY id");
        Ok(sqlx::query_as::<_, Usuario>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_departamentos(&self, departamento_ids: &[i32]) -> Result<Vec<Usuario>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM usuarios WHERE departamento_id = ANY($1) ORDER BY id");
        Ok(sqlx::query_as::<_, Usuario>(&sql)
            .bind(departamento_ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_correo(&self, correo: &str) -> Result<Option<Usuario>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM usuarios WHERE correo = $1");
        Ok(sqlx::query_as::<_, Usuario>(&sql)
            .bind(correo)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_cedula(&self, cedula: &str) -> Result<Option<Usuario>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM usuarios WHERE numero_cedula = $1");
        Ok(sqlx::query_as::<_, Usuario>(&sql)
            .bind(cedula)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn count_by_departamento(&self, departamento_id: i32) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM usuarios WHERE departamento_id = $1")
            .bind(departamento_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn create(&self, nuevo: NuevoUsuario) -> Result<Usuario, AppError> {
        let sql = format!(
            r#"
            INSERT INTO usuarios (
                nombre, correo, password, rol, activo, numero_cedula,
                fecha_nacimiento, fecha_registro, fecha_salida, celular,
                nom_contacto_emerg, tel_contacto_emerg, direccion_id, departamento_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {COLUMNS}
            "#
        );
        // Correo, cédula y el par (departamento, dirección) los garantiza el
        // motor; la violación vuelve como el mismo 409 que la validación previa.
        sqlx::query_as::<_, Usuario>(&sql)
            .bind(&nuevo.nombre)
            .bind(&nuevo.correo)
            .bind(&nuevo.password)
            .bind(nuevo.rol)
            .bind(nuevo.activo)
            .bind(&nuevo.numero_cedula)
            .bind(nuevo.fecha_nacimiento)
            .bind(nuevo.fecha_registro)
            .bind(nuevo.fecha_salida)
            .bind(&nuevo.celular)
            .bind(&nuevo.nom_contacto_emerg)
            .bind(&nuevo.tel_contacto_emerg)
            .bind(nuevo.direccion_id)
            .bind(nuevo.departamento_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_constraint_violation)
    }

    async fn update(&self, usuario: &Usuario) -> Result<Usuario, AppError> {
        let sql = format!(
            r#"
            UPDATE usuarios SET
                nombre = $2, correo = $3, password = $4, rol = $5, activo = $6,
                numero_cedula = $7, fecha_nacimiento = $8, fecha_salida = $9,
                celular = $10, nom_contacto_emerg = $11, tel_contacto_emerg = $12,
                direccion_id = $13, departamento_id = $14
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        );
        sqlx::query_as::<_, Usuario>(&sql)
            .bind(usuario.id)
            .bind(&usuario.nombre)
            .bind(&usuario.correo)
            .bind(&usuario.password)
            .bind(usuario.rol)
            .bind(usuario.activo)
            .bind(&usuario.numero_cedula)
            .bind(usuario.fecha_nacimiento)
            .bind(usuario.fecha_salida)
            .bind(&usuario.celular)
            .bind(&usuario.nom_contacto_emerg)
            .bind(&usuario.tel_contacto_emerg)
            .bind(usuario.direccion_id)
            .bind(usuario.departamento_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_constraint_violation)?
            .ok_or_else(|| AppError::not_found("Usuario", usuario.id))
    }
}
