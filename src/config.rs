// src/config.rs

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::{env, time::Duration};

use crate::{
    common::password::PasswordHasher,
    db::Repositories,
    services::{
        auth::AuthService, departamento_service::DepartamentoService,
        direccion_service::DireccionService, permiso_service::PermisoService,
        usuario_service::UsuarioService,
    },
};

// Configuración leída del entorno (y de `.env` si existe).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
    pub db_max_connections: u32,
    pub port: u16,
}

fn parse_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} tiene un valor inválido: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

// Un año como tope; fuera de 1..=MAX la configuración se rechaza al arrancar.
const MAX_JWT_EXPIRATION_HOURS: i64 = 24 * 365;

fn check_jwt_expiration(hours: i64) -> anyhow::Result<i64> {
    if !(1..=MAX_JWT_EXPIRATION_HOURS).contains(&hours) {
        anyhow::bail!(
            "JWT_EXPIRATION_HOURS debe estar entre 1 y {}: {}",
            MAX_JWT_EXPIRATION_HOURS,
            hours
        );
    }
    Ok(hours)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET debe ser definido")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret,
            jwt_expiration_hours: check_jwt_expiration(parse_or("JWT_EXPIRATION_HOURS", 24)?)?,
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            port: parse_or("PORT", 3000)?,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub direccion_service: DireccionService,
    pub departamento_service: DepartamentoService,
    pub usuario_service: UsuarioService,
    pub permiso_service: PermisoService,
    pub auth_service: AuthService,
}

impl AppState {
    /// Conecta a Postgres y corre las migraciones; sin `DATABASE_URL` usa el
    /// almacén en memoria.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let repos = match &config.database_url {
            Some(database_url) => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("Falla al conectar a la base de datos")?;
                tracing::info!("✅ Conexión con la base de datos establecida");

                sqlx::migrate!()
                    .run(&db_pool)
                    .await
                    .context("Falla al ejecutar las migraciones")?;
                tracing::info!("✅ Migraciones ejecutadas");

                Repositories::postgres(db_pool)
            }
            None => {
                tracing::warn!("DATABASE_URL no definida: se usa el almacén en memoria, los datos no persisten");
                Repositories::in_memory()
            }
        };

        Ok(Self::from_repositories(repos, config))
    }

    // Monta el grafo de servicios sobre un conjunto de repositorios.
    pub fn from_repositories(repos: Repositories, config: &Config) -> Self {
        let usuario_service = UsuarioService::new(
            repos.usuarios.clone(),
            repos.direcciones.clone(),
            repos.departamentos.clone(),
            PasswordHasher::new(config.bcrypt_cost),
        );
        let auth_service = AuthService::new(
            usuario_service.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
        );

        Self {
            direccion_service: DireccionService::new(
                repos.direcciones.clone(),
                repos.departamentos.clone(),
            ),
            departamento_service: DepartamentoService::new(
                repos.departamentos.clone(),
                repos.direcciones.clone(),
                repos.usuarios.clone(),
                repos.permisos.clone(),
            ),
            permiso_service: PermisoService::new(
                repos.permisos,
                repos.usuarios,
                repos.direcciones,
                repos.departamentos,
            ),
            usuario_service,
            auth_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_expiration_must_be_in_range() {
        assert_eq!(check_jwt_expiration(24).unwrap(), 24);
        assert!(check_jwt_expiration(0).is_err());
        assert!(check_jwt_expiration(-5).is_err());
        assert!(check_jwt_expiration(i64::MAX).is_err());
    }
}
