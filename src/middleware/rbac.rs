// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{common::error::AppError, middleware::auth::AuthenticatedUser, models::usuario::Rol};

/// Conjunto de roles que habilita una ruta.
pub trait RoleDef: Send + Sync + 'static {
    fn allowed() -> &'static [Rol];
}

/// Guardián: rechaza con 403 si el rol del usuario autenticado no está
/// entre los permitidos por `T`. Requiere que `auth_guard` haya corrido antes.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let usuario = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        if !T::allowed().contains(&usuario.0.rol) {
            tracing::warn!(
                "Usuario {} con rol {:?} sin acceso a la ruta",
                usuario.0.id,
                usuario.0.rol
            );
            return Err(AppError::Forbidden);
        }

        Ok(RequireRole(PhantomData))
    }
}

pub struct AdminRole;
impl RoleDef for AdminRole {
    fn allowed() -> &'static [Rol] {
        &[Rol::Admin]
    }
}

pub type RequireAdmin = RequireRole<AdminRole>;
