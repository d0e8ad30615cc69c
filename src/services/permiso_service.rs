// src/services/permiso_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::{
    common::{
        db_utils::{MSG_DEPARTAMENTO_FUERA_DE_DIRECCION, MSG_PERMISO_DUPLICADO},
        error::AppError,
    },
    db::{DepartamentoRepository, DireccionRepository, PermisoRepository, UsuarioRepository},
    models::{
        departamento::Departamento,
        direccion::Direccion,
        permiso::{CreatePermisoPayload, NuevoPermiso, Permiso, PermisoDetalle, UpdatePermisoPayload},
        usuario::Usuario,
    },
};

#[derive(Clone)]
pub struct PermisoService {
    permisos: Arc<dyn PermisoRepository>,
    usuarios: Arc<dyn UsuarioRepository>,
    direcciones: Arc<dyn DireccionRepository>,
    departamentos: Arc<dyn DepartamentoRepository>,
}

impl PermisoService {
    pub fn new(
        permisos: Arc<dyn PermisoRepository>,
        usuarios: Arc<dyn UsuarioRepository>,
        direcciones: Arc<dyn DireccionRepository>,
        departamentos: Arc<dyn DepartamentoRepository>,
    ) -> Self {
        Self {
            permisos,
            usuarios,
            direcciones,
            departamentos,
        }
    }

    async fn with_relations(&self, permisos: Vec<Permiso>) -> Result<Vec<PermisoDetalle>, AppError> {
        let usuario_ids: Vec<i32> = permisos.iter().map(|p| p.usuario_id).collect();
        let direccion_ids: Vec<i32> = permisos.iter().map(|p| p.direccion_id).collect();
        let departamento_ids: Vec<i32> = permisos.iter().map(|p| p.departamento_id).collect();

        let usuarios: HashMap<i32, Usuario> = self
            .usuarios
            .find_by_ids(&usuario_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let direcciones: HashMap<i32, Direccion> = self
            .direcciones
            .find_by_ids(&direccion_ids)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();
        let departamentos: HashMap<i32, Departamento> = self
            .departamentos
            .find_by_ids(&departamento_ids)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        Ok(permisos
            .into_iter()
            .map(|permiso| PermisoDetalle {
                usuario: usuarios.get(&permiso.usuario_id).cloned(),
                direccion: direcciones.get(&permiso.direccion_id).cloned(),
                departamento: departamentos.get(&permiso.departamento_id).cloned(),
                permiso,
            })
            .collect())
    }

    pub async fn list(&self) -> Result<Vec<PermisoDetalle>, AppError> {
        let permisos = self.permisos.find_all().await?;
        self.with_relations(permisos).await
    }

    pub async fn get(&self, id: i32) -> Result<PermisoDetalle, AppError> {
        let permiso = self.find(id).await?;
        let mut detalle = self.with_relations(vec![permiso]).await?;
        detalle.pop().ok_or_else(|| AppError::not_found("Permiso", id))
    }

    async fn find(&self, id: i32) -> Result<Permiso, AppError> {
        self.permisos
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Permiso", id))
    }

    pub async fn list_by_usuario(&self, usuario_id: i32) -> Result<Vec<PermisoDetalle>, AppError> {
        let permisos = self.permisos.find_by_usuario(usuario_id).await?;
        self.with_relations(permisos).await
    }

    async fn require_usuario(&self, id: i32) -> Result<(), AppError> {
        match self.usuarios.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("Usuario", id)),
        }
    }

    async fn require_direccion(&self, id: i32) -> Result<(), AppError> {
        match self.direcciones.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::direccion_not_found(id)),
        }
    }

    async fn find_departamento(&self, id: i32) -> Result<Departamento, AppError> {
        self.departamentos
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Departamento", id))
    }

    // Unicidad por terna; el nivel no cuenta.
    async fn check_terna_libre(
        &self,
        usuario_id: i32,
        direccion_id: i32,
        departamento_id: i32,
        excluir: Option<i32>,
    ) -> Result<(), AppError> {
        match self
            .permisos
            .find_by_triple(usuario_id, direccion_id, departamento_id)
            .await?
        {
            Some(existente) if Some(existente.id) != excluir => {
                Err(AppError::conflict(MSG_PERMISO_DUPLICADO))
            }
            _ => Ok(()),
        }
    }

    pub async fn create(&self, payload: CreatePermisoPayload) -> Result<Permiso, AppError> {
        self.require_usuario(payload.usuario_id).await?;
        self.require_direccion(payload.direccion_id).await?;
        let departamento = self.find_departamento(payload.departamento_id).await?;

        if departamento.direccion_id != payload.direccion_id {
            return Err(AppError::conflict(MSG_DEPARTAMENTO_FUERA_DE_DIRECCION));
        }

        self.check_terna_libre(
            payload.usuario_id,
            payload.direccion_id,
            payload.departamento_id,
            None,
        )
        .await?;

        let permiso = self
            .permisos
            .create(NuevoPermiso {
                nivel: payload.nivel,
                usuario_id: payload.usuario_id,
                direccion_id: payload.direccion_id,
                departamento_id: payload.departamento_id,
                fecha_registro: Utc::now(),
            })
            .await?;

        tracing::info!(
            "Permiso {} otorgado al usuario {} en el departamento {}",
            permiso.id,
            permiso.usuario_id,
            permiso.departamento_id
        );
        Ok(permiso)
    }

    pub async fn update(&self, id: i32, payload: UpdatePermisoPayload) -> Result<Permiso, AppError> {
        let mut permiso = self.find(id).await?;

        if let Some(nivel) = payload.nivel {
            permiso.nivel = nivel;
        }

        if let Some(direccion_id) = payload.direccion_id {
            self.require_direccion(direccion_id).await?;
        }
        let direccion_id = payload.direccion_id.unwrap_or(permiso.direccion_id);
        let departamento_id = payload.departamento_id.unwrap_or(permiso.departamento_id);

        // Cualquier cambio de dirección o departamento vuelve a validar el par.
        if payload.direccion_id.is_some() || payload.departamento_id.is_some() {
            let departamento = self.find_departamento(departamento_id).await?;
            if departamento.direccion_id != direccion_id {
                return Err(AppError::conflict(MSG_DEPARTAMENTO_FUERA_DE_DIRECCION));
            }
        }

        if let Some(usuario_id) = payload.usuario_id {
            self.require_usuario(usuario_id).await?;
        }
        let usuario_id = payload.usuario_id.unwrap_or(permiso.usuario_id);

        let terna_cambia = usuario_id != permiso.usuario_id
            || direccion_id != permiso.direccion_id
            || departamento_id != permiso.departamento_id;
        if terna_cambia {
            self.check_terna_libre(usuario_id, direccion_id, departamento_id, Some(id))
                .await?;
        }

        permiso.usuario_id = usuario_id;
        permiso.direccion_id = direccion_id;
        permiso.departamento_id = departamento_id;

        self.permisos.update(&permiso).await
    }

    pub async fn remove(&self, id: i32) -> Result<(), AppError> {
        if self.permisos.delete(id).await? == 0 {
            return Err(AppError::not_found("Permiso", id));
        }
        tracing::info!("Permiso {} revocado", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::password::PasswordHasher;
    use crate::db::Repositories;
    use crate::models::permiso::NivelPermiso;
    use crate::services::usuario_service::{self, UsuarioService};

    async fn setup() -> (PermisoService, Repositories) {
        let repos = Repositories::in_memory();
        usuario_service::tests::base(&repos).await;

        let usuarios = UsuarioService::new(
            repos.usuarios.clone(),
            repos.direcciones.clone(),
            repos.departamentos.clone(),
            PasswordHasher::new(4),
        );
        usuarios
            .create(usuario_service::tests::payload("a@gad.ec", "1301"))
            .await
            .unwrap();
        usuarios
            .create(usuario_service::tests::payload("b@gad.ec", "1302"))
            .await
            .unwrap();

        let service = PermisoService::new(
            repos.permisos.clone(),
            repos.usuarios.clone(),
            repos.direcciones.clone(),
            repos.departamentos.clone(),
        );
        (service, repos)
    }

    fn crear(usuario_id: i32, direccion_id: i32, departamento_id: i32) -> CreatePermisoPayload {
        CreatePermisoPayload {
            usuario_id,
            direccion_id,
            departamento_id,
            nivel: NivelPermiso::default(),
        }
    }

    #[tokio::test]
    async fn create_defaults_to_lectura() {
        let (service, _) = setup().await;
        let permiso = service.create(crear(1, 1, 1)).await.unwrap();
        assert_eq!(permiso.nivel, NivelPermiso::Lectura);

        let detalle = service.get(permiso.id).await.unwrap();
        assert_eq!(detalle.usuario.map(|u| u.correo), Some("a@gad.ec".to_string()));
        assert_eq!(detalle.departamento.map(|d| d.id), Some(1));
    }

    #[tokio::test]
    async fn duplicate_triple_is_conflict_regardless_of_nivel() {
        let (service, _) = setup().await;
        service.create(crear(1, 1, 1)).await.unwrap();

        let mut otro = crear(1, 1, 1);
        otro.nivel = NivelPermiso::Escritura;
        let err = service.create(otro).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m.starts_with("Ya existe un permiso")));
    }

    #[tokio::test]
    async fn resolves_entities_in_order() {
        let (service, _) = setup().await;

        let err = service.create(crear(9, 9, 9)).await.unwrap_err();
        assert_eq!(err.to_string(), "Usuario con ID 9 no encontrado");

        let err = service.create(crear(1, 9, 9)).await.unwrap_err();
        assert_eq!(err.to_string(), "Dirección con ID 9 no encontrada");

        let err = service.create(crear(1, 1, 9)).await.unwrap_err();
        assert_eq!(err.to_string(), "Departamento con ID 9 no encontrado");

        let err = service.create(crear(1, 2, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_DEPARTAMENTO_FUERA_DE_DIRECCION));
    }

    #[tokio::test]
    async fn update_revalidates_pair_and_triple() {
        let (service, _) = setup().await;
        service.create(crear(1, 1, 1)).await.unwrap();
        let segundo = service.create(crear(1, 1, 2)).await.unwrap();

        // Departamento 3 es de la dirección 2.
        let patch = UpdatePermisoPayload {
            departamento_id: Some(3),
            ..Default::default()
        };
        assert!(matches!(
            service.update(segundo.id, patch).await,
            Err(AppError::Conflict(_))
        ));

        // Cambiar la dirección sola también revalida el par.
        let patch = UpdatePermisoPayload {
            direccion_id: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            service.update(segundo.id, patch).await,
            Err(AppError::Conflict(_))
        ));

        // Chocaría con el primer permiso.
        let patch = UpdatePermisoPayload {
            departamento_id: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            service.update(segundo.id, patch).await,
            Err(AppError::Conflict(ref m)) if m == MSG_PERMISO_DUPLICADO
        ));

        let patch = UpdatePermisoPayload {
            usuario_id: Some(2),
            direccion_id: Some(2),
            departamento_id: Some(3),
            nivel: Some(NivelPermiso::Admin),
        };
        let actualizado = service.update(segundo.id, patch).await.unwrap();
        assert_eq!(actualizado.usuario_id, 2);
        assert_eq!(actualizado.nivel, NivelPermiso::Admin);
    }

    #[tokio::test]
    async fn nivel_only_update_keeps_triple() {
        let (service, _) = setup().await;
        let permiso = service.create(crear(1, 1, 1)).await.unwrap();
        let patch = UpdatePermisoPayload {
            nivel: Some(NivelPermiso::Escritura),
            ..Default::default()
        };
        let permiso = service.update(permiso.id, patch).await.unwrap();
        assert_eq!(permiso.nivel, NivelPermiso::Escritura);
    }

    #[tokio::test]
    async fn list_by_usuario_and_remove() {
        let (service, _) = setup().await;
        service.create(crear(1, 1, 1)).await.unwrap();
        let p = service.create(crear(2, 1, 1)).await.unwrap();

        assert_eq!(service.list_by_usuario(2).await.unwrap().len(), 1);
        assert_eq!(service.list().await.unwrap().len(), 2);

        service.remove(p.id).await.unwrap();
        assert!(matches!(service.remove(p.id).await, Err(AppError::NotFound(_))));
        assert!(service.list_by_usuario(2).await.unwrap().is_empty());
    }
}
