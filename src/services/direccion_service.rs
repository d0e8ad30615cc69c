// src/services/direccion_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    common::{db_utils::MSG_DIRECCION_CON_DEPARTAMENTOS, error::AppError},
    db::{DepartamentoRepository, DireccionRepository},
    models::{
        departamento::Departamento,
        direccion::{CreateDireccionPayload, Direccion, DireccionDetalle, UpdateDireccionPayload},
    },
};

#[derive(Clone)]
pub struct DireccionService {
    direcciones: Arc<dyn DireccionRepository>,
    departamentos: Arc<dyn DepartamentoRepository>,
}

impl DireccionService {
    pub fn new(
        direcciones: Arc<dyn DireccionRepository>,
        departamentos: Arc<dyn DepartamentoRepository>,
    ) -> Self {
        Self { direcciones, departamentos }
    }

    pub async fn list(&self) -> Result<Vec<DireccionDetalle>, AppError> {
        let direcciones = self.direcciones.find_all().await?;

        let mut por_direccion: HashMap<i32, Vec<Departamento>> = HashMap::new();
        for departamento in self.departamentos.find_all().await? {
            por_direccion
                .entry(departamento.direccion_id)
                .or_default()
                .push(departamento);
        }

        Ok(direcciones
            .into_iter()
            .map(|direccion| DireccionDetalle {
                departamentos: por_direccion.remove(&direccion.id).unwrap_or_default(),
                direccion,
            })
            .collect())
    }

    pub async fn get(&self, id: i32) -> Result<DireccionDetalle, AppError> {
        let direccion = self.find(id).await?;
        let departamentos = self.departamentos.find_by_direccion(id).await?;
        Ok(DireccionDetalle { direccion, departamentos })
    }

    /// La dirección sin relaciones; NotFound si no existe.
    pub async fn find(&self, id: i32) -> Result<Direccion, AppError> {
        self.direcciones
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::direccion_not_found(id))
    }

    pub async fn create(&self, payload: CreateDireccionPayload) -> Result<Direccion, AppError> {
        let direccion = self
            .direcciones
            .create(&payload.nombre, payload.estado.unwrap_or(true))
            .await?;
        tracing::info!("Dirección {} creada: {}", direccion.id, direccion.nombre);
        Ok(direccion)
    }

    pub async fn update(&self, id: i32, payload: UpdateDireccionPayload) -> Result<Direccion, AppError> {
        let mut direccion = self.find(id).await?;

        if let Some(nombre) = payload.nombre {
            direccion.nombre = nombre;
        }
        if let Some(estado) = payload.estado {
            direccion.estado = estado;
        }

        self.direcciones.update(&direccion).await
    }

    pub async fn remove(&self, id: i32) -> Result<(), AppError> {
        self.find(id).await?;

        if self.departamentos.count_by_direccion(id).await? > 0 {
            return Err(AppError::conflict(MSG_DIRECCION_CON_DEPARTAMENTOS));
        }

        if self.direcciones.delete(id).await? == 0 {
            return Err(AppError::direccion_not_found(id));
        }
        tracing::info!("Dirección {} eliminada", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Repositories;
    use crate::models::departamento::NuevoDepartamento;

    fn service() -> (DireccionService, Repositories) {
        let repos = Repositories::in_memory();
        let service = DireccionService::new(repos.direcciones.clone(), repos.departamentos.clone());
        (service, repos)
    }

    fn crear(nombre: &str) -> CreateDireccionPayload {
        CreateDireccionPayload {
            nombre: nombre.to_string(),
            estado: None,
        }
    }

    #[tokio::test]
    async fn create_defaults_estado_to_true() {
        let (service, _) = service();
        let direccion = service.create(crear("DIRECCIÓN FINANCIERA")).await.unwrap();
        assert_eq!(direccion.id, 1);
        assert!(direccion.estado);
    }

    #[tokio::test]
    async fn get_includes_departamentos() {
        let (service, repos) = service();
        service.create(crear("DIRECCIÓN FINANCIERA")).await.unwrap();
        repos
            .departamentos
            .create(NuevoDepartamento {
                nombre: "CONTABILIDAD".into(),
                descripcion: None,
                estado: true,
                direccion_id: 1,
                padre_id: None,
            })
            .await
            .unwrap();

        let detalle = service.get(1).await.unwrap();
        assert_eq!(detalle.departamentos.len(), 1);

        let todas = service.list().await.unwrap();
        assert_eq!(todas[0].departamentos[0].nombre, "CONTABILIDAD");
    }

    #[tokio::test]
    async fn update_only_touches_present_fields() {
        let (service, _) = service();
        service.create(crear("OBRAS")).await.unwrap();

        let patch = UpdateDireccionPayload {
            estado: Some(false),
            ..Default::default()
        };
        let updated = service.update(1, patch).await.unwrap();
        assert_eq!(updated.nombre, "OBRAS");
        assert!(!updated.estado);
    }

    #[tokio::test]
    async fn remove_is_blocked_by_departamentos() {
        let (service, repos) = service();
        service.create(crear("DIRECCIÓN FINANCIERA")).await.unwrap();
        service.create(crear("OBRAS")).await.unwrap();
        repos
            .departamentos
            .create(NuevoDepartamento {
                nombre: "CONTABILIDAD".into(),
                descripcion: None,
                estado: true,
                direccion_id: 1,
                padre_id: None,
            })
            .await
            .unwrap();

        assert!(matches!(
            service.remove(1).await,
            Err(AppError::Conflict(ref m)) if m == MSG_DIRECCION_CON_DEPARTAMENTOS
        ));
        service.remove(2).await.unwrap();
        assert!(matches!(service.get(2).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn missing_direccion_is_not_found() {
        let (service, _) = service();
        let err = service.remove(9).await.unwrap_err();
        assert_eq!(err.to_string(), "Dirección con ID 9 no encontrada");
    }
}
