// src/services/departamento_service.rs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    common::{
        db_utils::{MSG_DEPARTAMENTO_CON_DEPENDIENTES, MSG_PADRE_OTRA_DIRECCION, MSG_PADRE_PROPIO},
        error::AppError,
        tree::{assemble_forest, expand_levels},
    },
    db::{DepartamentoRepository, DireccionRepository, PermisoRepository, UsuarioRepository},
    models::{
        departamento::{
            CreateDepartamentoPayload, Departamento, DepartamentoDetalle, DepartamentoNodo,
            NuevoDepartamento, UpdateDepartamentoPayload,
        },
        usuario::Usuario,
    },
};

const MSG_CICLO: &str = "Un departamento no puede tener como padre a uno de sus subdepartamentos";

#[derive(Clone)]
pub struct DepartamentoService {
    departamentos: Arc<dyn DepartamentoRepository>,
    direcciones: Arc<dyn DireccionRepository>,
    usuarios: Arc<dyn UsuarioRepository>,
    permisos: Arc<dyn PermisoRepository>,
}

impl DepartamentoService {
    pub fn new(
        departamentos: Arc<dyn DepartamentoRepository>,
        direcciones: Arc<dyn DireccionRepository>,
        usuarios: Arc<dyn UsuarioRepository>,
        permisos: Arc<dyn PermisoRepository>,
    ) -> Self {
        Self {
            departamentos,
            direcciones,
            usuarios,
            permisos,
        }
    }

    // Carga las relaciones de todo el lote con una consulta por tipo.
    async fn with_relations(
        &self,
        departamentos: Vec<Departamento>,
    ) -> Result<Vec<DepartamentoDetalle>, AppError> {
        let ids: Vec<i32> = departamentos.iter().map(|d| d.id).collect();
        let direccion_ids: Vec<i32> = departamentos
            .iter()
            .map(|d| d.direccion_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let direcciones: HashMap<i32, _> = self
            .direcciones
            .find_by_ids(&direccion_ids)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        let mut usuarios: HashMap<i32, Vec<Usuario>> = HashMap::new();
        for usuario in self.usuarios.find_by_departamentos(&ids).await? {
            usuarios.entry(usuario.departamento_id).or_default().push(usuario);
        }

        let mut hijos: HashMap<i32, Vec<Departamento>> = HashMap::new();
        for hijo in self.departamentos.find_children_of(&ids).await? {
            if let Some(padre_id) = hijo.padre_id {
                hijos.entry(padre_id).or_default().push(hijo);
            }
        }

        Ok(departamentos
            .into_iter()
            .map(|departamento| DepartamentoDetalle {
                direccion: direcciones.get(&departamento.direccion_id).cloned(),
                usuarios: usuarios.remove(&departamento.id).unwrap_or_default(),
                subdepartamentos: hijos.remove(&departamento.id).unwrap_or_default(),
                departamento,
            })
            .collect())
    }

    pub async fn list(&self) -> Result<Vec<DepartamentoDetalle>, AppError> {
        let departamentos = self.departamentos.find_all().await?;
        self.with_relations(departamentos).await
    }

    pub async fn get(&self, id: i32) -> Result<DepartamentoDetalle, AppError> {
        let departamento = self.find(id).await?;
        let mut detalle = self.with_relations(vec![departamento]).await?;
        detalle.pop().ok_or_else(|| AppError::not_found("Departamento", id))
    }

    pub async fn find(&self, id: i32) -> Result<Departamento, AppError> {
        self.departamentos
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Departamento", id))
    }

    /// Departamentos de una dirección. Una lista vacía es NotFound; no se
    /// comprueba si la dirección existe.
    pub async fn get_by_direccion(&self, direccion_id: i32) -> Result<Vec<DepartamentoDetalle>, AppError> {
        let departamentos = self.departamentos.find_by_direccion(direccion_id).await?;
        if departamentos.is_empty() {
            return Err(AppError::NotFound(format!(
                "No se encontraron departamentos para la dirección con ID {}",
                direccion_id
            )));
        }
        self.with_relations(departamentos).await
    }

    async fn find_padre(&self, padre_id: i32) -> Result<Departamento, AppError> {
        self.departamentos
            .find_by_id(padre_id)
            .await?
            .ok_or_else(|| AppError::not_found("Departamento padre", padre_id))
    }

    async fn require_direccion(&self, direccion_id: i32) -> Result<(), AppError> {
        match self.direcciones.find_by_id(direccion_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::direccion_not_found(direccion_id)),
        }
    }

    pub async fn create(&self, payload: CreateDepartamentoPayload) -> Result<Departamento, AppError> {
        self.require_direccion(payload.direccion_id).await?;

        if let Some(padre_id) = payload.padre_id {
            let padre = self.find_padre(padre_id).await?;
            if padre.direccion_id != payload.direccion_id {
                return Err(AppError::conflict(MSG_PADRE_OTRA_DIRECCION));
            }
        }

        let departamento = self
            .departamentos
            .create(NuevoDepartamento {
                nombre: payload.nombre,
                descripcion: payload.descripcion,
                estado: payload.estado.unwrap_or(true),
                direccion_id: payload.direccion_id,
                padre_id: payload.padre_id,
            })
            .await?;

        tracing::info!(
            "Departamento {} creado en la dirección {}",
            departamento.id,
            departamento.direccion_id
        );
        Ok(departamento)
    }

    // Sube por la cadena de padres de `candidato`; si aparece `id`, el
    // cambio cerraría un ciclo.
    async fn check_no_cycle(&self, id: i32, candidato: i32) -> Result<(), AppError> {
        let mut visitados = HashSet::new();
        let mut actual = Some(candidato);

        while let Some(ancestro) = actual {
            if ancestro == id {
                return Err(AppError::InvalidHierarchy(MSG_CICLO.to_string()));
            }
            if !visitados.insert(ancestro) {
                break;
            }
            actual = self
                .departamentos
                .find_by_id(ancestro)
                .await?
                .and_then(|d| d.padre_id);
        }
        Ok(())
    }

    pub async fn update(&self, id: i32, payload: UpdateDepartamentoPayload) -> Result<Departamento, AppError> {
        let mut departamento = self.find(id).await?;

        let direccion_id = payload.direccion_id.unwrap_or(departamento.direccion_id);
        if direccion_id != departamento.direccion_id {
            self.require_direccion(direccion_id).await?;

            let usuarios = self.usuarios.count_by_departamento(id).await?;
            let permisos = self.permisos.count_by_departamento(id).await?;
            let hijos = self.departamentos.count_children(id).await?;
            if usuarios > 0 || permisos > 0 || hijos > 0 {
                return Err(AppError::conflict(
                    "No se puede cambiar la dirección de un departamento que tiene usuarios, permisos o subdepartamentos",
                ));
            }
        }

        let padre_id = match payload.padre_id {
            None => departamento.padre_id,
            Some(None) => None,
            Some(Some(padre_id)) => {
                if padre_id == id {
                    return Err(AppError::InvalidHierarchy(MSG_PADRE_PROPIO.to_string()));
                }
                self.find_padre(padre_id).await?;
                self.check_no_cycle(id, padre_id).await?;
                Some(padre_id)
            }
        };

        if let Some(padre_id) = padre_id {
            let padre = self.find_padre(padre_id).await?;
            if padre.direccion_id != direccion_id {
                return Err(AppError::conflict(MSG_PADRE_OTRA_DIRECCION));
            }
        }

        if let Some(nombre) = payload.nombre {
            departamento.nombre = nombre;
        }
        if let Some(descripcion) = payload.descripcion {
            departamento.descripcion = Some(descripcion);
        }
        if let Some(estado) = payload.estado {
            departamento.estado = estado;
        }
        departamento.direccion_id = direccion_id;
        departamento.padre_id = padre_id;

        self.departamentos.update(&departamento).await
    }

    pub async fn remove(&self, id: i32) -> Result<(), AppError> {
        self.find(id).await?;

        if self.usuarios.count_by_departamento(id).await? > 0
            || self.departamentos.count_children(id).await? > 0
        {
            return Err(AppError::conflict(MSG_DEPARTAMENTO_CON_DEPENDIENTES));
        }

        if self.departamentos.delete(id).await? == 0 {
            return Err(AppError::not_found("Departamento", id));
        }
        tracing::info!("Departamento {} eliminado", id);
        Ok(())
    }

    /// Bosque de departamentos raíz con sus subdepartamentos a cualquier
    /// profundidad. Una consulta por nivel.
    pub async fn jerarquia(&self) -> Result<Vec<DepartamentoNodo>, AppError> {
        let raices = self.departamentos.find_roots().await?;

        let repo = self.departamentos.clone();
        let niveles = expand_levels(raices, move |padre_ids| {
            let repo = repo.clone();
            async move { repo.find_children_of(&padre_ids).await }
        })
        .await?;

        Ok(assemble_forest(niveles, |departamento, subdepartamentos| {
            DepartamentoNodo {
                departamento,
                subdepartamentos,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Repositories;
    use crate::models::permiso::{NivelPermiso, NuevoPermiso};
    use crate::models::usuario::{NuevoUsuario, Rol};
    use chrono::{NaiveDate, Utc};

    async fn setup() -> (DepartamentoService, Repositories) {
        let repos = Repositories::in_memory();
        repos.direcciones.create("DIRECCIÓN FINANCIERA", true).await.unwrap();
        repos.direcciones.create("OBRAS PÚBLICAS", true).await.unwrap();
        let service = DepartamentoService::new(
            repos.departamentos.clone(),
            repos.direcciones.clone(),
            repos.usuarios.clone(),
            repos.permisos.clone(),
        );
        (service, repos)
    }

    fn crear(nombre: &str, direccion_id: i32, padre_id: Option<i32>) -> CreateDepartamentoPayload {
        CreateDepartamentoPayload {
            nombre: nombre.to_string(),
            descripcion: None,
            estado: None,
            direccion_id,
            padre_id,
        }
    }

    fn con_padre(padre_id: Option<i32>) -> UpdateDepartamentoPayload {
        UpdateDepartamentoPayload {
            padre_id: Some(padre_id),
            ..Default::default()
        }
    }

    async fn crear_usuario(repos: &Repositories, direccion_id: i32, departamento_id: i32) {
        repos
            .usuarios
            .create(NuevoUsuario {
                nombre: "Ana".into(),
                correo: "ana@gad.ec".into(),
                password: "digest".into(),
                rol: Rol::Usuario,
                activo: true,
                numero_cedula: "1300000001".into(),
                fecha_nacimiento: NaiveDate::from_ymd_opt(1990, 3, 1).unwrap(),
                fecha_registro: Utc::now(),
                fecha_salida: None,
                celular: "0990000001".into(),
                nom_contacto_emerg: None,
                tel_contacto_emerg: None,
                direccion_id,
                departamento_id,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_validates_direccion_and_padre() {
        let (service, _) = setup().await;

        let err = service.create(crear("X", 9, None)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let contabilidad = service.create(crear("CONTABILIDAD", 1, None)).await.unwrap();
        assert!(contabilidad.estado);

        let err = service.create(crear("X", 1, Some(42))).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service
            .create(crear("BODEGA", 2, Some(contabilidad.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let hijo = service
            .create(crear("TESORERÍA", 1, Some(contabilidad.id)))
            .await
            .unwrap();
        assert_eq!(hijo.padre_id, Some(contabilidad.id));
    }

    #[tokio::test]
    async fn rejects_self_parent_and_descendant_parent() {
        let (service, _) = setup().await;
        let a = service.create(crear("A", 1, None)).await.unwrap();
        let b = service.create(crear("B", 1, Some(a.id))).await.unwrap();
        let c = service.create(crear("C", 1, Some(b.id))).await.unwrap();

        let err = service.update(a.id, con_padre(Some(a.id))).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidHierarchy(ref m) if m == MSG_PADRE_PROPIO));

        let err = service.update(a.id, con_padre(Some(c.id))).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidHierarchy(ref m) if m == MSG_CICLO));

        // Mover C a la raíz y luego colgar A de C sí es válido.
        let c = service.update(c.id, con_padre(None)).await.unwrap();
        assert_eq!(c.padre_id, None);
        let a = service.update(a.id, con_padre(Some(c.id))).await.unwrap();
        assert_eq!(a.padre_id, Some(c.id));
    }

    #[tokio::test]
    async fn absent_padre_keeps_current_parent() {
        let (service, _) = setup().await;
        let a = service.create(crear("A", 1, None)).await.unwrap();
        let b = service.create(crear("B", 1, Some(a.id))).await.unwrap();

        let patch = UpdateDepartamentoPayload {
            nombre: Some("B2".into()),
            ..Default::default()
        };
        let b = service.update(b.id, patch).await.unwrap();
        assert_eq!(b.nombre, "B2");
        assert_eq!(b.padre_id, Some(a.id));
    }

    #[tokio::test]
    async fn direction_change_requires_no_dependents() {
        let (service, repos) = setup().await;
        let a = service.create(crear("A", 1, None)).await.unwrap();
        let b = service.create(crear("B", 1, None)).await.unwrap();
        crear_usuario(&repos, 1, a.id).await;

        let mover = |direccion_id| UpdateDepartamentoPayload {
            direccion_id: Some(direccion_id),
            ..Default::default()
        };

        let err = service.update(a.id, mover(2)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = service.update(b.id, mover(7)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let b = service.update(b.id, mover(2)).await.unwrap();
        assert_eq!(b.direccion_id, 2);
    }

    #[tokio::test]
    async fn remove_is_blocked_by_users_and_children() {
        let (service, repos) = setup().await;
        let a = service.create(crear("A", 1, None)).await.unwrap();
        let b = service.create(crear("B", 1, Some(a.id))).await.unwrap();
        let c = service.create(crear("C", 2, None)).await.unwrap();
        crear_usuario(&repos, 2, c.id).await;

        let err = service.remove(a.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_DEPARTAMENTO_CON_DEPENDIENTES));

        let err = service.remove(c.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_DEPARTAMENTO_CON_DEPENDIENTES));

        repos
            .permisos
            .create(NuevoPermiso {
                nivel: NivelPermiso::Lectura,
                usuario_id: 1,
                direccion_id: 1,
                departamento_id: b.id,
                fecha_registro: Utc::now(),
            })
            .await
            .unwrap();

        service.remove(b.id).await.unwrap();
        assert!(repos.permisos.find_all().await.unwrap().is_empty());
        service.remove(a.id).await.unwrap();
    }

    #[tokio::test]
    async fn get_by_direccion_empty_is_not_found() {
        let (service, _) = setup().await;
        service.create(crear("A", 1, None)).await.unwrap();

        assert_eq!(service.get_by_direccion(1).await.unwrap().len(), 1);
        assert!(matches!(
            service.get_by_direccion(2).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn detail_carries_relations() {
        let (service, repos) = setup().await;
        let a = service.create(crear("A", 1, None)).await.unwrap();
        service.create(crear("B", 1, Some(a.id))).await.unwrap();
        crear_usuario(&repos, 1, a.id).await;

        let detalle = service.get(a.id).await.unwrap();
        assert_eq!(detalle.direccion.map(|d| d.id), Some(1));
        assert_eq!(detalle.usuarios.len(), 1);
        assert_eq!(detalle.subdepartamentos.len(), 1);
    }

    #[tokio::test]
    async fn jerarquia_loads_full_depth() {
        let (service, _) = setup().await;
        let a = service.create(crear("A", 1, None)).await.unwrap();
        let b = service.create(crear("B", 1, Some(a.id))).await.unwrap();
        let c = service.create(crear("C", 1, Some(b.id))).await.unwrap();
        service.create(crear("D", 1, Some(c.id))).await.unwrap();
        service.create(crear("E", 2, None)).await.unwrap();

        let bosque = service.jerarquia().await.unwrap();
        assert_eq!(bosque.len(), 2);

        let mut profundidad = 0;
        let mut nodo = &bosque[0];
        while let Some(hijo) = nodo.subdepartamentos.first() {
            profundidad += 1;
            nodo = hijo;
        }
        assert_eq!(profundidad, 3);
        assert_eq!(nodo.departamento.nombre, "D");
    }
}
