// src/services/usuario_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::{
    common::{
        db_utils::{MSG_CEDULA_DUPLICADA, MSG_CORREO_DUPLICADO, MSG_DEPARTAMENTO_FUERA_DE_DIRECCION},
        error::AppError,
        password::PasswordHasher,
    },
    db::{DepartamentoRepository, DireccionRepository, UsuarioRepository},
    models::{
        departamento::Departamento,
        direccion::Direccion,
        usuario::{CreateUsuarioPayload, NuevoUsuario, Rol, UpdateUsuarioPayload, Usuario, UsuarioDetalle},
    },
};

#[derive(Clone)]
pub struct UsuarioService {
    usuarios: Arc<dyn UsuarioRepository>,
    direcciones: Arc<dyn DireccionRepository>,
    departamentos: Arc<dyn DepartamentoRepository>,
    hasher: PasswordHasher,
}

impl UsuarioService {
    pub fn new(
        usuarios: Arc<dyn UsuarioRepository>,
        direcciones: Arc<dyn DireccionRepository>,
        departamentos: Arc<dyn DepartamentoRepository>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            usuarios,
            direcciones,
            departamentos,
            hasher,
        }
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    async fn with_relations(&self, usuarios: Vec<Usuario>) -> Result<Vec<UsuarioDetalle>, AppError> {
        let direccion_ids: Vec<i32> = usuarios.iter().map(|u| u.direccion_id).collect();
        let departamento_ids: Vec<i32> = usuarios.iter().map(|u| u.departamento_id).collect();

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

        Ok(usuarios
            .into_iter()
            .map(|usuario| UsuarioDetalle {
                direccion: direcciones.get(&usuario.direccion_id).cloned(),
                departamento: departamentos.get(&usuario.departamento_id).cloned(),
                usuario,
            })
            .collect())
    }

    /// Por defecto solo los activos.
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<UsuarioDetalle>, AppError> {
        let usuarios = self.usuarios.find_all(include_inactive).await?;
        self.with_relations(usuarios).await
    }

    /// Devuelve también usuarios inactivos.
    pub async fn get(&self, id: i32) -> Result<UsuarioDetalle, AppError> {
        let usuario = self.find(id).await?;
        let mut detalle = self.with_relations(vec![usuario]).await?;
        detalle.pop().ok_or_else(|| AppError::not_found("Usuario", id))
    }

    pub async fn find(&self, id: i32) -> Result<Usuario, AppError> {
        self.usuarios
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Usuario", id))
    }

    pub async fn get_by_correo(&self, correo: &str) -> Result<Option<Usuario>, AppError> {
        self.usuarios.find_by_correo(correo).await
    }

    pub async fn get_by_cedula(&self, cedula: &str) -> Result<Option<Usuario>, AppError> {
        self.usuarios.find_by_cedula(cedula).await
    }

    async fn check_correo_libre(&self, correo: &str, excluir: Option<i32>) -> Result<(), AppError> {
        match self.usuarios.find_by_correo(correo).await? {
            Some(otro) if Some(otro.id) != excluir => Err(AppError::conflict(MSG_CORREO_DUPLICADO)),
            _ => Ok(()),
        }
    }

    async fn check_cedula_libre(&self, cedula: &str, excluir: Option<i32>) -> Result<(), AppError> {
        match self.usuarios.find_by_cedula(cedula).await? {
            Some(otro) if Some(otro.id) != excluir => Err(AppError::conflict(MSG_CEDULA_DUPLICADA)),
            _ => Ok(()),
        }
    }

    // Resuelve dirección y departamento (en ese orden) y exige que el
    // departamento pertenezca a la dirección.
    async fn check_pertenencia(&self, direccion_id: i32, departamento_id: i32) -> Result<(), AppError> {
        self.direcciones
            .find_by_id(direccion_id)
            .await?
            .ok_or_else(|| AppError::direccion_not_found(direccion_id))?;
        let departamento = self
            .departamentos
            .find_by_id(departamento_id)
            .await?
            .ok_or_else(|| AppError::not_found("Departamento", departamento_id))?;

        if departamento.direccion_id != direccion_id {
            return Err(AppError::conflict(MSG_DEPARTAMENTO_FUERA_DE_DIRECCION));
        }
        Ok(())
    }

    pub async fn create(&self, payload: CreateUsuarioPayload) -> Result<Usuario, AppError> {
        self.check_correo_libre(&payload.correo, None).await?;
        self.check_cedula_libre(&payload.numero_cedula, None).await?;
        self.check_pertenencia(payload.direccion_id, payload.departamento_id)
            .await?;

        let password = self.hasher.hash(&payload.password).await?;
        let activo = payload.activo.unwrap_or(true);
        let fecha_registro = Utc::now();
        // Un alta ya inactiva nace con su fecha de salida.
        let fecha_salida = match payload.fecha_salida {
            None if !activo => Some(fecha_registro),
            fecha => fecha,
        };

        let usuario = self
            .usuarios
            .create(NuevoUsuario {
                nombre: payload.nombre,
                correo: payload.correo,
                password,
                rol: payload.rol.unwrap_or(Rol::Usuario),
                activo,
                numero_cedula: payload.numero_cedula,
                fecha_nacimiento: payload.fecha_nacimiento,
                fecha_registro,
                fecha_salida,
                celular: payload.celular,
                nom_contacto_emerg: payload.nom_contacto_emerg,
                tel_contacto_emerg: payload.tel_contacto_emerg,
                direccion_id: payload.direccion_id,
                departamento_id: payload.departamento_id,
            })
            .await?;

        tracing::info!("Usuario {} creado ({})", usuario.id, usuario.correo);
        Ok(usuario)
    }

    pub async fn update(&self, id: i32, payload: UpdateUsuarioPayload) -> Result<Usuario, AppError> {
        let mut usuario = self.find(id).await?;

        if let Some(correo) = &payload.correo {
            if *correo != usuario.correo {
                self.check_correo_libre(correo, Some(id)).await?;
            }
        }
        if let Some(cedula) = &payload.numero_cedula {
            if *cedula != usuario.numero_cedula {
                self.check_cedula_libre(cedula, Some(id)).await?;
            }
        }

        // Con solo uno de los dos ids, el otro se toma del registro actual.
        if payload.direccion_id.is_some() || payload.departamento_id.is_some() {
            let direccion_id = payload.direccion_id.unwrap_or(usuario.direccion_id);
            let departamento_id = payload.departamento_id.unwrap_or(usuario.departamento_id);
            self.check_pertenencia(direccion_id, departamento_id).await?;
            usuario.direccion_id = direccion_id;
            usuario.departamento_id = departamento_id;
        }

        if let Some(password) = &payload.password {
            usuario.password = self.hasher.hash(password).await?;
        }

        if let Some(nombre) = payload.nombre {
            usuario.nombre = nombre;
        }
        if let Some(correo) = payload.correo {
            usuario.correo = correo;
        }
        if let Some(rol) = payload.rol {
            usuario.rol = rol;
        }
        if let Some(cedula) = payload.numero_cedula {
            usuario.numero_cedula = cedula;
        }
        if let Some(fecha) = payload.fecha_nacimiento {
            usuario.fecha_nacimiento = fecha;
        }
        if let Some(celular) = payload.celular {
            usuario.celular = celular;
        }
        if let Some(nombre) = payload.nom_contacto_emerg {
            usuario.nom_contacto_emerg = Some(nombre);
        }
        if let Some(telefono) = payload.tel_contacto_emerg {
            usuario.tel_contacto_emerg = Some(telefono);
        }

        match payload.activo {
            Some(false) if usuario.activo => {
                usuario.activo = false;
                usuario.fecha_salida = Some(payload.fecha_salida.unwrap_or_else(Utc::now));
            }
            Some(true) if !usuario.activo => {
                usuario.activo = true;
                usuario.fecha_salida = payload.fecha_salida;
            }
            _ => {
                if let Some(fecha) = payload.fecha_salida {
                    usuario.fecha_salida = Some(fecha);
                }
            }
        }

        self.usuarios.update(&usuario).await
    }

    /// Baja lógica: la fila se conserva con `activo = false` y la fecha de salida.
    pub async fn deactivate(&self, id: i32) -> Result<Usuario, AppError> {
        let mut usuario = self.find(id).await?;
        if !usuario.activo && usuario.fecha_salida.is_some() {
            return Ok(usuario);
        }

        usuario.activo = false;
        usuario.fecha_salida = Some(Utc::now());
        let usuario = self.usuarios.update(&usuario).await?;

        tracing::info!("Usuario {} desactivado", id);
        Ok(usuario)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::Repositories;
    use crate::models::departamento::NuevoDepartamento;
    use chrono::NaiveDate;

    pub(crate) async fn base(repos: &Repositories) {
        repos.direcciones.create("DIRECCIÓN FINANCIERA", true).await.unwrap();
        repos.direcciones.create("OBRAS PÚBLICAS", true).await.unwrap();
        for (nombre, direccion_id) in [("CONTABILIDAD", 1), ("TESORERÍA", 1), ("BODEGA", 2)] {
            repos
                .departamentos
                .create(NuevoDepartamento {
                    nombre: nombre.into(),
                    descripcion: None,
                    estado: true,
                    direccion_id,
                    padre_id: None,
                })
                .await
                .unwrap();
        }
    }

    pub(crate) fn payload(correo: &str, cedula: &str) -> CreateUsuarioPayload {
        CreateUsuarioPayload {
            nombre: "María Zambrano".into(),
            correo: correo.into(),
            password: "secreto123".into(),
            rol: None,
            activo: None,
            numero_cedula: cedula.into(),
            fecha_nacimiento: NaiveDate::from_ymd_opt(1985, 5, 10).unwrap(),
            fecha_salida: None,
            celular: "0997654321".into(),
            nom_contacto_emerg: None,
            tel_contacto_emerg: None,
            direccion_id: 1,
            departamento_id: 1,
        }
    }

    async fn setup() -> (UsuarioService, Repositories) {
        let repos = Repositories::in_memory();
        base(&repos).await;
        let service = UsuarioService::new(
            repos.usuarios.clone(),
            repos.direcciones.clone(),
            repos.departamentos.clone(),
            PasswordHasher::new(4),
        );
        (service, repos)
    }

    #[tokio::test]
    async fn create_applies_defaults_and_hashes_password() {
        let (service, _) = setup().await;
        let usuario = service.create(payload("maria@gad.ec", "1301")).await.unwrap();

        assert_eq!(usuario.rol, Rol::Usuario);
        assert!(usuario.activo);
        assert_ne!(usuario.password, "secreto123");
        assert!(service.hasher().verify("secreto123", &usuario.password).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_correo_or_cedula_is_conflict() {
        let (service, _) = setup().await;
        service.create(payload("maria@gad.ec", "1301")).await.unwrap();

        let err = service.create(payload("maria@gad.ec", "1302")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m.contains("correo")));

        let err = service.create(payload("otra@gad.ec", "1301")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m.contains("cédula")));
    }

    #[tokio::test]
    async fn inactive_users_still_hold_their_keys() {
        let (service, _) = setup().await;
        let usuario = service.create(payload("maria@gad.ec", "1301")).await.unwrap();
        service.deactivate(usuario.id).await.unwrap();

        let err = service.create(payload("maria@gad.ec", "9999")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_direccion_fails_before_pairing_check() {
        let (service, _) = setup().await;
        let mut p = payload("maria@gad.ec", "1301");
        p.direccion_id = 7;

        let err = service.create(p).await.unwrap_err();
        assert_eq!(err.to_string(), "Dirección con ID 7 no encontrada");
    }

    #[tokio::test]
    async fn mismatched_pair_is_conflict() {
        let (service, _) = setup().await;
        let mut p = payload("maria@gad.ec", "1301");
        p.direccion_id = 2;

        let err = service.create(p).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_DEPARTAMENTO_FUERA_DE_DIRECCION));
    }

    // La validación previa y la restricción de almacenamiento responden igual.
    #[tokio::test]
    async fn service_and_storage_report_the_same_conflict() {
        let (service, repos) = setup().await;
        service.create(payload("maria@gad.ec", "1301")).await.unwrap();

        let desde_servicio = service
            .create(payload("maria@gad.ec", "1302"))
            .await
            .unwrap_err()
            .to_string();

        let duplicado = service.get_by_correo("maria@gad.ec").await.unwrap().unwrap();
        let desde_almacen = repos
            .usuarios
            .create(NuevoUsuario {
                nombre: duplicado.nombre,
                correo: duplicado.correo,
                password: duplicado.password,
                rol: duplicado.rol,
                activo: true,
                numero_cedula: "1302".into(),
                fecha_nacimiento: duplicado.fecha_nacimiento,
                fecha_registro: Utc::now(),
                fecha_salida: None,
                celular: duplicado.celular,
                nom_contacto_emerg: None,
                tel_contacto_emerg: None,
                direccion_id: 1,
                departamento_id: 1,
            })
            .await
            .unwrap_err()
            .to_string();

        assert_eq!(desde_servicio, MSG_CORREO_DUPLICADO);
        assert_eq!(desde_servicio, desde_almacen);
    }

    #[tokio::test]
    async fn update_validates_relations_against_current_values() {
        let (service, _) = setup().await;
        let usuario = service.create(payload("maria@gad.ec", "1301")).await.unwrap();

        // Solo la dirección: el departamento actual (1) no es de la dirección 2.
        let patch = UpdateUsuarioPayload {
            direccion_id: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            service.update(usuario.id, patch).await,
            Err(AppError::Conflict(_))
        ));

        // Solo el departamento, dentro de la dirección actual.
        let patch = UpdateUsuarioPayload {
            departamento_id: Some(2),
            ..Default::default()
        };
        let usuario = service.update(usuario.id, patch).await.unwrap();
        assert_eq!(usuario.departamento_id, 2);

        let patch = UpdateUsuarioPayload {
            direccion_id: Some(2),
            departamento_id: Some(3),
            ..Default::default()
        };
        let usuario = service.update(usuario.id, patch).await.unwrap();
        assert_eq!((usuario.direccion_id, usuario.departamento_id), (2, 3));
    }

    #[tokio::test]
    async fn update_rechecks_uniqueness_and_rehashes() {
        let (service, _) = setup().await;
        let a = service.create(payload("a@gad.ec", "1301")).await.unwrap();
        service.create(payload("b@gad.ec", "1302")).await.unwrap();

        let patch = UpdateUsuarioPayload {
            correo: Some("b@gad.ec".into()),
            ..Default::default()
        };
        assert!(matches!(service.update(a.id, patch).await, Err(AppError::Conflict(_))));

        // El propio correo no cuenta como duplicado.
        let patch = UpdateUsuarioPayload {
            correo: Some("a@gad.ec".into()),
            password: Some("nueva-clave".into()),
            ..Default::default()
        };
        let a = service.update(a.id, patch).await.unwrap();
        assert!(service.hasher().verify("nueva-clave", &a.password).await.unwrap());
    }

    #[tokio::test]
    async fn deactivate_keeps_the_row() {
        let (service, _) = setup().await;
        let usuario = service.create(payload("maria@gad.ec", "1301")).await.unwrap();
        service.deactivate(usuario.id).await.unwrap();

        let detalle = service.get(usuario.id).await.unwrap();
        assert!(!detalle.usuario.activo);
        let salida = detalle.usuario.fecha_salida.unwrap();
        assert!(salida >= detalle.usuario.fecha_registro);

        assert!(service.list(false).await.unwrap().is_empty());
        assert_eq!(service.list(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn inactive_on_create_gets_an_exit_date() {
        let (service, _) = setup().await;
        let mut p = payload("maria@gad.ec", "1301");
        p.activo = Some(false);

        let usuario = service.create(p).await.unwrap();
        assert!(!usuario.activo);
        assert_eq!(usuario.fecha_salida, Some(usuario.fecha_registro));
    }

    #[tokio::test]
    async fn deactivate_stamps_exit_date_on_inactive_rows_without_one() {
        let (service, repos) = setup().await;
        let registro = Utc::now();
        let usuario = repos
            .usuarios
            .create(NuevoUsuario {
                nombre: "Pedro".into(),
                correo: "pedro@gad.ec".into(),
                password: "digest".into(),
                rol: Rol::Usuario,
                activo: false,
                numero_cedula: "1309".into(),
                fecha_nacimiento: NaiveDate::from_ymd_opt(1990, 2, 1).unwrap(),
                fecha_registro: registro,
                fecha_salida: None,
                celular: "0990000009".into(),
                nom_contacto_emerg: None,
                tel_contacto_emerg: None,
                direccion_id: 1,
                departamento_id: 1,
            })
            .await
            .unwrap();

        let usuario = service.deactivate(usuario.id).await.unwrap();
        assert!(!usuario.activo);
        assert!(usuario.fecha_salida.unwrap() >= registro);

        // Una segunda baja no mueve la fecha.
        let again = service.deactivate(usuario.id).await.unwrap();
        assert_eq!(again.fecha_salida, usuario.fecha_salida);
    }

    #[tokio::test]
    async fn lookups_by_correo_and_cedula() {
        let (service, _) = setup().await;
        service.create(payload("maria@gad.ec", "1301")).await.unwrap();

        assert!(service.get_by_correo("maria@gad.ec").await.unwrap().is_some());
        assert!(service.get_by_cedula("1301").await.unwrap().is_some());
        assert!(service.get_by_cedula("0000").await.unwrap().is_none());
    }
}
