// src/db/memory.rs
//
// Almacén en memoria para pruebas y para levantar el servicio sin base de
// datos. Reproduce las restricciones de la migración (unicidades, claves
// compuestas departamento+dirección, RESTRICT y CASCADE) bajo un único lock,
// y responde con los mismos errores que el mapeo de Postgres.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::common::db_utils::{
    foreign_key_conflict, unique_conflict, DEPARTAMENTOS_DIRECCION_FKEY, DEPARTAMENTOS_PADRE_FKEY,
    MSG_DEPARTAMENTO_CON_DEPENDIENTES, MSG_PADRE_PROPIO, PERMISOS_DEPARTAMENTO_FKEY,
    PERMISOS_TRIPLE_KEY, PERMISOS_USUARIO_FKEY, USUARIOS_CEDULA_KEY, USUARIOS_CORREO_KEY,
    USUARIOS_DEPARTAMENTO_FKEY,
};
use crate::common::error::AppError;
use crate::db::{DepartamentoRepository, DireccionRepository, PermisoRepository, UsuarioRepository};
use crate::models::departamento::{Departamento, NuevoDepartamento};
use crate::models::direccion::Direccion;
use crate::models::permiso::{NuevoPermiso, Permiso};
use crate::models::usuario::{NuevoUsuario, Usuario};

#[derive(Debug, Default)]
struct Secuencias {
    direcciones: i32,
    departamentos: i32,
    usuarios: i32,
    permisos: i32,
}

fn siguiente(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct Tables {
    direcciones: BTreeMap<i32, Direccion>,
    departamentos: BTreeMap<i32, Departamento>,
    usuarios: BTreeMap<i32, Usuario>,
    permisos: BTreeMap<i32, Permiso>,
    secuencias: Secuencias,
}

impl Tables {
    // Equivalente a la FK compuesta (departamento_id, direccion_id).
    fn par_valido(&self, departamento_id: i32, direccion_id: i32) -> bool {
        self.departamentos
            .get(&departamento_id)
            .is_some_and(|d| d.direccion_id == direccion_id)
    }

    fn check_departamento(&self, d: &Departamento) -> Result<(), AppError> {
        if d.padre_id == Some(d.id) {
            return Err(AppError::InvalidHierarchy(MSG_PADRE_PROPIO.to_string()));
        }
        if !self.direcciones.contains_key(&d.direccion_id) {
            return Err(AppError::direccion_not_found(d.direccion_id));
        }
        if let Some(padre_id) = d.padre_id {
            if !self.par_valido(padre_id, d.direccion_id) {
                return Err(foreign_key_conflict(DEPARTAMENTOS_PADRE_FKEY));
            }
        }
        Ok(())
    }

    fn check_usuario(&self, u: &Usuario) -> Result<(), AppError> {
        let otros = || self.usuarios.values().filter(|o| o.id != u.id);
        if otros().any(|o| o.correo == u.correo) {
            return Err(unique_conflict(USUARIOS_CORREO_KEY));
        }
        if otros().any(|o| o.numero_cedula == u.numero_cedula) {
            return Err(unique_conflict(USUARIOS_CEDULA_KEY));
        }
        if !self.par_valido(u.departamento_id, u.direccion_id) {
            return Err(foreign_key_conflict(USUARIOS_DEPARTAMENTO_FKEY));
        }
        Ok(())
    }

    fn check_permiso(&self, p: &Permiso) -> Result<(), AppError> {
        if !self.usuarios.contains_key(&p.usuario_id) {
            return Err(foreign_key_conflict(PERMISOS_USUARIO_FKEY));
        }
        if !self.par_valido(p.departamento_id, p.direccion_id) {
            return Err(foreign_key_conflict(PERMISOS_DEPARTAMENTO_FKEY));
        }
        let duplicado = self.permisos.values().any(|o| {
            o.id != p.id
                && o.usuario_id == p.usuario_id
                && o.direccion_id == p.direccion_id
                && o.departamento_id == p.departamento_id
        });
        if duplicado {
            return Err(unique_conflict(PERMISOS_TRIPLE_KEY));
        }
        Ok(())
    }
}

/// Implementa los cuatro repositorios sobre las mismas tablas.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::from(anyhow::anyhow!("lock del almacén en memoria envenenado")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::from(anyhow::anyhow!("lock del almacén en memoria envenenado")))
    }
}

fn select<T: Clone>(rows: &BTreeMap<i32, T>, pred: impl Fn(&T) -> bool) -> Vec<T> {
    rows.values().filter(|r| pred(r)).cloned().collect()
}

#[async_trait]
impl DireccionRepository for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Direccion>, AppError> {
        Ok(select(&self.read()?.direcciones, |_| true))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Direccion>, AppError> {
        Ok(self.read()?.direcciones.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Direccion>, AppError> {
        Ok(select(&self.read()?.direcciones, |d| ids.contains(&d.id)))
    }

    async fn create(&self, nombre: &str, estado: bool) -> Result<Direccion, AppError> {
        let mut t = self.write()?;
        let id = siguiente(&mut t.secuencias.direcciones);
        let direccion = Direccion {
            id,
            nombre: nombre.to_string(),
            estado,
        };
        t.direcciones.insert(id, direccion.clone());
        Ok(direccion)
    }

    async fn update(&self, direccion: &Direccion) -> Result<Direccion, AppError> {
        let mut t = self.write()?;
        let row = t
            .direcciones
            .get_mut(&direccion.id)
            .ok_or_else(|| AppError::direccion_not_found(direccion.id))?;
        *row = direccion.clone();
        Ok(direccion.clone())
    }

    async fn delete(&self, id: i32) -> Result<u64, AppError> {
        let mut t = self.write()?;
        if !t.direcciones.contains_key(&id) {
            return Ok(0);
        }
        if t.departamentos.values().any(|d| d.direccion_id == id) {
            return Err(foreign_key_conflict(DEPARTAMENTOS_DIRECCION_FKEY));
        }
        t.permisos.retain(|_, p| p.direccion_id != id);
        t.direcciones.remove(&id);
        Ok(1)
    }
}

#[async_trait]
impl DepartamentoRepository for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Departamento>, AppError> {
        Ok(select(&self.read()?.departamentos, |_| true))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Departamento>, AppError> {
        Ok(self.read()?.departamentos.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Departamento>, AppError> {
        Ok(select(&self.read()?.departamentos, |d| ids.contains(&d.id)))
    }

    async fn find_by_direccion(&self, direccion_id: i32) -> Result<Vec<Departamento>, AppError> {
        Ok(select(&self.read()?.departamentos, |d| d.direccion_id == direccion_id))
    }

    async fn find_roots(&self) -> Result<Vec<Departamento>, AppError> {
        Ok(select(&self.read()?.departamentos, |d| d.padre_id.is_none()))
    }

    async fn find_children_of(&self, padre_ids: &[i32]) -> Result<Vec<Departamento>, AppError> {
        Ok(select(&self.read()?.departamentos, |d| {
            d.padre_id.is_some_and(|p| padre_ids.contains(&p))
        }))
    }

    async fn count_by_direccion(&self, direccion_id: i32) -> Result<i64, AppError> {
        let t = self.read()?;
        Ok(t.departamentos.values().filter(|d| d.direccion_id == direccion_id).count() as i64)
    }

    async fn count_children(&self, id: i32) -> Result<i64, AppError> {
        let t = self.read()?;
        Ok(t.departamentos.values().filter(|d| d.padre_id == Some(id)).count() as i64)
    }

    async fn create(&self, nuevo: NuevoDepartamento) -> Result<Departamento, AppError> {
        let mut t = self.write()?;
        let departamento = Departamento {
            id: t.secuencias.departamentos + 1,
            nombre: nuevo.nombre,
            descripcion: nuevo.descripcion,
            estado: nuevo.estado,
            direccion_id: nuevo.direccion_id,
            padre_id: nuevo.padre_id,
        };
        t.check_departamento(&departamento)?;
        siguiente(&mut t.secuencias.departamentos);
        t.departamentos.insert(departamento.id, departamento.clone());
        Ok(departamento)
    }

    async fn update(&self, departamento: &Departamento) -> Result<Departamento, AppError> {
        let mut t = self.write()?;
        let actual = t
            .departamentos
            .get(&departamento.id)
            .ok_or_else(|| AppError::not_found("Departamento", departamento.id))?;

        // Cambiar la dirección rompe las FK compuestas de quien lo referencia.
        if actual.direccion_id != departamento.direccion_id {
            let id = departamento.id;
            if t.usuarios.values().any(|u| u.departamento_id == id) {
                return Err(foreign_key_conflict(USUARIOS_DEPARTAMENTO_FKEY));
            }
            if t.permisos.values().any(|p| p.departamento_id == id) {
                return Err(foreign_key_conflict(PERMISOS_DEPARTAMENTO_FKEY));
            }
            if t.departamentos.values().any(|d| d.padre_id == Some(id)) {
                return Err(foreign_key_conflict(DEPARTAMENTOS_PADRE_FKEY));
            }
        }
        t.check_departamento(departamento)?;

        t.departamentos.insert(departamento.id, departamento.clone());
        Ok(departamento.clone())
    }

    async fn delete(&self, id: i32) -> Result<u64, AppError> {
        let mut t = self.write()?;
        if !t.departamentos.contains_key(&id) {
            return Ok(0);
        }
        let con_usuarios = t.usuarios.values().any(|u| u.departamento_id == id);
        let con_hijos = t.departamentos.values().any(|d| d.padre_id == Some(id));
        if con_usuarios || con_hijos {
            return Err(AppError::conflict(MSG_DEPARTAMENTO_CON_DEPENDIENTES));
        }
        t.permisos.retain(|_, p| p.departamento_id != id);
        t.departamentos.remove(&id);
        Ok(1)
    }
}

#[async_trait]
impl UsuarioRepository for InMemoryStore {
    async fn find_all(&self, include_inactive: bool) -> Result<Vec<Usuario>, AppError> {
        Ok(select(&self.read()?.usuarios, |u| include_inactive || u.activo))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Usuario>, AppError> {
        Ok(self.read()?.usuarios.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Usuario>, AppError> {
        Ok(select(&self.read()?.usuarios, |u| ids.contains(&u.id)))
    }

    async fn find_by_departamentos(&self, departamento_ids: &[i32]) -> Result<Vec<Usuario>, AppError> {
        Ok(select(&self.read()?.usuarios, |u| departamento_ids.contains(&u.departamento_id)))
    }

    async fn find_by_correo(&self, correo: &str) -> Result<Option<Usuario>, AppError> {
        let t = self.read()?;
        Ok(t.usuarios.values().find(|u| u.correo == correo).cloned())
    }

    async fn find_by_cedula(&self, cedula: &str) -> Result<Option<Usuario>, AppError> {
        let t = self.read()?;
        Ok(t.usuarios.values().find(|u| u.numero_cedula == cedula).cloned())
    }

    async fn count_by_departamento(&self, departamento_id: i32) -> Result<i64, AppError> {
        let t = self.read()?;
        Ok(t.usuarios.values().filter(|u| u.departamento_id == departamento_id).count() as i64)
    }

    async fn create(&self, nuevo: NuevoUsuario) -> Result<Usuario, AppError> {
        let mut t = self.write()?;
        let usuario = Usuario {
            id: t.secuencias.usuarios + 1,
            nombre: nuevo.nombre,
            correo: nuevo.correo,
            password: nuevo.password,
            rol: nuevo.rol,
            activo: nuevo.activo,
            numero_cedula: nuevo.numero_cedula,
            fecha_nacimiento: nuevo.fecha_nacimiento,
            fecha_registro: nuevo.fecha_registro,
            fecha_salida: nuevo.fecha_salida,
            celular: nuevo.celular,
            nom_contacto_emerg: nuevo.nom_contacto_emerg,
            tel_contacto_emerg: nuevo.tel_contacto_emerg,
            direccion_id: nuevo.direccion_id,
            departamento_id: nuevo.departamento_id,
        };
        t.check_usuario(&usuario)?;
        siguiente(&mut t.secuencias.usuarios);
        t.usuarios.insert(usuario.id, usuario.clone());
        Ok(usuario)
    }

    async fn update(&self, usuario: &Usuario) -> Result<Usuario, AppError> {
        let mut t = self.write()?;
        if !t.usuarios.contains_key(&usuario.id) {
            return Err(AppError::not_found("Usuario", usuario.id));
        }
        t.check_usuario(usuario)?;
        t.usuarios.insert(usuario.id, usuario.clone());
        Ok(usuario.clone())
    }
}

#[async_trait]
impl PermisoRepository for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Permiso>, AppError> {
        Ok(select(&self.read()?.permisos, |_| true))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Permiso>, AppError> {
        Ok(self.read()?.permisos.get(&id).cloned())
    }

    async fn find_by_usuario(&self, usuario_id: i32) -> Result<Vec<Permiso>, AppError> {
        Ok(select(&self.read()?.permisos, |p| p.usuario_id == usuario_id))
    }

    async fn find_by_triple(
        &self,
        usuario_id: i32,
        direccion_id: i32,
        departamento_id: i32,
    ) -> Result<Option<Permiso>, AppError> {
        let t = self.read()?;
        Ok(t.permisos
            .values()
            .find(|p| {
                p.usuario_id == usuario_id
                    && p.direccion_id == direccion_id
                    && p.departamento_id == departamento_id
            })
            .cloned())
    }

    async fn count_by_departamento(&self, departamento_id: i32) -> Result<i64, AppError> {
        let t = self.read()?;
        Ok(t.permisos.values().filter(|p| p.departamento_id == departamento_id).count() as i64)
    }

    async fn create(&self, nuevo: NuevoPermiso) -> Result<Permiso, AppError> {
        let mut t = self.write()?;
        let permiso = Permiso {
            id: t.secuencias.permisos + 1,
            fecha_registro: nuevo.fecha_registro,
            nivel: nuevo.nivel,
            usuario_id: nuevo.usuario_id,
            direccion_id: nuevo.direccion_id,
            departamento_id: nuevo.departamento_id,
        };
        t.check_permiso(&permiso)?;
        siguiente(&mut t.secuencias.permisos);
        t.permisos.insert(permiso.id, permiso.clone());
        Ok(permiso)
    }

    async fn update(&self, permiso: &Permiso) -> Result<Permiso, AppError> {
        let mut t = self.write()?;
        if !t.permisos.contains_key(&permiso.id) {
            return Err(AppError::not_found("Permiso", permiso.id));
        }
        t.check_permiso(permiso)?;
        t.permisos.insert(permiso.id, permiso.clone());
        Ok(permiso.clone())
    }

    async fn delete(&self, id: i32) -> Result<u64, AppError> {
        let mut t = self.write()?;
        Ok(t.permisos.remove(&id).map_or(0, |_| 1))
    }
}
