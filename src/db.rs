pub mod departamento_repo;
pub mod direccion_repo;
pub mod memory;
pub mod permiso_repo;
pub mod usuario_repo;

pub use departamento_repo::{DepartamentoRepository, PgDepartamentoRepository};
pub use direccion_repo::{DireccionRepository, PgDireccionRepository};
pub use memory::InMemoryStore;
pub use permiso_repo::{PermisoRepository, PgPermisoRepository};
pub use usuario_repo::{PgUsuarioRepository, UsuarioRepository};

use std::sync::Arc;

use sqlx::PgPool;

// Los cuatro repositorios que consumen los servicios, sobre el mismo backend.
#[derive(Clone)]
pub struct Repositories {
    pub direcciones: Arc<dyn DireccionRepository>,
    pub departamentos: Arc<dyn DepartamentoRepository>,
    pub usuarios: Arc<dyn UsuarioRepository>,
    pub permisos: Arc<dyn PermisoRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            direcciones: Arc::new(PgDireccionRepository::new(pool.clone())),
            departamentos: Arc::new(PgDepartamentoRepository::new(pool.clone())),
            usuarios: Arc::new(PgUsuarioRepository::new(pool.clone())),
            permisos: Arc::new(PgPermisoRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            direcciones: store.clone(),
            departamentos: store.clone(),
            usuarios: store.clone(),
            permisos: store,
        }
    }
}
