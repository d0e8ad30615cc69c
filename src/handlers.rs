pub mod auth;
pub mod departamentos;
pub mod direcciones;
pub mod permisos;
pub mod usuarios;
