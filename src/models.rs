pub mod auth;
pub mod departamento;
pub mod direccion;
pub mod permiso;
pub mod usuario;
