pub mod auth;
pub mod departamento_service;
pub mod direccion_service;
pub mod permiso_service;
pub mod usuario_service;
