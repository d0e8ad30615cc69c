// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::registro,
        handlers::auth::login,

        // --- Direcciones ---
        handlers::direcciones::list_direcciones,
        handlers::direcciones::get_direccion,
        handlers::direcciones::create_direccion,
        handlers::direcciones::update_direccion,
        handlers::direcciones::delete_direccion,

        // --- Departamentos ---
        handlers::departamentos::list_departamentos,
        handlers::departamentos::get_jerarquia,
        handlers::departamentos::get_departamentos_by_direccion,
        handlers::departamentos::get_departamento,
        handlers::departamentos::create_departamento,
        handlers::departamentos::update_departamento,
        handlers::departamentos::delete_departamento,

        // --- Usuarios ---
        handlers::usuarios::list_usuarios,
        handlers::usuarios::list_todos_usuarios,
        handlers::usuarios::get_perfil,
        handlers::usuarios::get_usuario,
        handlers::usuarios::create_usuario,
        handlers::usuarios::update_usuario,
        handlers::usuarios::deactivate_usuario,

        // --- Permisos ---
        handlers::permisos::list_permisos,
        handlers::permisos::list_permisos_by_usuario,
        handlers::permisos::get_permiso,
        handlers::permisos::create_permiso,
        handlers::permisos::update_permiso,
        handlers::permisos::delete_permiso,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::RegistroPayload,
            models::auth::LoginPayload,
            models::auth::UsuarioResumen,
            models::auth::AuthResponse,

            // --- Direcciones ---
            models::direccion::Direccion,
            models::direccion::DireccionDetalle,
            models::direccion::CreateDireccionPayload,
            models::direccion::UpdateDireccionPayload,

            // --- Departamentos ---
            models::departamento::Departamento,
            models::departamento::DepartamentoDetalle,
            models::departamento::DepartamentoNodo,
            models::departamento::CreateDepartamentoPayload,
            models::departamento::UpdateDepartamentoPayload,

            // --- Usuarios ---
            models::usuario::Rol,
            models::usuario::Usuario,
            models::usuario::UsuarioDetalle,
            models::usuario::CreateUsuarioPayload,
            models::usuario::UpdateUsuarioPayload,

            // --- Permisos ---
            models::permiso::NivelPermiso,
            models::permiso::Permiso,
            models::permiso::PermisoDetalle,
            models::permiso::CreatePermisoPayload,
            models::permiso::UpdatePermisoPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Registro e inicio de sesión"),
        (name = "Direcciones", description = "Unidades organizativas de primer nivel"),
        (name = "Departamentos", description = "Departamentos y su jerarquía"),
        (name = "Usuarios", description = "Funcionarios y baja lógica"),
        (name = "Permisos", description = "Accesos por dirección y departamento")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
