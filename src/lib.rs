//! Backend administrativo del GAD Municipal de Jaramijó: direcciones,
//! departamentos, usuarios y permisos sobre axum + sqlx.

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

/// Router completo de la aplicación, con el estado ya aplicado.
pub fn app(app_state: AppState) -> Router {
    // Rutas públicas
    let auth_routes = Router::new()
        .route("/registro", post(handlers::auth::registro))
        .route("/login", post(handlers::auth::login));

    let direccion_routes = Router::new()
        .route(
            "/",
            get(handlers::direcciones::list_direcciones).post(handlers::direcciones::create_direccion),
        )
        .route(
            "/{id}",
            get(handlers::direcciones::get_direccion)
                .put(handlers::direcciones::update_direccion)
                .delete(handlers::direcciones::delete_direccion),
        );

    let departamento_routes = Router::new()
        .route(
            "/",
            get(handlers::departamentos::list_departamentos)
                .post(handlers::departamentos::create_departamento),
        )
        .route("/jerarquia/completa", get(handlers::departamentos::get_jerarquia))
        .route(
            "/direccion/{id}",
            get(handlers::departamentos::get_departamentos_by_direccion),
        )
        .route(
            "/{id}",
            get(handlers::departamentos::get_departamento)
                .put(handlers::departamentos::update_departamento)
                .delete(handlers::departamentos::delete_departamento),
        );

    let usuario_routes = Router::new()
        .route(
            "/",
            get(handlers::usuarios::list_usuarios).post(handlers::usuarios::create_usuario),
        )
        .route("/todos", get(handlers::usuarios::list_todos_usuarios))
        .route("/perfil", get(handlers::usuarios::get_perfil))
        .route(
            "/{id}",
            get(handlers::usuarios::get_usuario)
                .put(handlers::usuarios::update_usuario)
                .delete(handlers::usuarios::deactivate_usuario),
        );

    let permiso_routes = Router::new()
        .route(
            "/",
            get(handlers::permisos::list_permisos).post(handlers::permisos::create_permiso),
        )
        .route("/usuario/{id}", get(handlers::permisos::list_permisos_by_usuario))
        .route(
            "/{id}",
            get(handlers::permisos::get_permiso)
                .put(handlers::permisos::update_permiso)
                .delete(handlers::permisos::delete_permiso),
        );

    // Todo lo que no es auth ni health exige token; el rol lo exige cada handler.
    let protected_routes = Router::new()
        .nest("/direcciones", direccion_routes)
        .nest("/departamentos", departamento_routes)
        .nest("/usuarios", usuario_routes)
        .nest("/permisos", permiso_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let api_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .with_state(app_state)
}
