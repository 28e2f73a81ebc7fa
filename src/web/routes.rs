// src/web/routes.rs
use crate::{
    state::AppState,
    web::{auth_handlers, gestao_handlers, mw_auth, mw_gestao, tutoria_handlers},
};
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/", get(auth_handlers::home))
        .route("/login", get(auth_handlers::show_login_form).post(auth_handlers::handle_login))
        .route("/logout", get(auth_handlers::handle_logout))
        .route(
            "/cadastro",
            get(auth_handlers::show_cadastro_form).post(auth_handlers::handle_cadastro),
        );

    // --- Painel de gestão (exige modo gestão, senão volta ao PIN) ---
    let painel_routes = Router::new()
        .route("/painel", get(gestao_handlers::show_painel))
        .route_layer(middleware::from_fn(mw_gestao::require_gestao_mode));

    let gestao_routes = Router::new()
        .route("/", get(gestao_handlers::show_pin_form).post(gestao_handlers::handle_pin))
        .route("/bloquear", post(gestao_handlers::handle_bloquear))
        .merge(painel_routes);

    // --- Páginas autenticadas (redirecionam para /login) ---
    let page_routes = Router::new()
        .route("/form", get(tutoria_handlers::show_form))
        .route("/lista", get(tutoria_handlers::show_lista))
        .route("/tutorias/{id}/pdf", get(tutoria_handlers::download_pdf))
        .nest("/gestao", gestao_routes)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    // --- API de gestão (403 sem modo gestão) ---
    let gestao_api = Router::new()
        .route("/professores", get(gestao_handlers::api_professores))
        .route("/tutorias", get(gestao_handlers::api_tutorias))
        .route("/carimbo", post(gestao_handlers::api_carimbar_todas))
        .route("/tutorias/{id}/carimbo", post(gestao_handlers::api_carimbar))
        .route("/tutorias/{id}/apagar", post(gestao_handlers::api_apagar))
        .route("/tutorias/apagar", post(gestao_handlers::api_apagar_varias))
        .route("/tutorias/apagar-todas", post(gestao_handlers::api_apagar_todas))
        .route_layer(middleware::from_fn(mw_gestao::require_gestao_mode_api));

    // --- API autenticada (401 sem sessão) ---
    let api_routes = Router::new()
        .route("/tutorias", post(tutoria_handlers::api_create))
        .route(
            "/tutorias/{id}",
            put(tutoria_handlers::api_update).delete(tutoria_handlers::api_delete),
        )
        .nest("/gestao", gestao_api)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth_api,
        ));

    Router::new()
        .merge(public_routes)
        .merge(page_routes)
        .nest("/api", api_routes)
        .with_state(app_state)
}
