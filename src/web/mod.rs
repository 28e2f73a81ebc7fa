// src/web/mod.rs
pub mod auth_handlers;
pub mod gestao_handlers;
pub mod mw_auth;
pub mod mw_gestao;
pub mod routes;
pub mod tutoria_handlers;


use crate::error::{AppError, AppResult};
use askama::Template;
use axum::{
    extract::FromRequest,
    response::{Html, IntoResponse, Response},
};

/// Corpo JSON dos handlers da API; corpo malformado vira `AppError::Validation`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Renderiza uma página askama; falha de template vira 500.
pub fn render_page<T: Template>(page: &T) -> AppResult<Response> {
    match page.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!("Falha ao renderizar template: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}
