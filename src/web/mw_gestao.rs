// src/web/mw_gestao.rs
use crate::{context::RequestContext, error::AppError};
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// Painel: sem modo gestão volta ao formulário do PIN.
/// Corre depois de `require_auth`, que põe o contexto nas extensões.
pub async fn require_gestao_mode(
    Extension(ctx): Extension<RequestContext>,
    request: Request,
    next: Next,
) -> Response {
    if ctx.gestao_mode {
        next.run(request).await
    } else {
        tracing::debug!("Gestão MW: '{}' sem modo gestão, a pedir PIN.", ctx.username);
        Redirect::to("/gestao").into_response()
    }
}

/// API de gestão: 403 sem modo gestão.
pub async fn require_gestao_mode_api(
    Extension(ctx): Extension<RequestContext>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    ctx.ensure_gestao_mode()?;
    Ok(next.run(request).await)
}
