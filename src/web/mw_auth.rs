// src/web/mw_auth.rs
use crate::{
    context::RequestContext,
    error::{AppError, AppResult},
    services::user_service,
    state::AppState,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

// Chaves guardadas na sessão
pub const SESSION_UID: &str = "uid";
pub const SESSION_GESTAO_MODE: &str = "gestao_mode";

fn session_error(e: tower_sessions::session::Error) -> AppError {
    tracing::error!("Autenticação MW: Erro ao ler sessão: {:?}", e);
    AppError::SessionError(format!("Erro ao verificar sessão: {}", e))
}

/// Monta o contexto do pedido a partir da sessão. O utilizador é relido da DB,
/// por isso uma conta apagada deixa de valer mesmo com sessão antiga.
pub async fn load_context(state: &AppState, session: &Session) -> AppResult<Option<RequestContext>> {
    let Some(uid) = session.get::<i64>(SESSION_UID).await.map_err(session_error)? else {
        return Ok(None);
    };
    let Some(user) = user_service::find_user_by_id(&state.db_pool, uid).await? else {
        tracing::warn!("Autenticação MW: Sessão aponta para utilizador inexistente ({})", uid);
        session.flush().await.map_err(session_error)?;
        return Ok(None);
    };
    let gestao_mode = session
        .get::<bool>(SESSION_GESTAO_MODE)
        .await
        .map_err(session_error)?
        .unwrap_or(false);

    Ok(Some(RequestContext {
        user_id: user.id,
        role: user.role(),
        username: user.username,
        gestao_mode,
    }))
}

/// Páginas: sem sessão redireciona para /login.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match load_context(&state, &session).await? {
        Some(ctx) => {
            tracing::debug!("Autenticação MW: '{}' autenticado.", ctx.username);
            request.extensions_mut().insert(ctx);
            Ok(next.run(request).await)
        }
        None => {
            tracing::debug!("Autenticação MW: Não autenticado. Redirecionando para /login");
            Ok(Redirect::to("/login").into_response())
        }
    }
}

/// API: sem sessão responde 401 em JSON.
pub async fn require_auth_api(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match load_context(&state, &session).await? {
        Some(ctx) => {
            request.extensions_mut().insert(ctx);
            Ok(next.run(request).await)
        }
        None => Err(AppError::Unauthorized),
    }
}
