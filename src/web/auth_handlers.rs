// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{CadastroForm, LoginForm},
    services::auth_service,
    state::AppState,
    templates::{CadastroPage, LoginPage},
    web::{
        mw_auth::{SESSION_GESTAO_MODE, SESSION_UID},
        render_page,
    },
};
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

async fn is_logged_in(session: &Session) -> bool {
    session.get::<i64>(SESSION_UID).await.ok().flatten().is_some()
}

// GET /
pub async fn home(session: Session) -> Redirect {
    if is_logged_in(&session).await {
        Redirect::to("/form")
    } else {
        Redirect::to("/login")
    }
}

// GET /login
pub async fn show_login_form(session: Session) -> AppResult<Response> {
    if is_logged_in(&session).await {
        tracing::debug!("GET /login: Utilizador já logado, redirecionando para /form");
        return Ok(Redirect::to("/form").into_response());
    }
    render_page(&LoginPage {
        error: None,
        info: None,
        username: String::new(),
    })
}

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let username = form.username.trim();
    tracing::info!("Tentativa de login para: {}", username);

    let Some(user) = auth_service::authenticate(&state.db_pool, username, &form.password).await?
    else {
        return render_page(&LoginPage {
            error: Some("Usuário ou senha inválidos.".to_string()),
            info: None,
            username: username.to_string(),
        });
    };

    // Novo ID de sessão no login; o modo gestão nunca passa de uma sessão para outra
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
    session
        .remove::<bool>(SESSION_GESTAO_MODE)
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao limpar sessão: {}", e)))?;
    session
        .insert(SESSION_UID, user.id)
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))?;

    tracing::info!("✅ Login bem-sucedido para: {}", user.username);
    Ok(Redirect::to("/form").into_response())
}

// GET /logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    let uid: Option<i64> = session.get(SESSION_UID).await.ok().flatten();

    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;

    match uid {
        Some(id) => tracing::info!("🚪 Utilizador {} desligado.", id),
        None => tracing::info!("🚪 Sessão anónima desligada."),
    }
    Ok(Redirect::to("/login"))
}

// GET /cadastro
pub async fn show_cadastro_form(session: Session) -> AppResult<Response> {
    if is_logged_in(&session).await {
        return Ok(Redirect::to("/form").into_response());
    }
    render_page(&CadastroPage {
        error: None,
        username: String::new(),
    })
}

// POST /cadastro
pub async fn handle_cadastro(
    State(state): State<AppState>,
    Form(form): Form<CadastroForm>,
) -> AppResult<Response> {
    match auth_service::register_professor(&state.db_pool, &form.username, &form.password).await {
        Ok(id) => {
            tracing::info!("👤 Professor '{}' registado (id {})", form.username.trim(), id);
            render_page(&LoginPage {
                error: None,
                info: Some("Cadastro feito. Entre com suas credenciais.".to_string()),
                username: form.username.trim().to_string(),
            })
        }
        Err(AppError::Validation(msg)) => render_page(&CadastroPage {
            error: Some(msg),
            username: form.username.trim().to_string(),
        }),
        Err(e) => Err(e),
    }
}
