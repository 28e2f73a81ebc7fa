// src/web/gestao_handlers.rs
use crate::{
    context::RequestContext,
    error::{AppError, AppResult},
    models::{
        tutoria::{Carimbo, TutoriaExport},
        user::UserSummary,
    },
    services::{auth_service::secrets_match, gestao_service},
    state::AppState,
    templates::{GestaoPage, GestaoPinPage},
    web::{mw_auth::SESSION_GESTAO_MODE, render_page, ApiJson},
};
use axum::{
    extract::{Extension, Form, Path, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;

#[derive(Debug, Deserialize)]
pub struct PinForm {
    #[serde(default)]
    pub pin: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SenhaBody {
    pub senha: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApagarVariasBody {
    pub ids: Vec<Value>,
    pub senha: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApagarTodasBody {
    pub senha: String,
    pub confirmacao: String,
}

// GET /gestao
pub async fn show_pin_form(Extension(ctx): Extension<RequestContext>) -> AppResult<Response> {
    if ctx.gestao_mode {
        return Ok(Redirect::to("/gestao/painel").into_response());
    }
    render_page(&GestaoPinPage {
        username: ctx.username,
        error: None,
    })
}

// POST /gestao
pub async fn handle_pin(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    session: Session,
    Form(form): Form<PinForm>,
) -> AppResult<Response> {
    if !secrets_match(form.pin.trim(), &state.config.gestao_pin) {
        tracing::warn!("PIN de gestão incorreto para '{}'", ctx.username);
        return render_page(&GestaoPinPage {
            username: ctx.username,
            error: Some("PIN incorreto.".to_string()),
        });
    }
    // Mudança de privilégio: novo id de sessão
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao renovar sessão: {}", e)))?;
    session
        .insert(SESSION_GESTAO_MODE, true)
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))?;
    tracing::info!("🔓 Modo gestão ativado para '{}'", ctx.username);
    Ok(Redirect::to("/gestao/painel").into_response())
}

// GET /gestao/painel
pub async fn show_painel(Extension(ctx): Extension<RequestContext>) -> AppResult<Response> {
    render_page(&GestaoPage::new(&ctx))
}

// POST /gestao/bloquear
pub async fn handle_bloquear(
    Extension(ctx): Extension<RequestContext>,
    session: Session,
) -> AppResult<Redirect> {
    session
        .remove::<bool>(SESSION_GESTAO_MODE)
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao limpar sessão: {}", e)))?;
    tracing::info!("🔒 Modo gestão desligado para '{}'", ctx.username);
    Ok(Redirect::to("/gestao"))
}

// GET /api/gestao/professores
pub async fn api_professores(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Json<Vec<UserSummary>>> {
    Ok(Json(gestao_service::list_professores(&state.db_pool, &ctx).await?))
}

// GET /api/gestao/tutorias
pub async fn api_tutorias(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Json<Vec<TutoriaExport>>> {
    Ok(Json(gestao_service::list_all(&state.db_pool, &ctx).await?))
}

// POST /api/gestao/carimbo
pub async fn api_carimbar_todas(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(carimbo): ApiJson<Carimbo>,
) -> AppResult<Json<Value>> {
    let aplicados = gestao_service::stamp_all(&state.db_pool, &ctx, &carimbo).await?;
    Ok(Json(json!({ "ok": true, "aplicados": aplicados })))
}

// POST /api/gestao/tutorias/{id}/carimbo
pub async fn api_carimbar(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
    ApiJson(carimbo): ApiJson<Carimbo>,
) -> AppResult<Json<Value>> {
    gestao_service::stamp_one(&state.db_pool, &ctx, id, &carimbo).await?;
    Ok(Json(json!({ "ok": true })))
}

// POST /api/gestao/tutorias/{id}/apagar
pub async fn api_apagar(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<SenhaBody>,
) -> AppResult<Json<Value>> {
    let expected = state.config.delete_password.as_deref();
    gestao_service::delete_one(&state.db_pool, &ctx, expected, id, &body.senha).await?;
    Ok(Json(json!({ "ok": true })))
}

// POST /api/gestao/tutorias/apagar
pub async fn api_apagar_varias(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(body): ApiJson<ApagarVariasBody>,
) -> AppResult<Json<Value>> {
    let expected = state.config.delete_password.as_deref();
    let apagados =
        gestao_service::delete_many(&state.db_pool, &ctx, expected, &body.ids, &body.senha).await?;
    Ok(Json(json!({ "ok": true, "apagados": apagados })))
}

// POST /api/gestao/tutorias/apagar-todas
pub async fn api_apagar_todas(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(body): ApiJson<ApagarTodasBody>,
) -> AppResult<Json<Value>> {
    let expected = state.config.delete_password.as_deref();
    let apagados = gestao_service::delete_all(
        &state.db_pool,
        &ctx,
        expected,
        &body.senha,
        &body.confirmacao,
    )
    .await?;
    Ok(Json(json!({ "ok": true, "apagados": apagados })))
}
