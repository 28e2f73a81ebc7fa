// src/web/tutoria_handlers.rs
use crate::{
    context::RequestContext,
    error::{AppError, AppResult},
    models::tutoria::{FormRecord, TutoriaPayload, UpdateOutcome},
    pdf,
    services::{tutoria_service, user_service},
    state::AppState,
    templates::{FormPage, ListaPage},
    web::{render_page, ApiJson},
};
use axum::{
    extract::{Extension, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct FormQuery {
    pub id: Option<String>,
    pub duplicar: Option<String>,
}

// GET /form?id=N&duplicar=1
pub async fn show_form(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<FormQuery>,
) -> AppResult<Response> {
    let id = match query.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| AppError::NotFound)?),
    };
    let record = match id {
        None => FormRecord::Nova,
        Some(id) => {
            let duplicate = query.duplicar.as_deref() == Some("1");
            tutoria_service::load_for_edit(&state.db_pool, &ctx, id, duplicate).await?
        }
    };
    render_page(&FormPage::new(&ctx, record))
}

// GET /lista
pub async fn show_lista(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Response> {
    let tutorias = tutoria_service::list(&state.db_pool, &ctx).await?;
    let owners = user_service::usernames_by_id(&state.db_pool).await?;
    render_page(&ListaPage::new(&ctx, &tutorias, &owners))
}

// POST /api/tutorias
pub async fn api_create(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(payload): ApiJson<TutoriaPayload>,
) -> AppResult<Json<Value>> {
    let id = tutoria_service::create(&state.db_pool, &ctx, &payload).await?;
    Ok(Json(json!({ "ok": true, "id": id })))
}

// PUT /api/tutorias/{id}
pub async fn api_update(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<TutoriaPayload>,
) -> AppResult<Json<Value>> {
    let outcome = tutoria_service::update(&state.db_pool, &ctx, id, &payload).await?;
    let criado = matches!(outcome, UpdateOutcome::Created(_));
    Ok(Json(json!({ "ok": true, "id": outcome.id(), "nova": criado })))
}

// DELETE /api/tutorias/{id}
pub async fn api_delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    tutoria_service::delete(&state.db_pool, &ctx, id).await?;
    Ok(Json(json!({ "ok": true })))
}

// GET /tutorias/{id}/pdf
pub async fn download_pdf(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let tutoria = tutoria_service::find_accessible(&state.db_pool, &ctx, id).await?;
    let owner = user_service::find_user_by_id(&state.db_pool, tutoria.professor_id)
        .await?
        .map(|u| u.username)
        .unwrap_or_default();
    let filename = pdf::pdf_filename(tutoria.id, &tutoria.nome_aluno);

    // Layout e compressão são trabalho de CPU, fora do runtime async
    let bytes = tokio::task::spawn_blocking(move || pdf::render_tutoria(&tutoria, &owner))
        .await
        .map_err(|e| {
            tracing::error!("Task do PDF falhou: {:?}", e);
            AppError::InternalServerError
        })??;

    tracing::info!("📄 PDF da tutoria {} gerado para '{}'", id, ctx.username);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}
