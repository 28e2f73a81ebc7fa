// src/services/gestao_service.rs
//
// Ações em massa do painel de gestão. Todas exigem o modo gestão na sessão;
// as exclusões exigem ainda a senha de exclusão enviada em cada pedido.
use crate::{
    context::RequestContext,
    error::{AppError, AppResult},
    models::{
        tutoria::{Carimbo, Tutoria, TutoriaExport},
        user::UserSummary,
    },
    services::{auth_service::secrets_match, tutoria_service::TUTORIA_COLUMNS, user_service},
};
use chrono::Utc;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::BTreeSet;

/// Texto que o utilizador tem de escrever para apagar tudo.
pub const CONFIRMACAO_APAGAR_TODAS: &str = "APAGAR_TODAS";

fn check_delete_password(provided: &str, expected: Option<&str>) -> AppResult<()> {
    match expected {
        Some(expected) if secrets_match(provided, expected) => Ok(()),
        Some(_) => {
            tracing::warn!("Senha de exclusão incorreta.");
            Err(AppError::Unauthorized)
        }
        None => {
            tracing::warn!("Exclusão recusada: nenhuma senha de exclusão configurada.");
            Err(AppError::Unauthorized)
        }
    }
}

/// Converte a lista recebida em IDs, ignorando o que não for numérico.
pub fn parse_ids(raw: &[Value]) -> Vec<i64> {
    let ids: BTreeSet<i64> = raw
        .iter()
        .filter_map(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
        .collect();
    ids.into_iter().collect()
}

pub async fn list_professores(
    db_pool: &SqlitePool,
    ctx: &RequestContext,
) -> AppResult<Vec<UserSummary>> {
    ctx.ensure_gestao_mode()?;
    Ok(user_service::find_all_users(db_pool)
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect())
}

/// Exportação completa, mais recentes primeiro.
pub async fn list_all(db_pool: &SqlitePool, ctx: &RequestContext) -> AppResult<Vec<TutoriaExport>> {
    ctx.ensure_gestao_mode()?;
    let tutorias = sqlx::query_as::<_, Tutoria>(&format!(
        "SELECT {} FROM tutorias ORDER BY criado_em DESC, id DESC",
        TUTORIA_COLUMNS
    ))
    .fetch_all(db_pool)
    .await?;
    Ok(tutorias.iter().map(TutoriaExport::from).collect())
}

/// Aplica o mesmo carimbo a todos os registos num único UPDATE.
pub async fn stamp_all(
    db_pool: &SqlitePool,
    ctx: &RequestContext,
    carimbo: &Carimbo,
) -> AppResult<u64> {
    ctx.ensure_gestao_mode()?;
    let c = carimbo.normalized();
    let aplicados = sqlx::query(
        r#"
        UPDATE tutorias SET
            carimbo_resp = ?1,
            carimbo_inst = ?2,
            carimbo_contato = ?3,
            carimbo_texto = ?4,
            carimbo_obs = ?5,
            atualizado_em = MAX(atualizado_em, ?6)
        "#,
    )
    .bind(&c.resp)
    .bind(&c.inst)
    .bind(&c.contato)
    .bind(&c.texto)
    .bind(&c.obs)
    .bind(Utc::now().naive_utc())
    .execute(db_pool)
    .await?
    .rows_affected();
    tracing::info!("🖋️ Carimbo aplicado a {} tutorias por '{}'", aplicados, ctx.username);
    Ok(aplicados)
}

pub async fn stamp_one(
    db_pool: &SqlitePool,
    ctx: &RequestContext,
    id: i64,
    carimbo: &Carimbo,
) -> AppResult<()> {
    ctx.ensure_gestao_mode()?;
    let c = carimbo.normalized();
    let rows = sqlx::query(
        r#"
        UPDATE tutorias SET
            carimbo_resp = ?1,
            carimbo_inst = ?2,
            carimbo_contato = ?3,
            carimbo_texto = ?4,
            carimbo_obs = ?5,
            atualizado_em = MAX(atualizado_em, ?6)
        WHERE id = ?7
        "#,
    )
    .bind(&c.resp)
    .bind(&c.inst)
    .bind(&c.contato)
    .bind(&c.texto)
    .bind(&c.obs)
    .bind(Utc::now().naive_utc())
    .bind(id)
    .execute(db_pool)
    .await?
    .rows_affected();

    if rows == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!("🖋️ Carimbo aplicado à tutoria {} por '{}'", id, ctx.username);
    Ok(())
}

pub async fn delete_one(
    db_pool: &SqlitePool,
    ctx: &RequestContext,
    delete_password: Option<&str>,
    id: i64,
    senha: &str,
) -> AppResult<()> {
    ctx.ensure_gestao_mode()?;
    check_delete_password(senha, delete_password)?;
    let rows = sqlx::query("DELETE FROM tutorias WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!("🗑️ Tutoria {} apagada pela gestão ('{}')", id, ctx.username);
    Ok(())
}

/// Apaga os IDs indicados que existirem. Devolve quantos foram realmente apagados.
pub async fn delete_many(
    db_pool: &SqlitePool,
    ctx: &RequestContext,
    delete_password: Option<&str>,
    raw_ids: &[Value],
    senha: &str,
) -> AppResult<u64> {
    ctx.ensure_gestao_mode()?;
    check_delete_password(senha, delete_password)?;

    let ids = parse_ids(raw_ids);
    if ids.is_empty() {
        return Err(AppError::Validation("Nenhum registo selecionado.".to_string()));
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM tutorias WHERE id IN (");
    let mut separated = qb.separated(", ");
    for id in &ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let apagados = qb.build().execute(db_pool).await?.rows_affected();
    tracing::info!(
        "🗑️ {} de {} tutorias selecionadas apagadas por '{}'",
        apagados,
        ids.len(),
        ctx.username
    );
    Ok(apagados)
}

/// Apaga todos os registos. Devolve quantos existiam.
pub async fn delete_all(
    db_pool: &SqlitePool,
    ctx: &RequestContext,
    delete_password: Option<&str>,
    senha: &str,
    confirmacao: &str,
) -> AppResult<u64> {
    ctx.ensure_gestao_mode()?;
    check_delete_password(senha, delete_password)?;
    if confirmacao != CONFIRMACAO_APAGAR_TODAS {
        return Err(AppError::Validation(format!(
            "Digite {} para confirmar.",
            CONFIRMACAO_APAGAR_TODAS
        )));
    }

    let mut tx = db_pool.begin().await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tutorias")
        .fetch_one(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM tutorias").execute(&mut *tx).await?;
    tx.commit().await?;

    tracing::warn!("🧨 Todas as tutorias ({}) apagadas por '{}'", total, ctx.username);
    Ok(total as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::{gestao, professor},
        db::test_pool,
        models::{tutoria::TutoriaPayload, user::Role},
        services::tutoria_service,
    };
    use serde_json::json;

    const SENHA: &str = "apagar-segredo";

    async fn setup(n: usize) -> (SqlitePool, RequestContext, Vec<i64>) {
        let pool = test_pool().await;
        let prof = user_service::create_user(&pool, "ana", "h", Role::Professor).await.unwrap();
        let g = user_service::create_user(&pool, "gestao", "h", Role::Gestao).await.unwrap();
        let mut ids = Vec::new();
        for i in 0..n {
            let payload = TutoriaPayload {
                nome_aluno: format!("Aluno {}", i),
                serie: "9A".into(),
                ..Default::default()
            };
            ids.push(tutoria_service::create(&pool, &professor(prof), &payload).await.unwrap());
        }
        (pool, gestao(g, true), ids)
    }

    async fn count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM tutorias")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[test]
    fn parse_ids_drops_non_numeric_entries() {
        let raw = vec![json!(3), json!("1"), json!(" 2 "), json!("abc"), json!(null), json!(1.5), json!(3)];
        assert_eq!(parse_ids(&raw), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn everything_requires_elevated_mode() {
        let (pool, mut ctx, ids) = setup(1).await;
        ctx.gestao_mode = false;
        assert!(matches!(stamp_all(&pool, &ctx, &Carimbo::default()).await, Err(AppError::Forbidden)));
        assert!(matches!(
            delete_one(&pool, &ctx, Some(SENHA), ids[0], SENHA).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(list_all(&pool, &ctx).await, Err(AppError::Forbidden)));
        assert_eq!(count(&pool).await, 1);
    }

    #[tokio::test]
    async fn stamp_all_is_idempotent() {
        let (pool, ctx, _) = setup(3).await;
        let carimbo = Carimbo {
            resp: " Marta ".into(),
            inst: "EE Bicudo".into(),
            contato: "(11) 4000-0000".into(),
            ..Default::default()
        };

        assert_eq!(stamp_all(&pool, &ctx, &carimbo).await.unwrap(), 3);
        let primeiro: Vec<Carimbo> = list_all(&pool, &ctx).await.unwrap().into_iter().map(|t| t.carimbo).collect();
        assert_eq!(stamp_all(&pool, &ctx, &carimbo).await.unwrap(), 3);
        let segundo: Vec<Carimbo> = list_all(&pool, &ctx).await.unwrap().into_iter().map(|t| t.carimbo).collect();

        assert_eq!(primeiro, segundo);
        assert!(primeiro.iter().all(|c| c.resp == "Marta" && c.texto == "ÊXITO VISTADO"));
    }

    #[tokio::test]
    async fn stamp_one_touches_only_that_record() {
        let (pool, ctx, ids) = setup(2).await;
        let carimbo = Carimbo {
            texto: "VISTO".into(),
            obs: "Acompanhar".into(),
            ..Default::default()
        };
        stamp_one(&pool, &ctx, ids[0], &carimbo).await.unwrap();

        let a = tutoria_service::find(&pool, ids[0]).await.unwrap().unwrap();
        let b = tutoria_service::find(&pool, ids[1]).await.unwrap().unwrap();
        assert_eq!(a.carimbo().texto, "VISTO");
        assert_eq!(a.carimbo().obs, "Acompanhar");
        assert!(b.carimbo().is_blank());

        assert!(matches!(stamp_one(&pool, &ctx, 999, &carimbo).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn delete_one_checks_password_then_existence() {
        let (pool, ctx, ids) = setup(1).await;
        assert!(matches!(
            delete_one(&pool, &ctx, Some(SENHA), ids[0], "errada").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            delete_one(&pool, &ctx, None, ids[0], "").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            delete_one(&pool, &ctx, Some(SENHA), 999, SENHA).await,
            Err(AppError::NotFound)
        ));
        delete_one(&pool, &ctx, Some(SENHA), ids[0], SENHA).await.unwrap();
        assert_eq!(count(&pool).await, 0);
    }

    #[tokio::test]
    async fn delete_many_reports_only_existing_ids() {
        let (pool, ctx, ids) = setup(3).await;
        assert_eq!(ids, vec![1, 2, 3]);

        let raw = vec![json!(1), json!(2), json!(999)];
        assert_eq!(delete_many(&pool, &ctx, Some(SENHA), &raw, SENHA).await.unwrap(), 2);
        assert_eq!(count(&pool).await, 1);
        assert!(tutoria_service::find(&pool, 3).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_many_ignores_garbage_but_needs_one_id() {
        let (pool, ctx, _) = setup(2).await;
        let raw = vec![json!("x"), json!(null), json!("2")];
        assert_eq!(delete_many(&pool, &ctx, Some(SENHA), &raw, SENHA).await.unwrap(), 1);

        let raw = vec![json!("x"), json!({})];
        assert!(matches!(
            delete_many(&pool, &ctx, Some(SENHA), &raw, SENHA).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            delete_many(&pool, &ctx, Some(SENHA), &[json!(1)], "errada").await,
            Err(AppError::Unauthorized)
        ));
        assert_eq!(count(&pool).await, 1);
    }

    #[tokio::test]
    async fn delete_all_needs_exact_confirmation() {
        let (pool, ctx, _) = setup(4).await;
        for token in ["apagar_todas", "APAGAR TODAS", "", " APAGAR_TODAS", "DELETE_ALL"] {
            assert!(matches!(
                delete_all(&pool, &ctx, Some(SENHA), SENHA, token).await,
                Err(AppError::Validation(_))
            ));
            assert_eq!(count(&pool).await, 4);
        }
        assert!(matches!(
            delete_all(&pool, &ctx, Some(SENHA), "errada", CONFIRMACAO_APAGAR_TODAS).await,
            Err(AppError::Unauthorized)
        ));

        let apagados = delete_all(&pool, &ctx, Some(SENHA), SENHA, CONFIRMACAO_APAGAR_TODAS)
            .await
            .unwrap();
        assert_eq!(apagados, 4);
        assert_eq!(count(&pool).await, 0);
    }

    #[tokio::test]
    async fn export_lists_professores_and_parsed_records() {
        let (pool, ctx, _) = setup(1).await;
        let profs = list_professores(&pool, &ctx).await.unwrap();
        assert_eq!(profs.len(), 2);
        assert_eq!(profs[0].username, "ana");

        let export = list_all(&pool, &ctx).await.unwrap();
        assert_eq!(export.len(), 1);
        assert!(export[0].contatos_extra.is_empty());
        assert!(export[0].ocorrencias.is_empty());
    }
}
