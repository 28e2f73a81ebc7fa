// src/services/tutoria_service.rs
//
// Ciclo de vida dos registos de tutoria: criar, abrir para edição
// (ou duplicar), atualizar, "salvar como nova", apagar e listar.
use crate::{
    context::RequestContext,
    error::{AppError, AppResult},
    models::tutoria::{FormRecord, Tutoria, TutoriaFields, TutoriaPayload, UpdateMode, UpdateOutcome},
};
use chrono::{NaiveDateTime, Utc};
use sqlx::SqlitePool;

pub(crate) const TUTORIA_COLUMNS: &str = "id, professor_id, tutor_nome, nome_aluno, serie, \
    tel_aluno, tel_resp, contatos_extra, projeto_vida, descricoes, ocorrencias, assinatura, \
    carimbo_resp, carimbo_inst, carimbo_contato, carimbo_texto, carimbo_obs, \
    criado_em, atualizado_em";

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Busca um registo sem verificar permissões.
pub async fn find(db_pool: &SqlitePool, id: i64) -> AppResult<Option<Tutoria>> {
    let tutoria = sqlx::query_as::<_, Tutoria>(&format!(
        "SELECT {} FROM tutorias WHERE id = ?1",
        TUTORIA_COLUMNS
    ))
    .bind(id)
    .fetch_optional(db_pool)
    .await?;
    Ok(tutoria)
}

/// Busca o registo e aplica a regra de dono: `NotFound` e depois `Forbidden`.
pub async fn find_accessible(
    db_pool: &SqlitePool,
    ctx: &RequestContext,
    id: i64,
) -> AppResult<Tutoria> {
    let tutoria = find(db_pool, id).await?.ok_or(AppError::NotFound)?;
    ctx.ensure_access(tutoria.professor_id)?;
    Ok(tutoria)
}

async fn insert(
    db_pool: &SqlitePool,
    professor_id: i64,
    fields: &TutoriaFields,
) -> AppResult<i64> {
    let agora = now();
    let id = sqlx::query(
        r#"
        INSERT INTO tutorias (
            professor_id, tutor_nome, nome_aluno, serie, tel_aluno, tel_resp,
            contatos_extra, projeto_vida, descricoes, ocorrencias, assinatura,
            criado_em, atualizado_em
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
        "#,
    )
    .bind(professor_id)
    .bind(&fields.tutor_nome)
    .bind(&fields.nome_aluno)
    .bind(&fields.serie)
    .bind(&fields.tel_aluno)
    .bind(&fields.tel_resp)
    .bind(&fields.contatos_extra)
    .bind(&fields.projeto_vida)
    .bind(&fields.descricoes)
    .bind(&fields.ocorrencias)
    .bind(&fields.assinatura)
    .bind(agora)
    .execute(db_pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

/// Cria um registo em nome de quem faz o pedido.
pub async fn create(
    db_pool: &SqlitePool,
    ctx: &RequestContext,
    payload: &TutoriaPayload,
) -> AppResult<i64> {
    let fields = payload.to_fields();
    let id = insert(db_pool, ctx.user_id, &fields).await?;
    tracing::info!("✅ Tutoria {} criada por '{}'", id, ctx.username);
    Ok(id)
}

/// Abre um registo para o formulário. Em modo duplicar devolve um rascunho
/// sem id nem datas, que leva também a assinatura.
pub async fn load_for_edit(
    db_pool: &SqlitePool,
    ctx: &RequestContext,
    id: i64,
    duplicate: bool,
) -> AppResult<FormRecord> {
    let tutoria = find_accessible(db_pool, ctx, id).await?;
    if duplicate {
        tracing::debug!("Rascunho de duplicação da tutoria {}", id);
        Ok(FormRecord::Draft(tutoria.to_draft()))
    } else {
        Ok(FormRecord::Existing(tutoria))
    }
}

fn validate(fields: &TutoriaFields) -> AppResult<()> {
    if fields.nome_aluno.is_empty() {
        return Err(AppError::Validation("Informe o nome do aluno.".to_string()));
    }
    if fields.serie.is_empty() {
        return Err(AppError::Validation("Informe a série.".to_string()));
    }
    Ok(())
}

/// Atualiza um registo existente ou, em `UpdateMode::Nova`, cria outro a partir
/// dos valores enviados.
pub async fn update(
    db_pool: &SqlitePool,
    ctx: &RequestContext,
    id: i64,
    payload: &TutoriaPayload,
) -> AppResult<UpdateOutcome> {
    let original = find_accessible(db_pool, ctx, id).await?;
    let fields = payload.to_fields();
    validate(&fields)?;

    match payload.modo {
        UpdateMode::Padrao => {
            // atualizado_em nunca recua, mesmo com o relógio a andar para trás
            let atualizado_em = now().max(original.atualizado_em);
            sqlx::query(
                r#"
                UPDATE tutorias SET
                    tutor_nome = ?1,
                    nome_aluno = ?2,
                    serie = ?3,
                    tel_aluno = ?4,
                    tel_resp = ?5,
                    contatos_extra = ?6,
                    projeto_vida = ?7,
                    descricoes = ?8,
                    ocorrencias = ?9,
                    atualizado_em = ?10
                    -- assinatura, professor_id e carimbo ficam como estão
                WHERE id = ?11
                "#,
            )
            .bind(&fields.tutor_nome)
            .bind(&fields.nome_aluno)
            .bind(&fields.serie)
            .bind(&fields.tel_aluno)
            .bind(&fields.tel_resp)
            .bind(&fields.contatos_extra)
            .bind(&fields.projeto_vida)
            .bind(&fields.descricoes)
            .bind(&fields.ocorrencias)
            .bind(atualizado_em)
            .bind(id)
            .execute(db_pool)
            .await?;
            tracing::info!("✅ Tutoria {} atualizada por '{}'", id, ctx.username);
            Ok(UpdateOutcome::Updated(id))
        }
        UpdateMode::Nova => {
            if fields.assinatura.is_empty() {
                return Err(AppError::Validation(
                    "Uma nova tutoria exige uma nova assinatura.".to_string(),
                ));
            }
            // O novo registo pertence ao dono do original, não a quem salvou
            let new_id = insert(db_pool, original.professor_id, &fields).await?;
            tracing::info!(
                "✅ Tutoria {} salva como nova ({}) por '{}'",
                id,
                new_id,
                ctx.username
            );
            Ok(UpdateOutcome::Created(new_id))
        }
    }
}

pub async fn delete(db_pool: &SqlitePool, ctx: &RequestContext, id: i64) -> AppResult<()> {
    find_accessible(db_pool, ctx, id).await?;
    sqlx::query("DELETE FROM tutorias WHERE id = ?1")
        .bind(id)
        .execute(db_pool)
        .await?;
    tracing::info!("🗑️ Tutoria {} apagada por '{}'", id, ctx.username);
    Ok(())
}

/// Gestão vê tudo; professor vê só os seus. Mais recentes primeiro.
pub async fn list(db_pool: &SqlitePool, ctx: &RequestContext) -> AppResult<Vec<Tutoria>> {
    let tutorias = if ctx.is_gestao() {
        sqlx::query_as::<_, Tutoria>(&format!(
            "SELECT {} FROM tutorias ORDER BY criado_em DESC, id DESC",
            TUTORIA_COLUMNS
        ))
        .fetch_all(db_pool)
        .await?
    } else {
        sqlx::query_as::<_, Tutoria>(&format!(
            "SELECT {} FROM tutorias WHERE professor_id = ?1 ORDER BY criado_em DESC, id DESC",
            TUTORIA_COLUMNS
        ))
        .bind(ctx.user_id)
        .fetch_all(db_pool)
        .await?
    };
    tracing::debug!("'{}' lista {} tutorias", ctx.username, tutorias.len());
    Ok(tutorias)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::{gestao, professor},
        db::test_pool,
        models::{
            tutoria::{Contato, FormRecord},
            user::Role,
        },
        services::user_service,
    };

    const ASSINATURA: &str = "data:image/png;base64,AAAA";

    struct Fixture {
        pool: SqlitePool,
        prof_a: RequestContext,
        prof_b: RequestContext,
        admin: RequestContext,
    }

    async fn fixture() -> Fixture {
        let pool = test_pool().await;
        let a = user_service::create_user(&pool, "ana", "h", Role::Professor).await.unwrap();
        let b = user_service::create_user(&pool, "beto", "h", Role::Professor).await.unwrap();
        let g = user_service::create_user(&pool, "gestao", "h", Role::Gestao).await.unwrap();
        Fixture {
            pool,
            prof_a: professor(a),
            prof_b: professor(b),
            admin: gestao(g, false),
        }
    }

    fn payload(nome: &str) -> TutoriaPayload {
        TutoriaPayload {
            nome_aluno: nome.to_string(),
            serie: "7A".to_string(),
            tel_aluno: "11 90000-0000".to_string(),
            contatos_extra: vec![Contato {
                nome: "Mãe".into(),
                telefone: "11 91111-1111".into(),
            }],
            projeto_vida: "Ser engenheira".to_string(),
            descricoes: "Conversa inicial".to_string(),
            ocorrencias: vec!["Pessoal".into(), "Familia".into()],
            assinatura: ASSINATURA.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_trims_and_sets_owner() {
        let f = fixture().await;
        let mut p = payload("  Clara  ");
        p.serie = " 8B ".into();
        let id = create(&f.pool, &f.prof_a, &p).await.unwrap();

        let t = find(&f.pool, id).await.unwrap().unwrap();
        assert_eq!(t.professor_id, f.prof_a.user_id);
        assert_eq!(t.nome_aluno, "Clara");
        assert_eq!(t.serie, "8B");
        assert_eq!(t.tags(), vec!["Pessoal", "Familia"]);
        assert_eq!(t.contatos().len(), 1);
        assert_eq!(t.assinatura(), ASSINATURA);
        assert_eq!(t.criado_em, t.atualizado_em);
    }

    #[tokio::test]
    async fn standard_update_never_touches_signature() {
        let f = fixture().await;
        let id = create(&f.pool, &f.prof_a, &payload("Clara")).await.unwrap();

        let mut p = payload("Clara Souza");
        p.assinatura = "data:image/png;base64,OUTRA".into();
        let outcome = update(&f.pool, &f.prof_a, id, &p).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated(id));

        let mut p = payload("Clara Souza");
        p.assinatura = String::new();
        update(&f.pool, &f.prof_a, id, &p).await.unwrap();

        let t = find(&f.pool, id).await.unwrap().unwrap();
        assert_eq!(t.nome_aluno, "Clara Souza");
        assert_eq!(t.assinatura(), ASSINATURA);
        assert!(t.atualizado_em >= t.criado_em);
    }

    #[tokio::test]
    async fn updated_at_never_goes_backwards() {
        let f = fixture().await;
        let id = create(&f.pool, &f.prof_a, &payload("Clara")).await.unwrap();
        let futuro = Utc::now().naive_utc() + chrono::Duration::days(1);
        sqlx::query("UPDATE tutorias SET atualizado_em = ?1 WHERE id = ?2")
            .bind(futuro)
            .bind(id)
            .execute(&f.pool)
            .await
            .unwrap();

        update(&f.pool, &f.prof_a, id, &payload("Clara")).await.unwrap();
        let t = find(&f.pool, id).await.unwrap().unwrap();
        assert_eq!(t.atualizado_em, futuro);
    }

    #[tokio::test]
    async fn standard_update_keeps_stamp() {
        let f = fixture().await;
        let id = create(&f.pool, &f.prof_a, &payload("Clara")).await.unwrap();
        sqlx::query("UPDATE tutorias SET carimbo_resp = 'Diretora' WHERE id = ?1")
            .bind(id)
            .execute(&f.pool)
            .await
            .unwrap();
        update(&f.pool, &f.prof_a, id, &payload("Clara")).await.unwrap();
        let t = find(&f.pool, id).await.unwrap().unwrap();
        assert_eq!(t.carimbo().resp, "Diretora");
    }

    #[tokio::test]
    async fn blank_required_fields_are_rejected() {
        let f = fixture().await;
        let id = create(&f.pool, &f.prof_a, &payload("Clara")).await.unwrap();

        let err = update(&f.pool, &f.prof_a, id, &payload("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut p = payload("Clara");
        p.serie = " ".into();
        let err = update(&f.pool, &f.prof_a, id, &p).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn save_as_new_requires_signature() {
        let f = fixture().await;
        let id = create(&f.pool, &f.prof_a, &payload("Clara")).await.unwrap();

        let mut p = payload("Clara");
        p.modo = UpdateMode::Nova;
        p.assinatura = "   ".into();
        let err = update(&f.pool, &f.prof_a, id, &p).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(list(&f.pool, &f.prof_a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_as_new_forks_for_original_owner() {
        let f = fixture().await;
        let id = create(&f.pool, &f.prof_a, &payload("Clara")).await.unwrap();
        let antes = find(&f.pool, id).await.unwrap().unwrap();

        let mut p = payload("Clara (2º semestre)");
        p.modo = UpdateMode::Nova;
        p.assinatura = "data:image/png;base64,NOVA".into();
        // Gestão faz o fork de um registo da professora Ana
        let outcome = update(&f.pool, &f.admin, id, &p).await.unwrap();
        let UpdateOutcome::Created(new_id) = outcome else {
            panic!("esperava um novo registo, veio {:?}", outcome);
        };
        assert_ne!(new_id, id);

        let novo = find(&f.pool, new_id).await.unwrap().unwrap();
        assert_eq!(novo.professor_id, f.prof_a.user_id);
        assert_eq!(novo.nome_aluno, "Clara (2º semestre)");
        assert_eq!(novo.assinatura(), "data:image/png;base64,NOVA");
        assert!(novo.carimbo().is_blank());

        let depois = find(&f.pool, id).await.unwrap().unwrap();
        assert_eq!(depois.nome_aluno, antes.nome_aluno);
        assert_eq!(depois.assinatura, antes.assinatura);
        assert_eq!(depois.contatos_extra, antes.contatos_extra);
        assert_eq!(depois.atualizado_em, antes.atualizado_em);
    }

    #[tokio::test]
    async fn duplicate_draft_carries_signature_without_identity() {
        let f = fixture().await;
        let id = create(&f.pool, &f.prof_a, &payload("Clara")).await.unwrap();

        match load_for_edit(&f.pool, &f.prof_a, id, true).await.unwrap() {
            FormRecord::Draft(draft) => {
                assert_eq!(draft.nome_aluno, "Clara");
                assert_eq!(draft.assinatura, ASSINATURA);
                assert_eq!(draft.ocorrencias, vec!["Pessoal", "Familia"]);
            }
            other => panic!("esperava rascunho, veio {:?}", other),
        }
        assert!(matches!(
            load_for_edit(&f.pool, &f.prof_a, id, false).await.unwrap(),
            FormRecord::Existing(t) if t.id == id
        ));
        // Duplicar não grava nada
        assert_eq!(list(&f.pool, &f.prof_a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn other_teachers_are_forbidden_and_admin_is_not() {
        let f = fixture().await;
        let id = create(&f.pool, &f.prof_a, &payload("Clara")).await.unwrap();

        assert!(matches!(
            load_for_edit(&f.pool, &f.prof_b, id, false).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            update(&f.pool, &f.prof_b, id, &payload("X")).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(delete(&f.pool, &f.prof_b, id).await, Err(AppError::Forbidden)));

        assert!(load_for_edit(&f.pool, &f.admin, id, false).await.is_ok());
        assert!(update(&f.pool, &f.admin, id, &payload("Clara G")).await.is_ok());
        assert!(delete(&f.pool, &f.admin, id).await.is_ok());
        assert!(find(&f.pool, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let f = fixture().await;
        assert!(matches!(
            load_for_edit(&f.pool, &f.admin, 404, false).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            update(&f.pool, &f.prof_a, 404, &payload("X")).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(delete(&f.pool, &f.prof_a, 404).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn list_is_scoped_and_newest_first() {
        let f = fixture().await;
        let a1 = create(&f.pool, &f.prof_a, &payload("A1")).await.unwrap();
        let b1 = create(&f.pool, &f.prof_b, &payload("B1")).await.unwrap();
        let a2 = create(&f.pool, &f.prof_a, &payload("A2")).await.unwrap();

        let ids: Vec<i64> = list(&f.pool, &f.prof_a).await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a2, a1]);

        let ids: Vec<i64> = list(&f.pool, &f.admin).await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a2, b1, a1]);
    }
}
