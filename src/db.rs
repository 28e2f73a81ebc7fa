// src/db.rs
use crate::{
    config::AppConfig,
    error::AppResult,
    models::user::Role,
    services::{auth_service, user_service},
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

/// Colunas que bases criadas por versões antigas podem não ter.
const TUTORIA_COLUMNS: &[(&str, &str)] = &[
    ("tutor_nome", "TEXT"),
    ("tel_resp", "TEXT"),
    ("contatos_extra", "TEXT"),
    ("assinatura", "TEXT"),
    ("carimbo_resp", "TEXT"),
    ("carimbo_inst", "TEXT"),
    ("carimbo_contato", "TEXT"),
    ("carimbo_texto", "TEXT"),
    ("carimbo_obs", "TEXT"),
];

pub async fn create_db_pool(database_url: &str) -> AppResult<SqlitePool> {
    tracing::info!("Ligando à base de dados: {}", database_url);

    // Opções de conexão (criar se não existir, timeout)
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> AppResult<()> {
    tracing::info!("Executando migrações da base de dados...");
    sqlx::migrate!("./migrations").run(pool).await?;
    ensure_schema(pool).await?;
    tracing::info!("Migrações concluídas.");
    Ok(())
}

/// Acrescenta à tabela `tutorias` as colunas em falta. Idempotente.
pub async fn ensure_schema(pool: &SqlitePool) -> AppResult<()> {
    let existing: HashSet<String> = sqlx::query("PRAGMA table_info(tutorias)")
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| row.get::<String, _>("name"))
        .collect();

    for (name, kind) in TUTORIA_COLUMNS {
        if !existing.contains(*name) {
            tracing::info!("Adicionando coluna em falta: tutorias.{}", name);
            // Nomes vêm da constante acima, nunca do utilizador
            let sql = format!("ALTER TABLE tutorias ADD COLUMN {} {}", name, kind);
            sqlx::query(&sql).execute(pool).await?;
        }
    }
    Ok(())
}

/// Cria a conta de gestão (e o professor de exemplo, se configurado) caso não existam.
pub async fn ensure_seed(pool: &SqlitePool, config: &AppConfig) -> AppResult<()> {
    if user_service::find_user_by_username(pool, "gestao").await?.is_none() {
        let hash = auth_service::hash_password(&config.admin_password).await?;
        user_service::create_user(pool, "gestao", &hash, Role::Gestao).await?;
        tracing::info!("🌱 Conta 'gestao' criada.");
    }

    if let Some((username, password)) = &config.seed_professor {
        if user_service::find_user_by_username(pool, username).await?.is_none() {
            let hash = auth_service::hash_password(password).await?;
            user_service::create_user(pool, username, &hash, Role::Professor).await?;
            tracing::info!("🌱 Professor '{}' criado.", username);
        }
    }
    Ok(())
}

/// Pool em memória com o esquema completo. Uma só conexão: cada conexão
/// `sqlite::memory:` teria a sua própria base.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("pool em memória");
    run_migrations(&pool).await.expect("migrações");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let pool = test_pool().await;
        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn ensure_schema_upgrades_legacy_table() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        // Tabela como a primeira versão a criava, sem carimbo nem assinatura
        sqlx::query(
            "CREATE TABLE tutorias (id INTEGER PRIMARY KEY, professor_id INTEGER NOT NULL,
             nome_aluno TEXT NOT NULL, serie TEXT NOT NULL, tel_aluno TEXT,
             projeto_vida TEXT, descricoes TEXT, ocorrencias TEXT,
             criado_em DATETIME NOT NULL, atualizado_em DATETIME NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();

        ensure_schema(&pool).await.unwrap();

        let cols: Vec<String> = sqlx::query("PRAGMA table_info(tutorias)")
            .fetch_all(&pool)
            .await
            .unwrap()
            .iter()
            .map(|r| r.get::<String, _>("name"))
            .collect();
        for (name, _) in TUTORIA_COLUMNS {
            assert!(cols.iter().any(|c| c == name), "coluna {} em falta", name);
        }
    }

    #[tokio::test]
    async fn seed_runs_once() {
        let pool = test_pool().await;
        let mut config = AppConfig::for_tests();
        config.admin_password = "x".into();
        config.seed_professor = Some(("renato".into(), "1234".into()));

        ensure_seed(&pool, &config).await.unwrap();
        ensure_seed(&pool, &config).await.unwrap();

        let users = user_service::find_all_users(&pool).await.unwrap();
        assert_eq!(users.len(), 2);
        let gestao = users.iter().find(|u| u.username == "gestao").unwrap();
        assert_eq!(gestao.role(), Role::Gestao);
        let renato = users.iter().find(|u| u.username == "renato").unwrap();
        assert_eq!(renato.role(), Role::Professor);
    }
}
