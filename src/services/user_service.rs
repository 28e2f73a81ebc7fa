// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{Role, User},
};
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;

const USER_COLUMNS: &str = "id, username, password_hash, role, created_at";

/// Busca um utilizador pelo ID.
pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: i64) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por ID: {}", user_id);
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = ?1",
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(user)
}

/// Busca um utilizador pelo nome de login.
pub async fn find_user_by_username(
    db_pool: &SqlitePool,
    username: &str,
) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por username: {}", username);
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = ?1",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(db_pool)
    .await?;
    Ok(user)
}

/// Todos os utilizadores, por ordem alfabética.
pub async fn find_all_users(db_pool: &SqlitePool) -> AppResult<Vec<User>> {
    tracing::debug!("Buscando todos os utilizadores...");
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY username ASC",
        USER_COLUMNS
    ))
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Encontrados {} utilizadores.", users.len());
    Ok(users)
}

/// Mapa id -> username, usado para mostrar o professor de cada registo.
pub async fn usernames_by_id(db_pool: &SqlitePool) -> AppResult<HashMap<i64, String>> {
    Ok(find_all_users(db_pool)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect())
}

/// Insere um utilizador com o hash já calculado. Devolve o novo ID.
pub async fn create_user(
    db_pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    role: Role,
) -> AppResult<i64> {
    tracing::info!("Tentando criar utilizador: {}", username);
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, role, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(Utc::now().naive_utc())
    .execute(db_pool)
    .await;

    // Verifica erro de constraint (username duplicado)
    if let Err(sqlx::Error::Database(db_err)) = &result {
        if db_err.is_unique_violation() {
            tracing::warn!("Falha ao criar user: '{}' já existe.", username);
            return Err(AppError::Validation("Usuário já existe.".to_string()));
        }
    }
    let id = result?.last_insert_rowid();
    tracing::info!("✅ Utilizador '{}' criado com ID {}.", username, id);
    Ok(id)
}
