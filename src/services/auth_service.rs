// src/services/auth_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{Role, User},
    services::user_service,
};
use sqlx::SqlitePool;
use subtle::ConstantTimeEq;

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verificando hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Gera um hash bcrypt para uma senha.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt...");
        bcrypt::hash(&password, bcrypt::DEFAULT_COST)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Login: devolve o utilizador se o par username/senha for válido.
pub async fn authenticate(
    db_pool: &SqlitePool,
    username: &str,
    password: &str,
) -> AppResult<Option<User>> {
    let Some(user) = user_service::find_user_by_username(db_pool, username.trim()).await? else {
        tracing::warn!("Utilizador não encontrado: {}", username);
        return Ok(None);
    };
    // Hash corrompido na DB conta como senha errada, não como falha do pedido
    match verify_password(password, &user.password_hash).await {
        Ok(true) => Ok(Some(user)),
        Ok(false) => {
            tracing::warn!("Senha incorreta para: {}", username);
            Ok(None)
        }
        Err(AppError::PasswordHashingError) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Auto-registo de um professor. `Validation` se faltar algo ou o nome já existir.
pub async fn register_professor(
    db_pool: &SqlitePool,
    username: &str,
    password: &str,
) -> AppResult<i64> {
    let username = username.trim();
    let password = password.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation("Informe usuário e senha.".to_string()));
    }
    if user_service::find_user_by_username(db_pool, username).await?.is_some() {
        return Err(AppError::Validation("Usuário já existe.".to_string()));
    }
    let hash = hash_password(password).await?;
    user_service::create_user(db_pool, username, &hash, Role::Professor).await
}

/// Compara dois segredos sem sair cedo no primeiro byte diferente.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).unwrap_u8() == 1
}
