// src/config.rs
use crate::error::AppResult;
use std::env;

pub const DEFAULT_GESTAO_PIN: &str = "adm123";
const DEFAULT_ADMIN_PASS: &str = "gestao123";

/// Configuração lida do ambiente (e do `.env`) uma única vez no arranque.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub session_secret: String,
    /// PIN partilhado que liga o modo gestão na sessão.
    pub gestao_pin: String,
    /// Segunda senha, exigida por pedido nas ações destrutivas.
    /// Sem valor configurado, todas as exclusões administrativas são recusadas.
    pub delete_password: Option<String>,
    pub admin_password: String,
    pub seed_professor: Option<(String, String)>,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        // Chave de assinatura do cookie de sessão (mínimo 64 bytes)
        let session_secret = env::var("SESSION_SECRET")?;

        let gestao_pin = env::var("GESTAO_PIN").unwrap_or_else(|_| {
            tracing::warn!("⚠️ GESTAO_PIN não definido, a usar o PIN por omissão.");
            DEFAULT_GESTAO_PIN.to_string()
        });

        let delete_password = non_blank(env::var("GESTAO_DELETE_PASS").ok());
        if delete_password.is_none() {
            tracing::warn!("⚠️ GESTAO_DELETE_PASS não definido: exclusões administrativas ficam bloqueadas.");
        }

        let admin_password = env::var("APP_ADMIN_PASS").unwrap_or_else(|_| {
            tracing::warn!("⚠️ APP_ADMIN_PASS não definido, conta 'gestao' usa senha por omissão.");
            DEFAULT_ADMIN_PASS.to_string()
        });

        let seed_professor = match (
            non_blank(env::var("SEED_PROF_USER").ok()),
            non_blank(env::var("SEED_PROF_PASS").ok()),
        ) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://tutorias.db".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            session_secret,
            gestao_pin,
            delete_password,
            admin_password,
            seed_professor,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            session_secret: "x".repeat(64),
            gestao_pin: DEFAULT_GESTAO_PIN.to_string(),
            delete_password: Some("apagar-segredo".to_string()),
            admin_password: DEFAULT_ADMIN_PASS.to_string(),
            seed_professor: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
