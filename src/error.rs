// src/error.rs
use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de variável de ambiente: {0}")]
    EnvVarError(#[from] std::env::VarError),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    #[error("Erro interno inesperado")]
    InternalServerError,

    // Registo ou utilizador inexistente
    #[error("Não encontrado")]
    NotFound,

    // Papel/dono não permite a operação
    #[error("Acesso negado")]
    Forbidden,

    // Sem sessão ou credencial de exclusão inválida
    #[error("Não autorizado")]
    Unauthorized,

    // Recuperável: o chamador corrige e reenvia
    #[error("Dados inválidos: {0}")]
    Validation(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Corpo JSON recusado: {}", rejection.body_text());
        AppError::Validation("Corpo do pedido inválido.".to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Mensagem segura para o utilizador (sem detalhes internos).
    pub fn user_message(&self) -> String {
        match self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => {
                "Erro ao aceder aos dados.".to_string()
            }
            AppError::EnvVarError(_) => "Erro de configuração.".to_string(),
            AppError::PasswordHashingError => "Erro ao processar credenciais.".to_string(),
            AppError::SessionError(_) => "Erro na gestão da sua sessão.".to_string(),
            AppError::NotFound => "Registo não encontrado.".to_string(),
            AppError::Forbidden => "Sem permissão para esta ação.".to_string(),
            AppError::Unauthorized => "Não autorizado.".to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::InternalServerError => "Ocorreu um erro inesperado.".to_string(),
        }
    }
}

// Como converter AppError numa resposta HTTP
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        // Erros de cliente são esperados; só os 5xx vão para error!
        if status.is_server_error() {
            tracing::error!("Erro processado: {:?}", self);
        } else {
            tracing::warn!("Pedido recusado ({}): {:?}", status.as_u16(), self);
        }

        (status, Json(json!({ "ok": false, "error": self.user_message() }))).into_response()
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;
