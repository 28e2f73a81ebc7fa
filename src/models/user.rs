// src/models/user.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Papel de um utilizador: professor (por omissão) ou gestão.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Professor,
    Gestao,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Professor => "professor",
            Role::Gestao => "gestao",
        }
    }

    // Qualquer valor desconhecido na DB cai no papel menos privilegiado
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("gestao") {
            Role::Gestao
        } else {
            Role::Professor
        }
    }
}

// Representa um utilizador lido da tabela 'users'
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }
}

/// Resumo exposto na API de gestão (sem hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

// Struct para dados do formulário de login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// Formulário de auto-registo (cadastro de professor)
#[derive(Debug, Deserialize)]
pub struct CadastroForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_roles_fall_back_to_professor() {
        assert_eq!(Role::parse("gestao"), Role::Gestao);
        assert_eq!(Role::parse(" GESTAO "), Role::Gestao);
        assert_eq!(Role::parse("professor"), Role::Professor);
        assert_eq!(Role::parse("admin"), Role::Professor);
        assert_eq!(Role::parse(""), Role::Professor);
    }
}
