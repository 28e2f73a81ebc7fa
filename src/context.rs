// src/context.rs
use crate::{
    error::{AppError, AppResult},
    models::user::Role,
};

/// Quem está a fazer o pedido. Montado a partir da sessão pelo middleware
/// e passado explicitamente a cada operação dos serviços.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    /// Modo gestão ligado pelo PIN nesta sessão.
    pub gestao_mode: bool,
}

impl RequestContext {
    pub fn is_gestao(&self) -> bool {
        self.role == Role::Gestao
    }

    /// Gestão acede a tudo; professor só aos próprios registos.
    pub fn can_access(&self, owner_id: i64) -> bool {
        self.is_gestao() || self.user_id == owner_id
    }

    pub fn ensure_access(&self, owner_id: i64) -> AppResult<()> {
        if self.can_access(owner_id) {
            Ok(())
        } else {
            tracing::warn!(
                "Acesso negado: '{}' tentou usar um registo do professor {}",
                self.username,
                owner_id
            );
            Err(AppError::Forbidden)
        }
    }

    pub fn ensure_gestao_mode(&self) -> AppResult<()> {
        if self.gestao_mode {
            Ok(())
        } else {
            tracing::warn!("Modo gestão exigido e não ativo para '{}'", self.username);
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
pub fn professor(user_id: i64) -> RequestContext {
    RequestContext {
        user_id,
        username: format!("prof{}", user_id),
        role: Role::Professor,
        gestao_mode: false,
    }
}

#[cfg(test)]
pub fn gestao(user_id: i64, gestao_mode: bool) -> RequestContext {
    RequestContext {
        user_id,
        username: "gestao".to_string(),
        role: Role::Gestao,
        gestao_mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_rules() {
        assert!(professor(1).can_access(1));
        assert!(!professor(1).can_access(2));
        assert!(gestao(9, false).can_access(2));
        assert!(matches!(professor(1).ensure_access(2), Err(AppError::Forbidden)));
    }

    #[test]
    fn elevated_mode_is_separate_from_role() {
        assert!(gestao(9, false).ensure_gestao_mode().is_err());
        assert!(gestao(9, true).ensure_gestao_mode().is_ok());
        // Um professor com o PIN também entra no painel
        let mut ctx = professor(1);
        ctx.gestao_mode = true;
        assert!(ctx.ensure_gestao_mode().is_ok());
    }
}
