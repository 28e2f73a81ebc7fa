pub mod auth_service;
pub mod gestao_service;
pub mod tutoria_service;
pub mod user_service;
