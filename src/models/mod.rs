// src/models/mod.rs
pub mod tutoria;
pub mod user;
