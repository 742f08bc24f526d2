//! Jotter is a small self-hosted notes service: a REST API over SQLite
//! with token-based auth and a built-in single-page web client.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod server;
