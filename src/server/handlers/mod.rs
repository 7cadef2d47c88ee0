pub mod admin;
pub mod agent;
pub mod chat;
pub mod config;
pub mod documents;
pub mod health;
