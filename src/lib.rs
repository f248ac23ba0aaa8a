pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod locale;
pub mod middleware;
pub mod routes;
pub mod services;
