pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod relay;
pub mod routes;
pub mod state;
