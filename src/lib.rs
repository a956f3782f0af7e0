pub mod config;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod mongo;
pub mod observability;
pub mod openapi;
pub mod query;
pub mod routes;
pub mod state;
pub mod store;
