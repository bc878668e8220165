pub mod configuration;
pub mod email;
pub mod error;
pub mod middleware;
pub mod models;
pub mod orchestrator;
pub mod routes;
pub mod security;
pub mod session;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod validators;
