pub mod app;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod import;
pub mod posts;
pub mod state;
pub mod telemetry;
pub mod vocabulary;
