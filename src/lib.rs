pub mod auth;
pub mod config;
pub mod crypto;
pub mod dates;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod push;
pub mod routes;
pub mod schema;
pub mod state;
pub mod storage;
pub mod workflow;
