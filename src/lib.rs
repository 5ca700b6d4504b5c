// Library exports for Rollbook
// This allows integration tests and external code to use Rollbook modules

pub mod auth;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
