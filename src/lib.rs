pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod relations;

#[cfg(test)]
mod testing;
