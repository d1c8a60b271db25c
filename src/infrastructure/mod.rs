#[path = "config/mod.rs"]
pub mod config_mod;
pub use config_mod as config;
pub mod csv;
pub mod fetchers;
pub mod security;
pub mod storage;
