pub mod article;
pub mod config;
pub mod i18n;
pub mod location;
pub mod server;
pub mod stats;
pub mod storage;
pub mod store;
pub mod translation;
pub mod translation_cache;
