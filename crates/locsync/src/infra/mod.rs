//! Infrastructure adapters: host capabilities, documents, config, notices.

pub mod config;
pub mod document;
pub mod host;
pub mod notify;
