pub mod agent;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod init;
pub mod llm;
pub mod models;
pub mod repository;
pub mod tools;

pub use error::AgntError;
