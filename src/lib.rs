pub mod config;
pub mod error;
pub mod grid;
pub mod structure;
pub mod utils;
pub mod vocabulary;
pub mod zev;
