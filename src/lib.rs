pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod output;
pub mod prepare;
pub mod records;
pub mod summary;
