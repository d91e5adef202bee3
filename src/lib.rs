pub mod config;
pub mod errors;
pub mod services;
pub mod sources;
pub mod utils;
