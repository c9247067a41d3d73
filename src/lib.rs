pub mod cli;
pub mod comparison;
pub mod config;
pub mod notice;
pub mod run;
pub mod server;
pub mod service;
pub mod source;
pub mod tools;
pub mod types;

pub use cli::CliOptions;
pub use config::Config;
pub use server::ReconServer;
