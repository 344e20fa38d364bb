pub mod balance;
pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
pub mod notify;
pub mod server;
pub mod variants;
