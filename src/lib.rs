pub mod agent;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod preview;
pub mod prompt;
pub mod provider;
pub mod sanitize;
pub mod server;
pub mod session;
pub mod usage;
pub mod ux;
pub mod wire;
