pub mod app;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gemini;
pub mod logging;
pub mod profile;
pub mod prompt;
pub mod render;
pub mod repl;
pub mod session;
pub mod storage;
