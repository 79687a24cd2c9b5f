pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod output;
pub mod session;
pub mod shell;
pub mod toast;
pub mod ui;
pub mod utils;
pub mod views;

#[cfg(test)]
mod tests;
