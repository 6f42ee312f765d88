pub mod app;
pub mod config;
pub mod error;
pub mod figure;
pub mod process;
