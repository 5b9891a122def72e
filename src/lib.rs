pub mod app;
pub mod browser;
pub mod cli;
pub mod client;
pub mod config;
pub mod criteria;
pub mod filters;
pub mod output;
pub mod render;
pub mod student;

#[cfg(test)]
mod tests;
