pub mod app;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod output;
