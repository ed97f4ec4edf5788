pub mod models;
pub mod error;
pub mod merge;
pub mod api;
pub mod catalog;
pub mod analytics;
pub mod config;
pub mod charts;
