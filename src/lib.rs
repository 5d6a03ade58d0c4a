pub mod app;
pub mod config;
pub mod feed;
pub mod models;
pub mod session;
pub mod text;
pub mod tvmaze;
