// src/lib.rs
pub mod config;
pub mod errors;
pub mod backend;
pub mod models;
pub mod progress;
pub mod view;
pub mod render;
pub mod session;
pub mod banner;
