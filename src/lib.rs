pub mod cli;
pub mod client;
pub mod config;
pub mod display;
pub mod doctor;
pub mod error;
pub mod export;
pub mod image;
pub mod workflow;
