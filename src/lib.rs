pub mod access;
pub mod cli;
pub mod config;
pub mod lifecycle;
pub mod notify;
pub mod player;
pub mod registration;
pub mod stub;
pub mod telemetry;
