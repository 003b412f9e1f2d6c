// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod gophers;
pub mod health;

pub use gophers::config as gophers_config;
pub use health::config as health_config;
