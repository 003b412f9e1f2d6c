// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod gopher;
pub mod rating;

pub use gopher::*;
pub use rating::*;
