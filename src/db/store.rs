// src/db/store.rs
// DOCUMENTATION: Storage contract for gopher pictures and their ratings
// PURPOSE: Let handlers run against PostgreSQL or memory interchangeably

use crate::errors::GopherError;
use crate::models::{ContentHash, Gopher, Rating};
use async_trait::async_trait;
use std::sync::Arc;

/// Shared handle to whichever backend the application was started with
pub type Storer = Arc<dyn GopherStore>;

/// Persistence operations for gophers
/// DOCUMENTATION: Every method is a single round trip to the backend.
/// Dropping a returned future abandons the call.
#[async_trait]
pub trait GopherStore: Send + Sync {
    /// Persist a new gopher; storing the same content twice succeeds
    async fn save(&self, gopher: &Gopher) -> Result<(), GopherError>;

    /// Fetch a gopher by hash, `None` if there is no such gopher
    async fn load(&self, hash: &ContentHash) -> Result<Option<Gopher>, GopherError>;

    /// Up to `count` hashes starting at offset `start`, ascending
    async fn list(&self, start: u32, count: u32) -> Result<Vec<ContentHash>, GopherError>;

    /// Total number of stored gophers
    async fn count(&self) -> Result<i64, GopherError>;

    /// Average of all ratings given to `hash`, `Rating::NONE` if unrated
    async fn rating(&self, hash: &ContentHash) -> Result<Rating, GopherError>;

    /// Record one more rating; values outside 0..=5 are rejected
    async fn rate(&self, hash: &ContentHash, rating: i64) -> Result<(), GopherError>;
}
