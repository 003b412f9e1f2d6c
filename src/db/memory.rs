// src/db/memory.rs
// DOCUMENTATION: In-memory GopherStore
// PURPOSE: Backend for tests and for running without a database

use crate::db::GopherStore;
use crate::errors::GopherError;
use crate::models::{ContentHash, Gopher, Rating};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Thread-safe map-backed store
/// DOCUMENTATION: BTreeMap keeps gophers ordered by hash so `list` pages
/// the same way the relational backend does
#[derive(Default)]
pub struct MemoryGopherStore {
    gophers: RwLock<BTreeMap<ContentHash, Vec<u8>>>,
    ratings: RwLock<HashMap<ContentHash, Vec<Rating>>>,
}

impl MemoryGopherStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GopherStore for MemoryGopherStore {
    async fn save(&self, gopher: &Gopher) -> Result<(), GopherError> {
        let mut gophers = self.gophers.write().await;
        gophers
            .entry(gopher.hash())
            .or_insert_with(|| gopher.raw().to_vec());
        Ok(())
    }

    async fn load(&self, hash: &ContentHash) -> Result<Option<Gopher>, GopherError> {
        let gophers = self.gophers.read().await;
        Ok(gophers.get(hash).map(|raw| Gopher::new(raw.clone())))
    }

    async fn list(&self, start: u32, count: u32) -> Result<Vec<ContentHash>, GopherError> {
        let gophers = self.gophers.read().await;
        Ok(gophers
            .keys()
            .skip(start as usize)
            .take(count as usize)
            .copied()
            .collect())
    }

    async fn count(&self) -> Result<i64, GopherError> {
        let gophers = self.gophers.read().await;
        Ok(gophers.len() as i64)
    }

    async fn rating(&self, hash: &ContentHash) -> Result<Rating, GopherError> {
        let ratings = self.ratings.read().await;
        Ok(ratings
            .get(hash)
            .map(|rows| Rating::average(rows))
            .unwrap_or(Rating::NONE))
    }

    async fn rate(&self, hash: &ContentHash, rating: i64) -> Result<(), GopherError> {
        let rating = Rating::new(rating)?;
        let mut ratings = self.ratings.write().await;
        ratings.entry(*hash).or_default().push(rating);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemoryGopherStore::new();
        let gopher = Gopher::new(b"\x89PNG\r\n\x1a\ngopher".to_vec());

        store.save(&gopher).await.unwrap();
        let loaded = store.load(&gopher.hash()).await.unwrap();

        assert_eq!(loaded, Some(gopher));
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let store = MemoryGopherStore::new();
        let loaded = store.load(&ContentHash::of(b"nobody")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_save_is_idempotent() {
        let store = MemoryGopherStore::new();
        let gopher = Gopher::new(b"twice".to_vec());

        store.save(&gopher).await.unwrap();
        store.save(&gopher).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_is_ordered_and_paged() {
        let store = MemoryGopherStore::new();
        for i in 0u8..10 {
            store.save(&Gopher::new(vec![i])).await.unwrap();
        }

        let all = store.list(0, 200).await.unwrap();
        assert_eq!(all.len(), 10);
        assert!(all.windows(2).all(|w| w[0] < w[1]));

        let page = store.list(3, 4).await.unwrap();
        assert_eq!(page, all[3..7].to_vec());

        assert!(store.list(10, 5).await.unwrap().is_empty());
    }

    #[test]
    fn test_ratings_average() {
        let store = MemoryGopherStore::new();
        let hash = ContentHash::of(b"rated");

        tokio_test::block_on(async {
            assert_eq!(store.rating(&hash).await.unwrap(), Rating::NONE);

            store.rate(&hash, 1).await.unwrap();
            store.rate(&hash, 5).await.unwrap();
            assert_eq!(store.rating(&hash).await.unwrap(), Rating::THREE);
        });
    }

    #[test]
    fn test_rate_rejects_out_of_range() {
        let store = MemoryGopherStore::new();
        let hash = ContentHash::of(b"rated");

        tokio_test::block_on(async {
            let err = store.rate(&hash, 6).await.unwrap_err();
            assert!(matches!(err, GopherError::ValidationError(_)));
            assert!(store.rate(&hash, -1).await.is_err());
            assert_eq!(store.rating(&hash).await.unwrap(), Rating::NONE);
        });
    }
}
