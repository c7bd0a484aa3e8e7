use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{
    db::{DbError, LinksDB},
    models::{NewShortLink, ShortLink},
};

#[derive(Default)]
struct Links {
    next_id: i32,
    by_code: HashMap<String, ShortLink>,
}

/// Process-local store, handy for development and tests. Nothing survives a
/// restart.
#[derive(Default)]
pub struct MemoryDb {
    links: RwLock<Links>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinksDB for MemoryDb {
    async fn create(&self, link: &NewShortLink) -> Result<ShortLink, DbError> {
        let mut links = self.links.write().await;

        if links.by_code.contains_key(&link.short_code) {
            return Err(DbError::DuplicateCode);
        }

        links.next_id += 1;
        let stored = ShortLink::from_new(links.next_id, link);
        links
            .by_code
            .insert(stored.short_code.clone(), stored.clone());

        Ok(stored)
    }

    async fn get(&self, short_code: &str) -> Result<Option<ShortLink>, DbError> {
        Ok(self.links.read().await.by_code.get(short_code).cloned())
    }

    async fn increment_clicks(&self, short_code: &str) -> Result<(), DbError> {
        if let Some(link) = self.links.write().await.by_code.get_mut(short_code) {
            link.clicks = link.clicks.saturating_add(1);
        }
        Ok(())
    }
}
