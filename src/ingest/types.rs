// src/ingest/types.rs
use anyhow::Result;

use crate::types::RawEntry;

#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawEntry>>;
    fn name(&self) -> &str;
}
