//! インメモリ WebOutbox 実装
//!
//! 全ブラウザで共有する 1 本の FIFO。ブラウザが 1 つも接続していない間も
//! 溜まり続けるため、上限を超えたら最も古いエントリを捨てます。

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::WebOutbox;

/// 既定の最大保持件数
pub const DEFAULT_OUTBOX_CAPACITY: usize = 1024;

pub struct InMemoryWebOutbox {
    entries: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl InMemoryWebOutbox {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_OUTBOX_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }
}

impl Default for InMemoryWebOutbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebOutbox for InMemoryWebOutbox {
    async fn push(&self, entry: String) {
        let mut entries = self.entries.lock().await;
        if entries.len() >= self.capacity {
            entries.pop_front();
            tracing::debug!("Web outbox full, dropped the oldest entry");
        }
        entries.push_back(entry);
    }

    async fn pop(&self) -> Option<String> {
        let mut entries = self.entries.lock().await;
        entries.pop_front()
    }

    async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.len()
    }
}
