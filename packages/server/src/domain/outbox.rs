//! WebOutbox trait 定義
//!
//! ブラウザ向けプッシュストリームに配信待ちのメッセージを溜める FIFO。
//! 全ブラウザで 1 つのキューを共有するため、あるストリームが取り出した
//! エントリは他のストリームには届かない。

use async_trait::async_trait;

#[async_trait]
pub trait WebOutbox: Send + Sync {
    /// 末尾に追加
    async fn push(&self, entry: String);

    /// 先頭を取り出す（同じエントリを 2 つの消費者が受け取ることはない）
    async fn pop(&self) -> Option<String>;

    /// 配信待ちの件数
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
