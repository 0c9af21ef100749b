//! SessionRegistry trait 定義
//!
//! 「誰が接続しているか」の唯一の情報源となるレジストリのインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::sync::Arc;

use async_trait::async_trait;

use super::{Session, SessionKey, SessionSink};

/// Session Registry trait
///
/// 全ての操作は互いに排他的に実行されること。
/// `snapshot` は削除途中のエントリを観測しない。
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// セッションを登録（同じキーが既にあれば置き換える）
    async fn register(&self, key: SessionKey, sink: Arc<dyn SessionSink>) -> Session;

    /// ニックネームを更新。セッションが存在しなければ `false`
    async fn update_nickname(&self, key: &SessionKey, nickname: String) -> bool;

    /// 最終受信時刻を更新。セッションが存在しなければ `false`
    async fn touch(&self, key: &SessionKey) -> bool;

    /// セッションを削除（冪等）
    async fn remove(&self, key: &SessionKey) -> Option<Session>;

    /// セッションを取得
    async fn get(&self, key: &SessionKey) -> Option<Session>;

    /// 現時点のセッション一覧のコピー
    async fn snapshot(&self) -> Vec<Session>;

    /// 接続中のセッション数
    async fn count(&self) -> usize;
}
