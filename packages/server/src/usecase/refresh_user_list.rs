//! UseCase: 名簿の再送（`get_user_list`）

use std::sync::Arc;

use crate::domain::SessionKey;

use super::{broadcast::BroadcastEngine, error::BroadcastError};

/// 要求したセッションにだけ現在の名簿を返すユースケース
pub struct RefreshUserListUseCase {
    broadcast: Arc<BroadcastEngine>,
}

impl RefreshUserListUseCase {
    pub fn new(broadcast: Arc<BroadcastEngine>) -> Self {
        Self { broadcast }
    }

    /// 名簿を返す。届いた場合は `true`
    pub async fn execute(&self, key: SessionKey) -> Result<bool, BroadcastError> {
        let roster = self.broadcast.roster_message().await;
        self.broadcast.unicast(&key, &roster).await
    }
}
