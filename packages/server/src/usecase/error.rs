//! UseCase 層のエラー定義

use lanrelay_shared::protocol::ProtocolError;
use thiserror::Error;

use crate::domain::DeliveryError;

/// ブロードキャスト（ユニキャスト含む）のエラー
///
/// 個々のセッションへの送信失敗はエラーではなく切断として扱うため、
/// ここに現れるのはフレームを作れなかった場合のみ。
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("failed to encode '{kind}' frame: {source}")]
    Encode {
        kind: &'static str,
        #[source]
        source: ProtocolError,
    },
}

/// ファイル受信のエラー
#[derive(Debug, Error)]
pub enum FileIntakeError {
    #[error("failed to acknowledge file header: {0}")]
    Ack(#[source] DeliveryError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

/// ディスパッチのエラー
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error(transparent)]
    FileIntake(#[from] FileIntakeError),
}
