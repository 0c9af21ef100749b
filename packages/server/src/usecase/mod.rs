//! UseCase layer: relay operations built on the domain interfaces.

pub mod broadcast;
pub mod connect_session;
pub mod disconnect_session;
pub mod dispatch;
pub mod error;
pub mod receive_file;
pub mod refresh_user_list;
pub mod send_chat;
pub mod update_nickname;

pub use broadcast::{BroadcastEngine, BroadcastReport};
pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{BroadcastError, DispatchError, FileIntakeError};
pub use receive_file::{FileReceipt, ReceiveFileUseCase};
pub use refresh_user_list::RefreshUserListUseCase;
pub use send_chat::SendChatUseCase;
pub use update_nickname::UpdateNicknameUseCase;
