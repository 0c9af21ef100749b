//! フレーム送信（SessionSink）の実装
//!
//! - `tcp`: TCP ソケットへの書き込み

pub mod tcp;

pub use tcp::TcpSessionSink;
