//! Integration tests for the relay client against an in-process relay server.

use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use lanrelay_client::{
    ClientError, RelayConnection, connect,
    incoming::{Incoming, IncomingReader},
};
use lanrelay_server::{
    infrastructure::{
        observer::LogObserver, outbox::InMemoryWebOutbox, registry::InMemorySessionRegistry,
        store::LocalFileStore,
    },
    ui::{AppState, Server},
};
use lanrelay_shared::protocol::Message;
use tempfile::TempDir;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, tcp::OwnedReadHalf},
    sync::mpsc,
    task::JoinHandle,
};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Gap between writes so that each write arrives as its own read on the server
const WRITE_GAP: Duration = Duration::from_millis(100);

/// Helper struct to manage the server lifecycle
struct TestServer {
    tcp_addr: SocketAddr,
    received_dir: TempDir,
    task: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let received_dir = tempfile::tempdir().unwrap();
        let state = Arc::new(AppState::new(
            Arc::new(InMemorySessionRegistry::new()),
            Arc::new(InMemoryWebOutbox::new()),
            Arc::new(LocalFileStore::new(received_dir.path())),
            Arc::new(LogObserver),
        ));
        let bound = Server::new(state)
            .bind("127.0.0.1:0", "127.0.0.1:0")
            .await
            .unwrap();
        let tcp_addr = bound.tcp_addr().unwrap();
        let task = tokio::spawn(async move {
            bound
                .run_until(std::future::pending::<()>())
                .await
                .unwrap();
        });

        TestServer {
            tcp_addr,
            received_dir,
            task,
        }
    }

    async fn connect(&self, nickname: &str) -> RelayConnection {
        let connection = connect(&self.tcp_addr.to_string(), nickname, TIMEOUT)
            .await
            .unwrap();
        tokio::time::sleep(WRITE_GAP).await;
        connection
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Read until a message matching `pred` arrives
async fn wait_for_message<F>(reader: &mut IncomingReader<OwnedReadHalf>, pred: F) -> Message
where
    F: Fn(&Message) -> bool,
{
    tokio::time::timeout(TIMEOUT, async {
        loop {
            match reader.next().await.unwrap() {
                Some(Incoming::Message(message)) if pred(&message) => return message,
                Some(_) => continue,
                None => panic!("server closed the connection"),
            }
        }
    })
    .await
    .expect("timed out waiting for a message")
}

fn roster_has(message: &Message, nickname: &str) -> bool {
    matches!(message, Message::UserList(list) if list.users.iter().any(|u| u.nickname == nickname))
}

async fn wait_for_file(path: &Path, size: u64) -> Vec<u8> {
    tokio::time::timeout(TIMEOUT, async {
        loop {
            if let Ok(contents) = tokio::fs::read(path).await
                && contents.len() as u64 == size
            {
                return contents;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("timed out waiting for the received file")
}

#[tokio::test]
async fn test_handshake_nickname_and_chat() {
    // テスト項目: ハンドシェイク後にニックネームが名簿に載り、チャットが他のクライアントに届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut ann = server.connect("Ann").await;
    assert_eq!(ann.writer.nickname(), "Ann");
    assert_eq!(ann.writer.local_ip(), "127.0.0.1");

    // when (操作):
    ann.writer.send_user_update().await.unwrap();

    // then (期待する結果):
    wait_for_message(&mut ann.reader, |m| roster_has(m, "Ann")).await;

    // when (操作): 2 人目が参加してチャットを送る
    let mut bob = server.connect("Bob").await;
    bob.writer.send_user_update().await.unwrap();
    tokio::time::sleep(WRITE_GAP).await;
    let sent = bob.writer.send_chat("hello from bob").await.unwrap();

    // then (期待する結果):
    assert_eq!(sent.receiver.as_deref(), Some("all"));
    let received = wait_for_message(&mut ann.reader, |m| matches!(m, Message::Chat(_))).await;
    match received {
        Message::Chat(chat) => {
            assert_eq!(chat.nickname, "Bob");
            assert_eq!(chat.content, "hello from bob");
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn test_refresh_request_returns_roster() {
    // テスト項目: /users 相当のリクエストで現在の名簿が返ってくる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut ann = server.connect("Ann").await;
    ann.writer.set_nickname("Annie").await.unwrap();
    tokio::time::sleep(WRITE_GAP).await;

    // when (操作):
    ann.writer.send_refresh_request().await.unwrap();

    // then (期待する結果):
    let roster = wait_for_message(&mut ann.reader, |m| roster_has(m, "Annie")).await;
    assert!(matches!(roster, Message::UserList(list) if list.users.len() == 1));
}

#[tokio::test]
async fn test_send_file_is_stored_by_server() {
    // テスト項目: ACK を待ってから送ったファイルがサーバー側に保存される
    // given (前提条件):
    let server = TestServer::start().await;
    let RelayConnection {
        mut writer,
        mut reader,
        ..
    } = server.connect("Ann").await;

    let (ack_tx, mut ack_rx) = mpsc::unbounded_channel();
    let read_task = tokio::spawn(async move {
        while let Ok(Some(incoming)) = reader.next().await {
            if incoming == Incoming::Ack {
                ack_tx.send(()).ok();
            }
        }
    });

    let source_dir = tempfile::tempdir().unwrap();
    let path = source_dir.path().join("report.bin");
    let contents: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    tokio::fs::write(&path, &contents).await.unwrap();

    // when (操作):
    let meta = writer.send_file(&path, &mut ack_rx).await.unwrap();

    // then (期待する結果):
    assert_eq!(meta.file_name, "report.bin");
    assert_eq!(meta.file_size, 10_000);
    let stored = wait_for_file(&server.received_dir.path().join("report.bin"), 10_000).await;
    assert_eq!(stored, contents);

    read_task.abort();
}

#[tokio::test]
async fn test_send_missing_file_fails_locally() {
    // テスト項目: 存在しないファイルの送信はローカルのエラーになり、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut ann = server.connect("Ann").await;
    let (_ack_tx, mut ack_rx) = mpsc::unbounded_channel();

    // when (操作):
    let result = ann
        .writer
        .send_file(Path::new("/nonexistent/lanrelay/file.txt"), &mut ack_rx)
        .await;

    // then (期待する結果):
    assert!(matches!(result, Err(ClientError::LocalFile { .. })));
    ann.writer.send_user_update().await.unwrap();
    wait_for_message(&mut ann.reader, |m| roster_has(m, "Ann")).await;
}

#[tokio::test]
async fn test_handshake_rejected_by_non_relay_server() {
    // テスト項目: HELO に ACK 以外で応答するサーバーにはハンドシェイク失敗になる
    // given (前提条件):
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 16];
        let _ = stream.read(&mut buf).await;
        stream.write_all(b"NOPE").await.unwrap();
    });

    // when (操作):
    let result = connect(&addr.to_string(), "Ann", TIMEOUT).await;

    // then (期待する結果):
    assert!(matches!(result, Err(ClientError::HandshakeFailed(_))));
}

#[tokio::test]
async fn test_handshake_times_out_on_silent_server() {
    // テスト項目: 応答しないサーバーへの接続はタイムアウトする
    // given (前提条件):
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(stream);
    });

    // when (操作):
    let result = connect(&addr.to_string(), "Ann", Duration::from_millis(300)).await;

    // then (期待する結果):
    assert!(matches!(result, Err(ClientError::Timeout(_))));
}
