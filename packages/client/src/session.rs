//! Interactive relay client session.

use lanrelay_shared::protocol::Message;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::{mpsc, watch};

use crate::{
    command::Command,
    connection::{CONNECT_TIMEOUT, connect},
    error::ClientError,
    formatter::MessageFormatter,
    incoming::Incoming,
    ui::redisplay_prompt,
};

/// Print one message received from the server
fn print_message(message: &Message, my_ip: &str, my_nickname: &str) {
    let formatted = match message {
        Message::UserList(list) => MessageFormatter::format_user_list(&list.users, my_ip),
        Message::Chat(chat) => MessageFormatter::format_chat_message(chat, my_ip, my_nickname),
        Message::System(notice) => MessageFormatter::format_system(notice),
        other => {
            tracing::debug!("Ignoring '{}' from server", other.kind());
            return;
        }
    };
    print!("{}", formatted);
    redisplay_prompt(my_nickname);
}

/// Run the relay client session
pub async fn run_client_session(addr: &str, nickname: &str) -> Result<(), ClientError> {
    let connection = connect(addr, nickname, CONNECT_TIMEOUT).await?;
    let mut writer = connection.writer;
    let mut reader = connection.reader;
    let my_ip = writer.local_ip().to_string();

    println!(
        "\nYou are '{}' ({}). Type messages and press Enter to send.\n\
         Commands: /nick NAME, /file PATH, /users, /quit\n",
        nickname, my_ip
    );

    for message in &connection.backlog {
        print_message(message, &my_ip, nickname);
    }

    writer.send_user_update().await?;

    // The read side forwards every ACK to the file sender
    let (ack_tx, mut ack_rx) = mpsc::unbounded_channel::<()>();
    let (nickname_tx, nickname_rx) = watch::channel(nickname.to_string());

    // Spawn a task to handle incoming messages
    let nickname_for_read = nickname_rx.clone();
    let mut read_task = tokio::spawn(async move {
        let result: Result<(), ClientError> = loop {
            let current_nickname = nickname_for_read.borrow().clone();
            match reader.next().await {
                Ok(Some(Incoming::Ack)) => {
                    ack_tx.send(()).ok();
                }
                Ok(Some(Incoming::Message(message))) => {
                    print_message(&message, &my_ip, &current_nickname);
                }
                Ok(Some(Incoming::Raw(text))) => {
                    print!("{}", MessageFormatter::format_raw_message(&text));
                    redisplay_prompt(&current_nickname);
                }
                Ok(None) => {
                    tracing::info!("Server closed the connection");
                    break Err(ClientError::ConnectionClosed);
                }
                Err(e) => {
                    tracing::warn!("Read error: {}", e);
                    break Err(e);
                }
            }
        };
        result
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let nickname_for_prompt = nickname_rx;
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            let prompt = format!("{}> ", nickname_for_prompt.borrow().as_str());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to turn input lines into outgoing messages
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            match Command::parse(&line) {
                Command::Nick(name) => {
                    writer.set_nickname(&name).await?;
                    nickname_tx.send_replace(name);
                }
                Command::File(path) => match writer.send_file(&path, &mut ack_rx).await {
                    Ok(meta) => print!("\n{}", MessageFormatter::format_file_sent(&meta)),
                    Err(e @ (ClientError::LocalFile { .. } | ClientError::FileNotAcknowledged(_))) => {
                        println!("\n{}", e);
                    }
                    Err(e) => return Err(e),
                },
                Command::Users => writer.send_refresh_request().await?,
                Command::Quit => break,
                Command::Usage(usage) => println!("\nusage: {}", usage),
                Command::Chat(content) => {
                    let chat = writer.send_chat(&content).await?;
                    let formatted = MessageFormatter::format_sent_confirmation(&chat.timestamp);
                    print!("\n{}", formatted);
                }
            }
            redisplay_prompt(writer.nickname());
        }

        Ok::<(), ClientError>(())
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            read_result.unwrap_or(Err(ClientError::ConnectionClosed))
        }
        write_result = &mut write_task => {
            read_task.abort();
            write_result.unwrap_or(Err(ClientError::ConnectionClosed))
        }
    }
}
