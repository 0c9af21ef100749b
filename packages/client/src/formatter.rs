//! Message formatting utilities for client display.

use lanrelay_shared::protocol::{ChatMessage, FileMeta, SystemNotification, UserEntry};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the roster
    ///
    /// # Arguments
    ///
    /// * `users` - Current roster from the server
    /// * `my_ip` - This client's IP (entries from it are marked "me")
    ///
    /// # Returns
    ///
    /// A formatted string with one line per user
    pub fn format_user_list(users: &[UserEntry], my_ip: &str) -> String {
        let mut output = String::new();
        output.push_str("\n\n============================================================\n");
        output.push_str(&format!("Online ({}):\n", users.len()));

        if users.is_empty() {
            output.push_str("(No users)\n");
        } else {
            for user in users {
                let me_suffix = if user.ip == my_ip { " (me)" } else { "" };
                output.push_str(&format!("{} ({}){}\n", user.nickname, user.ip, me_suffix));
            }
        }

        output.push_str("============================================================\n");
        output
    }

    /// Format a chat message
    ///
    /// Messages from this client's own IP and nickname are shown as "me".
    pub fn format_chat_message(message: &ChatMessage, my_ip: &str, my_nickname: &str) -> String {
        let is_me = message.sender_ip == my_ip && message.nickname == my_nickname;
        let from = if is_me { "me" } else { message.nickname.as_str() };
        format!(
            "\n\n------------------------------------------------------------\n\
             [{}] @{} ({}): {}\n\
             ------------------------------------------------------------\n",
            message.timestamp, from, message.sender_ip, message.content
        )
    }

    pub fn format_system(notice: &SystemNotification) -> String {
        format!("\n[{}] * {}\n", notice.timestamp, notice.content)
    }

    /// Format a confirmation message after sending
    pub fn format_sent_confirmation(timestamp: &str) -> String {
        format!("sent at {}\n", timestamp)
    }

    pub fn format_file_sent(meta: &FileMeta) -> String {
        format!("sent file {} ({} bytes)\n", meta.file_name, meta.file_size)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}
