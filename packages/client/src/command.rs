//! Parsing of input lines into client commands.

use std::path::PathBuf;

/// One line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/nick NAME`
    Nick(String),
    /// `/file PATH`
    File(PathBuf),
    /// `/users`
    Users,
    /// `/quit`
    Quit,
    /// Anything else
    Chat(String),
    /// A known command with a missing argument
    Usage(&'static str),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head {
            "/nick" if rest.is_empty() => Command::Usage("/nick NAME"),
            "/nick" => Command::Nick(rest.to_string()),
            "/file" if rest.is_empty() => Command::Usage("/file PATH"),
            "/file" => Command::File(PathBuf::from(rest)),
            "/users" => Command::Users,
            "/quit" => Command::Quit,
            _ => Command::Chat(line.to_string()),
        }
    }
}
