//! Logging setup utilities for the relay server and client.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The filter covers the library crates of the workspace and the binary itself.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "lanrelay-server")
/// * `default_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use lanrelay_shared::logger::setup_logger;
///
/// setup_logger("lanrelay-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                default_filter(binary_name, default_log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_filter(binary_name: &str, level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    format!(
        "lanrelay_shared={level},lanrelay_server={level},lanrelay_client={level},{binary_target}={level},tower_http={level}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_workspace_crates() {
        // テスト項目: デフォルトのフィルタがワークスペースの全クレートとバイナリを含む
        // given (前提条件):
        let binary_name = "lanrelay-server";

        // when (操作):
        let filter = default_filter(binary_name, "debug");

        // then (期待する結果):
        assert!(filter.contains("lanrelay_shared=debug"));
        assert!(filter.contains("lanrelay_server=debug"));
        assert!(filter.contains("lanrelay_client=debug"));
        assert!(!filter.contains("lanrelay-server"));
    }
}
