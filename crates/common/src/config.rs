/// Process-level configuration loaded from environment variables at startup.
/// Component tunables live in the TOML scanner config (`engine::ScannerFileConfig`);
/// this only carries secrets, paths and delivery targets.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite URL for the trade-history sink.
    pub database_url: String,
    /// Path to the TOML scanner configuration.
    pub scanner_config_path: String,
    /// Telegram bot token; notifications are disabled when absent.
    pub telegram_token: Option<String>,
    /// Telegram chat to deliver notifications to.
    pub telegram_chat_id: Option<i64>,
}

impl Config {
    /// Load configuration from environment variables, reading `.env` if
    /// present. Panics with a clear message on malformed values.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let telegram_chat_id = optional_env("TELEGRAM_CHAT_ID").map(|v| {
            v.parse::<i64>().unwrap_or_else(|_| {
                panic!("TELEGRAM_CHAT_ID must be a numeric chat id, got: '{v}'")
            })
        });

        Config {
            database_url: optional_env("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:trawler.db?mode=rwc".to_string()),
            scanner_config_path: optional_env("SCANNER_CONFIG_PATH")
                .unwrap_or_else(|| "config/scanner.toml".to_string()),
            telegram_token: optional_env("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id,
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
