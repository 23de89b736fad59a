use dotenv::dotenv;

pub struct Config {
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub bind_addr: String,
    pub run_migrations: bool,
    pub finnhub_api_key: String,
    pub finnhub_base_url: String,
    pub pull: PullConfig,
}

/// What the background puller fetches on each run.
#[derive(Debug, Clone)]
pub struct PullConfig {
    pub symbols: Vec<String>,
    pub resolutions: Vec<String>,
    pub lookback_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        Ok(Config {
            db_host: std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            db_port: std::env::var("DB_PORT")
                .unwrap_or_else(|_| "5432".to_string())
                .parse()?,
            db_name: std::env::var("DB_NAME").unwrap_or_else(|_| "stocks".to_string()),
            db_user: std::env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            db_password: std::env::var("DB_PASSWORD").unwrap_or_else(|_| "postgres".to_string()),
            bind_addr: std::env::var("API_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            run_migrations: std::env::var("RUN_MIGRATIONS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            finnhub_api_key: std::env::var("FINNHUB_API_KEY")?,
            finnhub_base_url: std::env::var("FINNHUB_BASE_URL")
                .unwrap_or_else(|_| "https://finnhub.io/api/v1".to_string()),
            pull: PullConfig {
                symbols: split_list(
                    &std::env::var("PULL_SYMBOLS")
                        .unwrap_or_else(|_| "AAPL,MSFT,GOOGL,AMZN,TSLA".to_string()),
                ),
                resolutions: split_list(
                    &std::env::var("PULL_RESOLUTIONS").unwrap_or_else(|_| "D".to_string()),
                ),
                lookback_days: std::env::var("PULL_LOOKBACK_DAYS")
                    .unwrap_or_else(|_| "365".to_string())
                    .parse()?,
            },
        })
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_skips_empty() {
        assert_eq!(split_list(" AAPL, MSFT ,,TSLA"), vec!["AAPL", "MSFT", "TSLA"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_database_url() {
        let config = Config {
            db_host: "db".to_string(),
            db_port: 5433,
            db_name: "prices".to_string(),
            db_user: "reader".to_string(),
            db_password: "secret".to_string(),
            bind_addr: "127.0.0.1:8000".to_string(),
            run_migrations: false,
            finnhub_api_key: "key".to_string(),
            finnhub_base_url: "http://localhost".to_string(),
            pull: PullConfig {
                symbols: vec![],
                resolutions: vec!["D".to_string()],
                lookback_days: 30,
            },
        };

        assert_eq!(config.database_url(), "postgres://reader:secret@db:5433/prices");
    }
}
