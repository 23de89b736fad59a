//! Background ingestion of Finnhub data into the price store.

use std::future::Future;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};
use tracing::{info, warn};

use crate::config::{Config, PullConfig};
use crate::database::get_db_connection;
use crate::entity::{prices, stocks};
use crate::finnhub::{CompanyProfile, FinnhubClient};
use crate::models::PricePoint;

const INSERT_CHUNK_SIZE: usize = 500;

/// One ingestion run: connect, pull, release.
#[async_trait]
pub trait Puller: Send {
    async fn start(&mut self) -> Result<()>;
    async fn pull_tasks(&mut self) -> Result<()>;
    async fn close(&mut self) -> Result<()>;
}

/// Builds a fresh puller for every run.
pub trait PullerFactory: Send + Sync {
    fn create(&self) -> Box<dyn Puller>;
}

/// Drives a puller through its lifecycle. Resources are released even when
/// the pull itself fails; the pull error wins over a close error.
pub async fn run(puller: &mut dyn Puller) -> Result<()> {
    puller.start().await.context("puller setup failed")?;
    let pulled = puller.pull_tasks().await;
    let closed = puller.close().await;
    pulled?;
    closed
}

/// Pulls every symbol even when some fail; failures are reported together
/// once the loop is done.
async fn pull_each<'a, F, Fut>(symbols: &'a [String], mut pull_one: F) -> Result<()>
where
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = Result<usize>>,
{
    let mut failed = Vec::new();
    for symbol in symbols {
        match pull_one(symbol).await {
            Ok(inserted) => info!("Pulled {}: {} new price rows", symbol, inserted),
            Err(e) => {
                warn!("Pulling {} failed: {:#}", symbol, e);
                failed.push(symbol.as_str());
            }
        }
    }

    if !failed.is_empty() {
        bail!("pull failed for {} of {} symbols: {}", failed.len(), symbols.len(), failed.join(", "));
    }
    Ok(())
}

pub struct FinnhubPuller {
    database_url: String,
    finnhub_base_url: String,
    finnhub_api_key: String,
    pull: PullConfig,
    db: Option<DatabaseConnection>,
    client: Option<FinnhubClient>,
}

impl FinnhubPuller {
    pub fn new(config: &Config) -> Self {
        Self {
            database_url: config.database_url(),
            finnhub_base_url: config.finnhub_base_url.clone(),
            finnhub_api_key: config.finnhub_api_key.clone(),
            pull: config.pull.clone(),
            db: None,
            client: None,
        }
    }

    async fn pull_symbol(
        &self,
        db: &DatabaseConnection,
        client: &FinnhubClient,
        symbol: &str,
    ) -> Result<usize> {
        let profile = client.company_profile(symbol).await?;
        if profile.name.is_none() && profile.ticker.is_none() {
            warn!("Finnhub has no profile for {}, skipping", symbol);
            return Ok(0);
        }
        upsert_stock(db, symbol, profile).await?;

        let to = Utc::now();
        let from = to - Duration::days(self.pull.lookback_days);
        let mut inserted = 0;
        for resolution in &self.pull.resolutions {
            let points = client.candles(symbol, resolution, from, to).await?;
            inserted += insert_prices(db, points).await?;
        }
        Ok(inserted)
    }
}

#[async_trait]
impl Puller for FinnhubPuller {
    async fn start(&mut self) -> Result<()> {
        self.db = Some(get_db_connection(&self.database_url).await?);
        self.client = Some(FinnhubClient::new(
            self.finnhub_base_url.clone(),
            self.finnhub_api_key.clone(),
        ));
        Ok(())
    }

    async fn pull_tasks(&mut self) -> Result<()> {
        let (Some(db), Some(client)) = (self.db.as_ref(), self.client.as_ref()) else {
            bail!("puller used before start");
        };

        pull_each(&self.pull.symbols, |symbol| self.pull_symbol(db, client, symbol)).await
    }

    async fn close(&mut self) -> Result<()> {
        self.client = None;
        if let Some(db) = self.db.take() {
            db.close().await?;
        }
        Ok(())
    }
}

pub struct FinnhubPullerFactory {
    config: Config,
}

impl FinnhubPullerFactory {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl PullerFactory for FinnhubPullerFactory {
    fn create(&self) -> Box<dyn Puller> {
        Box::new(FinnhubPuller::new(&self.config))
    }
}

async fn upsert_stock(db: &DatabaseConnection, symbol: &str, profile: CompanyProfile) -> Result<()> {
    let stock = stocks::ActiveModel {
        symbol: ActiveValue::Set(symbol.to_string()),
        name: ActiveValue::Set(profile.name),
        industry: ActiveValue::Set(profile.industry),
        exchange: ActiveValue::Set(profile.exchange),
        currency: ActiveValue::Set(profile.currency),
        updated_at: ActiveValue::Set(Some(Utc::now())),
    };

    stocks::Entity::insert(stock)
        .on_conflict(
            OnConflict::column(stocks::Column::Symbol)
                .update_columns([
                    stocks::Column::Name,
                    stocks::Column::Industry,
                    stocks::Column::Exchange,
                    stocks::Column::Currency,
                    stocks::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;
    Ok(())
}

/// Inserts candles, skipping rows already stored. Returns how many were new.
async fn insert_prices(db: &DatabaseConnection, points: Vec<PricePoint>) -> Result<usize> {
    let mut inserted = 0;
    for chunk in points.chunks(INSERT_CHUNK_SIZE) {
        let models = chunk.iter().map(|p| prices::ActiveModel {
            symbol: ActiveValue::Set(p.symbol.clone()),
            resolution: ActiveValue::Set(p.resolution.clone()),
            time: ActiveValue::Set(p.time),
            open: ActiveValue::Set(p.open),
            high: ActiveValue::Set(p.high),
            low: ActiveValue::Set(p.low),
            close: ActiveValue::Set(p.close),
            volume: ActiveValue::Set(p.volume),
        });

        let result = prices::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    prices::Column::Symbol,
                    prices::Column::Resolution,
                    prices::Column::Time,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(rows) => inserted += rows as usize,
            Err(sea_orm::DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingPuller {
        calls: Arc<Mutex<Vec<&'static str>>>,
        fail_start: bool,
        fail_pull: bool,
    }

    #[async_trait]
    impl Puller for RecordingPuller {
        async fn start(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push("start");
            if self.fail_start {
                bail!("no database");
            }
            Ok(())
        }

        async fn pull_tasks(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push("pull");
            if self.fail_pull {
                bail!("upstream down");
            }
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push("close");
            Ok(())
        }
    }

    fn recording(fail_start: bool, fail_pull: bool) -> (RecordingPuller, Arc<Mutex<Vec<&'static str>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let puller = RecordingPuller {
            calls: calls.clone(),
            fail_start,
            fail_pull,
        };
        (puller, calls)
    }

    #[tokio::test]
    async fn test_run_calls_lifecycle_in_order() {
        let (mut puller, calls) = recording(false, false);
        run(&mut puller).await.unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["start", "pull", "close"]);
    }

    #[tokio::test]
    async fn test_run_closes_after_failed_pull() {
        let (mut puller, calls) = recording(false, true);
        assert!(run(&mut puller).await.is_err());
        assert_eq!(*calls.lock().unwrap(), vec!["start", "pull", "close"]);
    }

    #[tokio::test]
    async fn test_run_stops_when_start_fails() {
        let (mut puller, calls) = recording(true, false);
        assert!(run(&mut puller).await.is_err());
        assert_eq!(*calls.lock().unwrap(), vec!["start"]);
    }

    #[tokio::test]
    async fn test_pull_each_continues_past_failures() {
        let symbols = vec!["AAPL".to_string(), "BAD".to_string(), "MSFT".to_string()];
        let attempted = Mutex::new(Vec::new());

        let result = pull_each(&symbols, |symbol| {
            attempted.lock().unwrap().push(symbol.to_string());
            async move {
                if symbol == "BAD" {
                    bail!("rate limited");
                }
                Ok(10)
            }
        })
        .await;

        assert_eq!(*attempted.lock().unwrap(), vec!["AAPL", "BAD", "MSFT"]);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("1 of 3"), "{err}");
        assert!(err.contains("BAD"), "{err}");
    }

    #[tokio::test]
    async fn test_pull_each_all_succeed() {
        let symbols = vec!["AAPL".to_string(), "MSFT".to_string()];
        assert!(pull_each(&symbols, |_| async { Ok(0) }).await.is_ok());
    }

    #[tokio::test]
    async fn test_finnhub_puller_requires_start() {
        let mut puller = FinnhubPuller {
            database_url: "postgres://localhost/stocks".to_string(),
            finnhub_base_url: "http://localhost".to_string(),
            finnhub_api_key: "key".to_string(),
            pull: PullConfig {
                symbols: vec!["AAPL".to_string()],
                resolutions: vec!["D".to_string()],
                lookback_days: 30,
            },
            db: None,
            client: None,
        };

        assert!(puller.pull_tasks().await.is_err());
        assert!(puller.close().await.is_ok());
    }
}
