use crate::{
    config::Config,
    engine::{self, source::SealedAccountSource, EngineConfig, Orchestrator},
    error::EngineError,
    notify::Notifier,
    paper::PaperEngine,
    security::token::TokenIssuer,
};
use gauntlet_data::{PriceCache, PriceRestClient, PriceStream};
use gauntlet_exchange::{ApiCredentials, MasterClient, MasterExchange};
use gauntlet_integration::rate_limit::RateLimiter;
use gauntlet_ledger::LedgerStore;
use redis::aio::ConnectionManager;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Requests per second allowed against one exchange environment.
const EXCHANGE_REQUESTS_PER_SECOND: usize = 20;

/// Cadence of mirroring fresh prices into Redis for the bot process.
const PRICE_MIRROR_PERIOD: Duration = Duration::from_secs(2);

/// Master wallet health check cadence.
const MASTER_WATCHDOG_PERIOD: Duration = Duration::from_secs(3600);

/// Process-wide application state, built once at startup and torn down in reverse
/// order on shutdown. Request handlers and the orchestrator borrow from here instead
/// of reaching for globals.
pub struct Runtime {
    pub config: Config,
    pub ledger: LedgerStore,
    pub redis: ConnectionManager,
    pub cache: PriceCache,
    pub notifier: Notifier,
    pub tokens: TokenIssuer,
    pub master: Arc<dyn MasterExchange>,
    pub paper: PaperEngine,
    pub orchestrator: Arc<Orchestrator>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime").finish()
    }
}

impl Runtime {
    /// Connect every backing service and assemble the engine.
    pub async fn build(config: Config) -> Result<Self, EngineError> {
        let ledger = LedgerStore::connect(&config.database_url, 16).await?;
        ledger.migrate().await?;

        let redis_client = redis::Client::open(config.redis_url.as_str())
            .map_err(EngineError::Redis)?;
        let redis = ConnectionManager::new(redis_client)
            .await
            .map_err(EngineError::Redis)?;

        let cache = PriceCache::new(config.price_symbols.clone(), config.price_cache_ttl);
        let notifier = Notifier::new(redis.clone(), ledger.clone());

        let tokens = TokenIssuer::new(
            &config.jwt_secret,
            config.jwt_access_expire,
            config.jwt_refresh_expire,
        );

        let master: Arc<dyn MasterExchange> = Arc::new(MasterClient::new(
            ApiCredentials::new(config.master_api_key.clone(), config.master_api_secret.clone()),
            config.master_min_balance,
            config.price_symbols.clone(),
            RateLimiter::new(EXCHANGE_REQUESTS_PER_SECOND, Duration::from_secs(1)),
        ));

        let paper = PaperEngine::new(
            ledger.clone(),
            cache.clone(),
            PriceRestClient::new(),
            notifier.clone(),
        );

        let accounts = Arc::new(SealedAccountSource::new(
            config.seal_key.clone(),
            RateLimiter::new(EXCHANGE_REQUESTS_PER_SECOND, Duration::from_secs(1)),
            RateLimiter::new(EXCHANGE_REQUESTS_PER_SECOND, Duration::from_secs(1)),
            paper.clone(),
            ledger.clone(),
            cache.clone(),
        ));

        let orchestrator = Arc::new(Orchestrator::new(
            ledger.clone(),
            accounts,
            master.clone(),
            notifier.clone(),
            config.seal_key.clone(),
            Some(paper.clone()),
            EngineConfig {
                check_interval: config.engine_check_interval,
                fan_out: config.engine_fan_out,
            },
        ));

        info!("runtime assembled");
        Ok(Self {
            config,
            ledger,
            redis,
            cache,
            notifier,
            tokens,
            master,
            paper,
            orchestrator,
        })
    }

    /// Run every long-lived task until a shutdown signal arrives, then drain and tear
    /// down in reverse construction order.
    pub async fn run(self) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let stream = PriceStream::new(self.cache.clone());
        let stream_task = tokio::spawn(stream.run());

        let mirror_task = tokio::spawn(mirror_prices(
            self.cache.clone(),
            self.redis.clone(),
            self.config.price_cache_ttl,
            shutdown_rx.clone(),
        ));

        let watchdog_task = tokio::spawn(engine::master_watchdog(
            self.master.clone(),
            self.notifier.clone(),
            MASTER_WATCHDOG_PERIOD,
            shutdown_rx.clone(),
        ));

        let orchestrator_task = tokio::spawn(self.orchestrator.clone().run(shutdown_rx));

        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(err) => error!(%err, "failed to listen for shutdown signal"),
        }

        // Reverse order: stop scheduling, let the in-flight tick drain, then stop the
        // ancillary tasks and close the pools.
        let _ = shutdown_tx.send(true);
        if let Err(err) = orchestrator_task.await {
            warn!(%err, "orchestrator task ended abnormally");
        }
        let _ = watchdog_task.await;
        let _ = mirror_task.await;
        stream_task.abort();

        self.ledger.close().await;
        info!("runtime stopped");
    }
}

/// Mirror fresh cache entries into Redis (`gauntlet:price:{symbol}`) so sibling
/// processes can quote without holding a feed connection.
async fn mirror_prices(
    cache: PriceCache,
    redis: ConnectionManager,
    ttl: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(PRICE_MIRROR_PERIOD);
    let ttl_seconds = ttl.as_secs().max(1);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let prices = cache.prices_all();
                if prices.is_empty() {
                    continue;
                }
                let mut conn = redis.clone();
                let mut pipe = redis::pipe();
                for (symbol, price) in &prices {
                    pipe.cmd("SETEX")
                        .arg(format!("gauntlet:price:{symbol}"))
                        .arg(ttl_seconds)
                        .arg(price.to_string())
                        .ignore();
                }
                if let Err(err) = pipe.query_async::<_, ()>(&mut conn).await {
                    warn!(%err, "price mirror write failed");
                }
            }
            _ = shutdown.changed() => return,
        }
    }
}
