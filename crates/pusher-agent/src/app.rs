//! Application supervisor.
//!
//! Builds every component explicitly, spawns the feed worker and the flush
//! coordinator, and owns the shutdown sequence: cancel the shared token,
//! then give each task an independent grace period to finish.

use std::sync::Arc;
use std::time::Duration;

use pusher_core::feed_assets;
use pusher_feed::{FeedConfig, FeedWorker, PriceBook};
use pusher_venue::{ExchangeClient, KeyManager, OracleSubmitter, Signer};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::coordinator::FlushCoordinator;
use crate::error::{AppError, AppResult};

pub struct Application {
    config: AppConfig,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Run until interrupted.
    ///
    /// A fatal feed exit (retry budget exhausted) does not stop the
    /// coordinator; prices go stale until the operator restarts the service.
    /// The feed error is still returned after shutdown so the exit code
    /// reflects it.
    pub async fn run(self) -> AppResult<()> {
        let config = self.config;
        let shutdown = CancellationToken::new();
        let grace = Duration::from_millis(config.shutdown_grace_ms);

        let auth_token = std::env::var(&config.feed.auth_token_env).map_err(|_| {
            AppError::Config(format!(
                "environment variable {} not set",
                config.feed.auth_token_env
            ))
        })?;

        let key_manager =
            KeyManager::load(config.signer.key_source(), config.signer.expected_address()?)?;
        let signer = Signer::new(key_manager, !config.dex.testnet);
        info!(
            address = %signer.address(),
            testnet = config.dex.testnet,
            dex = %config.dex.name,
            "Oracle signer loaded"
        );
        let submitter: Arc<dyn OracleSubmitter> = Arc::new(ExchangeClient::new(signer));

        let assets = feed_assets(&config.markets);
        info!(markets = config.markets.len(), feed_assets = assets.len(), "Catalog loaded");

        let book = Arc::new(PriceBook::new());
        let (frame_tx, frame_rx) = mpsc::channel(config.feed.queue_capacity);

        let worker = FeedWorker::new(
            FeedConfig {
                url: config.feed.url.clone(),
                auth_token,
                assets,
                max_retries: config.feed.max_retries,
                base_delay_ms: config.feed.base_delay_ms,
                max_delay_ms: config.feed.max_delay_ms,
            },
            frame_tx,
            shutdown.clone(),
        );

        let coordinator = FlushCoordinator::new(
            config.dex.name.clone(),
            config.markets.clone(),
            Duration::from_millis(config.flush_interval_ms),
            book,
            frame_rx,
            submitter,
            shutdown.clone(),
        );

        let mut feed_handle = tokio::spawn(worker.run());
        let mut coord_handle = tokio::spawn(coordinator.run());

        let mut feed_result: Option<AppResult<()>> = None;
        loop {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    match res {
                        Ok(()) => info!("Interrupt received, shutting down"),
                        Err(e) => error!(error = %e, "Failed to listen for interrupt, shutting down"),
                    }
                    break;
                }

                res = &mut feed_handle, if feed_result.is_none() => {
                    let flat = flatten_feed_join(res);
                    match &flat {
                        Ok(()) => info!("Feed worker finished"),
                        Err(e) => error!(
                            error = %e,
                            "Feed worker failed; prices will go stale until restart"
                        ),
                    }
                    feed_result = Some(flat);
                }
            }
        }

        shutdown.cancel();

        if feed_result.is_none() {
            feed_result = Some(match timeout(grace, &mut feed_handle).await {
                Ok(res) => flatten_feed_join(res),
                Err(_) => {
                    warn!(grace_ms = grace.as_millis(), "Feed worker did not stop in time, aborting");
                    feed_handle.abort();
                    Ok(())
                }
            });
        }

        match timeout(grace, &mut coord_handle).await {
            Ok(Ok(())) => info!("Coordinator stopped"),
            Ok(Err(e)) => error!(error = %e, "Coordinator task failed"),
            Err(_) => {
                warn!(grace_ms = grace.as_millis(), "Coordinator did not stop in time, aborting");
                coord_handle.abort();
            }
        }

        info!("Shutdown complete");
        feed_result.unwrap_or(Ok(()))
    }
}

fn flatten_feed_join(
    res: Result<pusher_feed::error::FeedResult<()>, tokio::task::JoinError>,
) -> AppResult<()> {
    match res {
        Ok(inner) => inner.map_err(AppError::from),
        Err(e) => Err(AppError::Task(format!("feed worker panicked: {e}"))),
    }
}
