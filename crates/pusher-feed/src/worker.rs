//! Feed ingestion worker.
//!
//! Owns the websocket connection lifecycle: connect, subscribe, forward raw
//! text frames into the bounded frame queue, and reconnect with backoff on
//! any error. A normal server close ends the worker; exhausting the retry
//! budget ends it with an error so the supervisor can shut the process down.

use crate::backoff::RetryPolicy;
use crate::error::{FeedError, FeedResult};
use crate::message::SubscribeRequest;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Frame queue capacity. When the coordinator falls behind, sends into the
/// queue block and the worker stops reading from the socket, pushing
/// backpressure onto the feed instead of buffering without bound.
pub const FRAME_QUEUE_CAPACITY: usize = 10_000;

/// Feed connection configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Websocket URL of the Stork subscribe endpoint.
    pub url: String,
    /// Pre-encoded Basic auth token for the `Authorization` header.
    pub auth_token: String,
    /// Asset identifiers to subscribe to.
    pub assets: Vec<String>,
    /// Attempt budget for consecutive connection failures.
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    pub max_delay_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            auth_token: String::new(),
            assets: Vec::new(),
            max_retries: 100,
            base_delay_ms: 1000,
            max_delay_ms: 5000,
        }
    }
}

/// Reconnecting websocket worker.
pub struct FeedWorker {
    config: FeedConfig,
    frame_tx: mpsc::Sender<String>,
    shutdown: CancellationToken,
}

impl FeedWorker {
    pub fn new(config: FeedConfig, frame_tx: mpsc::Sender<String>, shutdown: CancellationToken) -> Self {
        Self {
            config,
            frame_tx,
            shutdown,
        }
    }

    /// Run until shutdown, normal server close, or retry budget exhaustion.
    pub async fn run(self) -> FeedResult<()> {
        let mut policy = RetryPolicy::new(
            Duration::from_millis(self.config.base_delay_ms),
            Duration::from_millis(self.config.max_delay_ms),
            self.config.max_retries,
        );

        info!(
            url = %self.config.url,
            assets = self.config.assets.len(),
            "Starting feed worker"
        );

        loop {
            if self.shutdown.is_cancelled() {
                info!("Shutdown requested, exiting feed worker");
                return Ok(());
            }

            match self.stream_frames(&mut policy).await {
                Ok(()) => {
                    info!("Feed connection closed");
                    return Ok(());
                }
                Err(e) => {
                    if self.shutdown.is_cancelled() {
                        info!("Shutdown requested after disconnect, not reconnecting");
                        return Ok(());
                    }
                    warn!(error = %e, "Feed connection error");
                }
            }

            let Some(delay) = policy.next_delay() else {
                let attempts = policy.attempt();
                error!(attempts, "Max reconnection attempts reached, feed worker exiting");
                return Err(FeedError::RetriesExhausted { attempts });
            };

            warn!(
                attempt = policy.attempt(),
                delay_ms = delay.as_millis(),
                "Reconnecting after backoff"
            );

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown.cancelled() => {
                    info!("Shutdown requested during backoff, exiting");
                    return Ok(());
                }
            }
        }
    }

    async fn stream_frames(&self, policy: &mut RetryPolicy) -> FeedResult<()> {
        debug!(url = %self.config.url, "Connecting to feed");

        let mut request = self
            .config
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| FeedError::Connection(e.to_string()))?;
        let auth = HeaderValue::from_str(&format!("Basic {}", self.config.auth_token))
            .map_err(|e| FeedError::Connection(format!("bad auth token: {e}")))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        let (ws_stream, _response) = connect_async_tls_with_config(request, None, true, None).await?;
        let (mut write, mut read) = ws_stream.split();
        info!("Feed connected");

        let subscribe = serde_json::to_string(&SubscribeRequest::new(&self.config.assets))?;
        write.send(Message::Text(subscribe)).await?;
        info!(assets = ?self.config.assets, "Subscribed to feed");

        // Streak cleared only once connect + subscribe both succeed, so a
        // flapping endpoint still burns down the attempt budget.
        policy.reset();

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    info!("Shutdown signal received in feed loop");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        debug!(error = %e, "Failed to send Close frame during shutdown");
                    }
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if self.frame_tx.send(text).await.is_err() {
                                warn!("Frame receiver dropped, closing feed");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000u16, "Normal close".to_string()));
                            info!(code, %reason, "Feed closed by server");
                            return Ok(());
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Feed read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("Feed stream ended");
                            return Ok(());
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}
