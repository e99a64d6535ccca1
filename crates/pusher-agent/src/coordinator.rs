//! Flush coordinator.
//!
//! Single consumer of the frame queue. Between flushes it drains decoded
//! frames into the price book; every `flush_interval` it snapshots the book,
//! resolves the market catalog into price sets, and hands them to the venue
//! submitter. On shutdown it runs exactly one final flush before exiting.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pusher_core::{AssetSource, MarketDefinition};
use pusher_feed::{parse_frame, PriceBook};
use pusher_venue::{OracleSubmitter, OracleUpdate};
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A flush found a market slot whose feed asset has no price yet.
#[derive(Debug, Error)]
#[error("no feed price yet for asset {asset}")]
pub struct PriceUnavailable {
    pub asset: String,
}

/// Timer-driven flush loop.
pub struct FlushCoordinator {
    dex: String,
    markets: Vec<MarketDefinition>,
    flush_interval: Duration,
    book: Arc<PriceBook>,
    frame_rx: mpsc::Receiver<String>,
    submitter: Arc<dyn OracleSubmitter>,
    shutdown: CancellationToken,
}

impl FlushCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dex: String,
        markets: Vec<MarketDefinition>,
        flush_interval: Duration,
        book: Arc<PriceBook>,
        frame_rx: mpsc::Receiver<String>,
        submitter: Arc<dyn OracleSubmitter>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            dex,
            markets,
            flush_interval,
            book,
            frame_rx,
            submitter,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        info!(
            dex = %self.dex,
            markets = self.markets.len(),
            interval_ms = self.flush_interval.as_millis(),
            "Coordinator started"
        );

        // First tick one full interval out; skipped ticks do not pile up a
        // submission backlog after a stall.
        let mut ticker = interval_at(Instant::now() + self.flush_interval, self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // recv() on a closed channel resolves immediately with None, so the
        // arm must be disabled once the feed side is gone.
        let mut frames_open = true;

        loop {
            tokio::select! {
                // Stop must win over a tick that became ready at the same
                // instant, or shutdown could run a scheduled flush on top of
                // the final one.
                biased;

                () = self.shutdown.cancelled() => {
                    info!("Coordinator shutting down, running final flush");
                    self.flush().await;
                    info!("Coordinator shutdown complete");
                    return;
                }

                _ = ticker.tick() => {
                    self.flush().await;
                }

                frame = self.frame_rx.recv(), if frames_open => {
                    match frame {
                        Some(text) => self.ingest(&text),
                        None => {
                            debug!("Frame queue closed");
                            frames_open = false;
                        }
                    }
                }
            }
        }
    }

    fn ingest(&self, text: &str) {
        match parse_frame(text) {
            Ok(Some(updates)) => self.book.apply(updates),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Dropping malformed feed frame"),
        }
    }

    /// One flush: snapshot, resolve, submit. Failures never propagate; the
    /// loop always survives to the next tick.
    async fn flush(&self) {
        let snapshot = self.book.snapshot();
        let update = match build_oracle_update(&self.dex, &self.markets, &snapshot) {
            Ok(update) => update,
            Err(e) => {
                warn!(asset = %e.asset, "Skipping flush, feed price missing");
                return;
            }
        };

        debug!(markets = update.oracle_pxs.len(), "Flushing oracle update");
        if let Err(e) = self.submitter.submit_oracle(update).await {
            warn!(error = %e, "Oracle submission failed, continuing");
        }
    }
}

/// Resolve the market catalog against a price snapshot.
///
/// Keys are `"<dex>:<market>"`. Oracle/external sets carry one pair per
/// market; the mark set is one singleton pair list per market in catalog
/// order. Any market slot whose feed asset is absent from the snapshot fails
/// the whole flush; no partial set is ever built.
pub fn build_oracle_update(
    dex: &str,
    markets: &[MarketDefinition],
    snapshot: &HashMap<String, Decimal>,
) -> Result<OracleUpdate, PriceUnavailable> {
    let mut oracle_pxs = Vec::with_capacity(markets.len());
    let mut mark_pxs = Vec::with_capacity(markets.len());
    let mut external_pxs = Vec::with_capacity(markets.len());

    for market in markets {
        let key = format!("{dex}:{}", market.name);
        let spot = resolve_slot(&market.spot, snapshot)?;
        let mark = resolve_slot(&market.mark, snapshot)?;
        let external = resolve_slot(&market.external, snapshot)?;

        oracle_pxs.push((key.clone(), render_price(spot)));
        mark_pxs.push(vec![(key.clone(), render_price(mark))]);
        external_pxs.push((key, render_price(external)));
    }

    Ok(OracleUpdate {
        dex: dex.to_string(),
        oracle_pxs,
        mark_pxs,
        external_pxs,
    })
}

fn resolve_slot(
    source: &AssetSource,
    snapshot: &HashMap<String, Decimal>,
) -> Result<Decimal, PriceUnavailable> {
    match source {
        AssetSource::Stork { identifier } => {
            snapshot
                .get(identifier)
                .copied()
                .ok_or_else(|| PriceUnavailable {
                    asset: identifier.clone(),
                })
        }
        AssetSource::Random { min, max } => Ok(draw_uniform(*min, *max)),
    }
}

/// Fresh uniform draw in `[min, max]`, independent per call.
fn draw_uniform(min: Decimal, max: Decimal) -> Decimal {
    let frac = Decimal::from_f64(rand::rng().random_range(0.0..=1.0)).unwrap_or_default();
    (min + (max - min) * frac).round_dp(8)
}

fn render_price(price: Decimal) -> String {
    price.normalize().to_string()
}
