//! Engine Runner
//!
//! Runs a [`TrendEngine`] on its own tokio task. Callers talk to it through a
//! cloneable [`EngineHandle`]; every engine event is fanned out on a broadcast
//! channel. Closed trades are persisted through the [`TradeLog`] off the async
//! executor.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{AppError, Result};
use crate::services::engine::TrendEngine;
use crate::services::trading::TradeLog;
use crate::types::{EngineEvent, PriceSample, Trade, TradeReport};

const COMMAND_BUFFER: usize = 1024;
const EVENT_BUFFER: usize = 1024;

/// Requests handled by the runner task, in arrival order.
#[derive(Debug)]
enum Command {
    Sample { symbol: String, sample: PriceSample },
    UpdateConfig(Arc<EngineConfig>),
    Report(oneshot::Sender<TradeReport>),
    Shutdown(oneshot::Sender<TradeReport>),
}

/// Cloneable front end of a running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<EngineEvent>,
}

impl EngineHandle {
    /// Receive every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub async fn push_sample(&self, symbol: &str, sample: PriceSample) -> Result<()> {
        self.send(Command::Sample {
            symbol: symbol.to_string(),
            sample,
        })
        .await
    }

    /// Validate and install a new configuration for subsequent ticks.
    pub async fn update_config(&self, config: EngineConfig) -> Result<()> {
        config.validate()?;
        self.send(Command::UpdateConfig(Arc::new(config))).await
    }

    pub async fn report(&self) -> Result<TradeReport> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Report(tx)).await?;
        rx.await
            .map_err(|_| AppError::Internal("engine dropped report request".to_string()))
    }

    /// Stop the runner after all queued samples, returning the final report.
    pub async fn shutdown(&self) -> Result<TradeReport> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown(tx)).await?;
        rx.await
            .map_err(|_| AppError::Internal("engine stopped before shutdown completed".to_string()))
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| AppError::Internal("engine runner is not running".to_string()))
    }
}

/// Single-writer task owning the engine.
pub struct EngineRunner {
    engine: TrendEngine,
    log: Option<TradeLog>,
    events: broadcast::Sender<EngineEvent>,
    commands: mpsc::Receiver<Command>,
}

impl EngineRunner {
    /// Load any stored history, then start the runner task.
    pub async fn spawn(config: EngineConfig, log: Option<TradeLog>) -> Result<EngineHandle> {
        config.validate()?;
        let mut engine = TrendEngine::new(config);

        if let Some(log) = log.clone() {
            let trades = tokio::task::spawn_blocking(move || log.load())
                .await
                .map_err(|e| AppError::Internal(format!("trade log task failed: {}", e)))??;
            engine.load_history(trades);
        }

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

        let runner = Self {
            engine,
            log,
            events: event_tx.clone(),
            commands: command_rx,
        };
        tokio::spawn(runner.run());
        info!("Engine runner started");

        Ok(EngineHandle {
            commands: command_tx,
            events: event_tx,
        })
    }

    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Sample { symbol, sample } => self.tick(&symbol, sample).await,
                Command::UpdateConfig(config) => self.engine.set_config(config),
                Command::Report(reply) => {
                    let _ = reply.send(self.report());
                }
                Command::Shutdown(reply) => {
                    info!("Engine runner received shutdown signal");
                    let _ = reply.send(self.report());
                    return;
                }
            }
        }
        debug!("All engine handles dropped, runner exiting");
    }

    async fn tick(&mut self, symbol: &str, sample: PriceSample) {
        let outcome = self.engine.push_sample(symbol, sample.price, sample.timestamp);
        let closed = outcome.closed().count();

        for event in outcome.into_events() {
            // No subscribers is not an error.
            let _ = self.events.send(event);
        }

        if closed > 0 {
            self.persist().await;
        }
    }

    fn report(&self) -> TradeReport {
        self.engine.report(chrono::Utc::now().timestamp_millis())
    }

    async fn persist(&self) {
        let Some(log) = self.log.clone() else {
            return;
        };
        let trades: Vec<Trade> = self.engine.history().to_vec();
        let count = trades.len();

        match tokio::task::spawn_blocking(move || log.save(&trades)).await {
            Ok(Ok(())) => debug!("Persisted {} closed trades", count),
            Ok(Err(e)) => error!("Failed to save trade log: {}", e),
            Err(e) => warn!("Trade log task failed: {}", e),
        }
    }
}
