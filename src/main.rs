use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trendwatch::services::trading::TradeLog;
use trendwatch::{EngineConfig, EngineEvent, EngineRunner, SymbolSample};

/// Environment variable naming the NDJSON sample file. Stdin when unset.
const REPLAY_PATH_ENV: &str = "TRENDWATCH_REPLAY";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trendwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = EngineConfig::from_env().context("invalid engine configuration")?;
    let log = TradeLog::new(&config.trading.trade_log_file);
    info!("Trade log: {}", log.path().display());

    let handle = EngineRunner::spawn(config, Some(log)).await?;
    let mut events = handle.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Event log lagged, skipped {}", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let fed = match std::env::var(REPLAY_PATH_ENV) {
        Ok(path) => {
            info!("Replaying samples from {}", path);
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("cannot open {}", path))?;
            replay(BufReader::new(file), &handle).await?
        }
        Err(_) => {
            info!("Replaying samples from stdin");
            replay(BufReader::new(tokio::io::stdin()), &handle).await?
        }
    };

    let report = handle.shutdown().await?;
    drop(handle);
    printer.await.ok();

    info!("Replayed {} samples", fed);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Feed every well-formed line to the engine. Returns the number of samples fed.
async fn replay<R>(reader: R, handle: &trendwatch::EngineHandle) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    let mut fed = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<SymbolSample>(line) {
            Ok(record) => {
                handle.push_sample(&record.symbol, record.to_sample()).await?;
                fed += 1;
            }
            Err(e) => warn!("Skipping line {}: {}", line_no, e),
        }
    }
    Ok(fed)
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::Signal { signal, alert: true } => {
            info!("{} {} @ {}", signal.symbol, signal.label(), signal.price())
        }
        EngineEvent::Signal { .. } | EngineEvent::TradeUpdated { .. } => {}
        EngineEvent::TradeOpened { trade } => info!(
            "OPEN {} {} {} @ {:.6}",
            trade.id, trade.symbol, trade.direction, trade.entry_price
        ),
        EngineEvent::TradeClosed { trade } => {
            if let Some(exit) = &trade.exit {
                info!(
                    "CLOSE {} {} {} @ {:.6} pnl {:.4}",
                    trade.id, trade.symbol, exit.reason, exit.price, exit.profit
                );
            }
        }
        EngineEvent::TurningPointPending { symbol, action, price, .. } => {
            info!("{} turning point {} pending @ {}", symbol, action, price)
        }
        EngineEvent::TrendChanged { analysis, previous } => info!(
            "{} trend {} -> {} ({:.2}%)",
            analysis.symbol, previous, analysis.direction, analysis.price_change_percent
        ),
        EngineEvent::RsiAlert { symbol, zone, rsi, .. } => {
            debug!("{} RSI {:.2} {:?}", symbol, rsi, zone)
        }
        EngineEvent::PriceMove { symbol, previous, price, change_percent, .. } => info!(
            "{} price {:+.2}% ({} -> {})",
            symbol, change_percent, previous, price
        ),
    }
}
