//! Typed facade over worker invocations.

use std::sync::Arc;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::config::WorkerConfig;
use crate::invoker::{ProcessInvoker, SharedInvoker};
use crate::monitor::CallMonitor;
use crate::outcome::InvocationOutcome;
use crate::retry::RetryPolicy;
use crate::tools::{self, SymbolArgs};
use crate::tools::{
    BollingerParams, MacdParams, MovingAverageParams, RsiParams, SupportResistanceParams,
    TrendParams, VolatilityParams,
};

/// Entry point for calling worker tools.
///
/// Every method returns an [`InvocationOutcome`]; tool failures, timeouts and
/// crashed workers are reported through `success: false`, never as a panic.
///
/// Cloning is cheap and clones share the same [`CallMonitor`].
#[derive(Clone)]
pub struct ToolClient {
    invoker: SharedInvoker,
    retry: RetryPolicy,
    monitor: Arc<CallMonitor>,
}

impl std::fmt::Debug for ToolClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolClient")
            .field("retry", &self.retry)
            .field("recorded_calls", &self.monitor.len())
            .finish_non_exhaustive()
    }
}

impl ToolClient {
    /// Client that spawns `config.interpreter config.script` per attempt.
    pub fn new(config: WorkerConfig) -> Self {
        Self::with_invoker(Arc::new(ProcessInvoker::new(config)))
    }

    /// Client over any invoker, using the invoker's retry policy.
    pub fn with_invoker(invoker: SharedInvoker) -> Self {
        let retry = invoker.retry_policy();
        Self {
            invoker,
            retry,
            monitor: Arc::new(CallMonitor::new()),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Share an existing monitor.
    pub fn with_monitor(mut self, monitor: Arc<CallMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// The monitor recording this client's invocations.
    pub fn monitor(&self) -> &Arc<CallMonitor> {
        &self.monitor
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Generic
    // ─────────────────────────────────────────────────────────────────────────

    /// Call any tool with a raw arguments object.
    pub async fn call_tool(&self, tool: &str, arguments: Value) -> InvocationOutcome {
        let symbol = symbol_of(&arguments);
        self.run(tool, symbol.as_deref(), arguments).await
    }

    async fn run(&self, tool: &str, symbol: Option<&str>, arguments: Value) -> InvocationOutcome {
        let started = Instant::now();
        let invoker = &self.invoker;
        let outcome = self
            .retry
            .execute(tool, |_| {
                let arguments = arguments.clone();
                async move { invoker.invoke(tool, arguments).await }
            })
            .await;

        self.monitor.log_call(
            tool,
            symbol,
            started.elapsed(),
            outcome.success,
            outcome.error.as_deref(),
        );
        outcome
    }

    async fn run_with<P: Serialize>(&self, tool: &str, symbol: &str, params: &P) -> InvocationOutcome {
        match SymbolArgs::new(symbol, params).to_value() {
            Ok(arguments) => self.run(tool, Some(symbol), arguments).await,
            Err(e) => InvocationOutcome::failure(format!("invalid arguments for {tool}: {e}")),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Quotes
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn get_stock_price(&self, symbol: &str) -> InvocationOutcome {
        self.run(tools::GET_STOCK_PRICE, Some(symbol), json!({ "symbol": symbol }))
            .await
    }

    /// Price history; `period` defaults to `"1mo"`.
    pub async fn get_stock_history(&self, symbol: &str, period: Option<&str>) -> InvocationOutcome {
        let period = period.unwrap_or(tools::DEFAULT_HISTORY_PERIOD);
        self.run(
            tools::GET_STOCK_HISTORY,
            Some(symbol),
            json!({ "symbol": symbol, "period": period }),
        )
        .await
    }

    pub async fn compare_stocks(&self, symbol1: &str, symbol2: &str) -> InvocationOutcome {
        let label = format!("{symbol1},{symbol2}");
        self.run(
            tools::COMPARE_STOCKS,
            Some(&label),
            json!({ "symbol1": symbol1, "symbol2": symbol2 }),
        )
        .await
    }

    pub async fn get_fundamentals(&self, symbol: &str) -> InvocationOutcome {
        self.run(tools::GET_FUNDAMENTALS, Some(symbol), json!({ "symbol": symbol }))
            .await
    }

    pub async fn analyze_stock(&self, ticker: &str) -> InvocationOutcome {
        self.run(tools::ANALYZE_STOCK, Some(ticker), json!({ "ticker": ticker }))
            .await
    }

    /// Price and history fetched concurrently and merged.
    ///
    /// Always succeeds; `data.dataSources` lists which parts are present.
    pub async fn get_comprehensive_analysis(&self, symbol: &str) -> InvocationOutcome {
        tracing::info!(symbol, "starting comprehensive analysis");
        let (price, history) = tokio::join!(
            self.get_stock_price(symbol),
            self.get_stock_history(symbol, None)
        );

        let mut analysis = Map::new();
        analysis.insert("symbol".into(), json!(symbol));
        analysis.insert(
            "timestamp".into(),
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        let mut sources = Vec::new();
        for (name, outcome) in [("price", price), ("history", history)] {
            if outcome.success {
                analysis.insert(name.into(), outcome.data.unwrap_or(Value::Null));
                sources.push(name);
            } else {
                tracing::debug!(symbol, source = name, error = ?outcome.error, "analysis source unavailable");
            }
        }
        tracing::info!(symbol, data_sources = ?sources, "comprehensive analysis finished");
        analysis.insert("dataSources".into(), json!(sources));

        InvocationOutcome::success(Value::Object(analysis))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Watchlist
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn add_to_watchlist(&self, symbol: &str) -> InvocationOutcome {
        self.run(tools::ADD_TO_WATCHLIST, Some(symbol), json!({ "symbol": symbol }))
            .await
    }

    pub async fn remove_from_watchlist(&self, symbol: &str) -> InvocationOutcome {
        self.run(tools::REMOVE_FROM_WATCHLIST, Some(symbol), json!({ "symbol": symbol }))
            .await
    }

    pub async fn get_watchlist(&self) -> InvocationOutcome {
        self.run(tools::GET_WATCHLIST, None, json!({})).await
    }

    pub async fn get_watchlist_prices(&self) -> InvocationOutcome {
        self.run(tools::GET_WATCHLIST_PRICES, None, json!({})).await
    }

    pub async fn get_realtime_watchlist_prices(&self) -> InvocationOutcome {
        self.run(tools::GET_REALTIME_WATCHLIST_PRICES, None, json!({}))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Technical indicators
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn get_moving_averages(&self, symbol: &str, params: &MovingAverageParams) -> InvocationOutcome {
        self.run_with(tools::GET_MOVING_AVERAGES, symbol, params).await
    }

    pub async fn get_rsi(&self, symbol: &str, params: &RsiParams) -> InvocationOutcome {
        self.run_with(tools::GET_RSI, symbol, params).await
    }

    pub async fn get_macd(&self, symbol: &str, params: &MacdParams) -> InvocationOutcome {
        self.run_with(tools::GET_MACD, symbol, params).await
    }

    pub async fn get_bollinger_bands(&self, symbol: &str, params: &BollingerParams) -> InvocationOutcome {
        self.run_with(tools::GET_BOLLINGER_BANDS, symbol, params).await
    }

    pub async fn get_volatility_analysis(&self, symbol: &str, params: &VolatilityParams) -> InvocationOutcome {
        self.run_with(tools::GET_VOLATILITY_ANALYSIS, symbol, params).await
    }

    pub async fn get_support_resistance(
        &self,
        symbol: &str,
        params: &SupportResistanceParams,
    ) -> InvocationOutcome {
        self.run_with(tools::GET_SUPPORT_RESISTANCE, symbol, params).await
    }

    pub async fn get_trend_analysis(&self, symbol: &str, params: &TrendParams) -> InvocationOutcome {
        self.run_with(tools::GET_TREND_ANALYSIS, symbol, params).await
    }

    pub async fn get_technical_summary(&self, symbol: &str) -> InvocationOutcome {
        self.run(tools::GET_TECHNICAL_SUMMARY, Some(symbol), json!({ "symbol": symbol }))
            .await
    }
}

/// Symbol recorded in the monitor for a raw call.
fn symbol_of(arguments: &Value) -> Option<String> {
    ["symbol", "ticker", "symbol1"]
        .iter()
        .find_map(|key| arguments.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
