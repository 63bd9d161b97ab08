//! In-memory record of recent invocations.
//!
//! Every [`ToolClient`](crate::ToolClient) invocation appends one
//! [`CallMetrics`]; the monitor keeps the most recent [`MAX_METRICS`] and
//! answers simple aggregate queries over them.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Number of entries retained.
pub const MAX_METRICS: usize = 1000;

/// Window used by [`CallMonitor::stats`] when none is given.
pub const DEFAULT_STATS_WINDOW: Duration = Duration::from_secs(60 * 60);

const TOOL_ERRORS_KEPT: usize = 5;
const RECENT_ERRORS: usize = 10;

/// One finished invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallMetrics {
    pub tool_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(rename = "durationMs", serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Aggregates for a single tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolStats {
    pub calls: usize,
    pub successes: usize,
    pub success_rate: f64,
    pub average_duration_ms: u64,
    /// Last few error messages, oldest first.
    pub errors: Vec<String>,
}

/// A failed call, as listed in [`MonitorStats::recent_errors`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentError {
    pub tool_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Snapshot returned by [`CallMonitor::stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStats {
    /// Entries retained, regardless of window.
    pub total_calls: usize,
    pub success_rate: f64,
    pub average_duration_ms: u64,
    pub tool_stats: BTreeMap<String, ToolStats>,
    pub recent_errors: Vec<RecentError>,
}

/// Bounded, thread-safe invocation log.
#[derive(Debug, Default)]
pub struct CallMonitor {
    metrics: Mutex<VecDeque<CallMetrics>>,
}

impl CallMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call that finished now.
    pub fn log_call(
        &self,
        tool_name: &str,
        symbol: Option<&str>,
        duration: Duration,
        success: bool,
        error: Option<&str>,
    ) {
        tracing::info!(
            tool = tool_name,
            symbol = symbol.unwrap_or(""),
            duration_ms = duration.as_millis() as u64,
            success,
            error = error.unwrap_or(""),
            "tool call recorded"
        );
        self.record(CallMetrics {
            tool_name: tool_name.to_string(),
            symbol: symbol.map(str::to_string),
            duration,
            success,
            error: error.map(str::to_string),
            timestamp: Utc::now(),
        });
    }

    /// Append a prepared entry, evicting the oldest beyond [`MAX_METRICS`].
    pub fn record(&self, metrics: CallMetrics) {
        let mut guard = self.metrics.lock();
        guard.push_back(metrics);
        while guard.len() > MAX_METRICS {
            guard.pop_front();
        }
    }

    /// Number of entries retained.
    pub fn len(&self) -> usize {
        self.metrics.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.lock().is_empty()
    }

    /// Copy of the retained entries, oldest first.
    pub fn snapshot(&self) -> Vec<CallMetrics> {
        self.metrics.lock().iter().cloned().collect()
    }

    /// Percentage of successful calls, rounded to two decimals. 0 when empty.
    pub fn success_rate(&self, tool: Option<&str>, window: Option<Duration>) -> f64 {
        let cutoff = window.map(cutoff_for);
        let guard = self.metrics.lock();
        let (total, ok) = guard
            .iter()
            .filter(|m| matches(m, tool, cutoff))
            .fold((0usize, 0usize), |(t, s), m| (t + 1, s + usize::from(m.success)));
        percent(ok, total)
    }

    /// Mean duration of successful calls in whole milliseconds. 0 when none.
    pub fn average_duration(&self, tool: Option<&str>, window: Option<Duration>) -> u64 {
        let cutoff = window.map(cutoff_for);
        let guard = self.metrics.lock();
        let durations: Vec<u64> = guard
            .iter()
            .filter(|m| m.success && matches(m, tool, cutoff))
            .map(|m| m.duration.as_millis() as u64)
            .collect();
        mean_millis(durations.iter().sum(), durations.len())
    }

    /// Aggregate view over `window` (one hour by default).
    pub fn stats(&self, window: Option<Duration>) -> MonitorStats {
        let window = window.unwrap_or(DEFAULT_STATS_WINDOW);
        let cutoff = cutoff_for(window);

        let mut tool_stats: BTreeMap<String, ToolStats> = BTreeMap::new();
        let mut durations: BTreeMap<String, u64> = BTreeMap::new();
        let (total_calls, recent_errors) = {
            let guard = self.metrics.lock();
            for m in guard.iter().filter(|m| m.timestamp > cutoff) {
                let entry = tool_stats.entry(m.tool_name.clone()).or_default();
                entry.calls += 1;
                if m.success {
                    entry.successes += 1;
                    *durations.entry(m.tool_name.clone()).or_default() += m.duration.as_millis() as u64;
                } else if let Some(err) = &m.error {
                    entry.errors.push(err.clone());
                }
            }

            let mut recent: Vec<RecentError> = guard
                .iter()
                .rev()
                .filter(|m| !m.success)
                .filter_map(|m| {
                    m.error.as_ref().map(|error| RecentError {
                        tool_name: m.tool_name.clone(),
                        symbol: m.symbol.clone(),
                        error: error.clone(),
                        timestamp: m.timestamp,
                    })
                })
                .take(RECENT_ERRORS)
                .collect();
            recent.reverse();
            (guard.len(), recent)
        };

        for (name, stats) in tool_stats.iter_mut() {
            stats.success_rate = percent(stats.successes, stats.calls);
            stats.average_duration_ms =
                mean_millis(durations.get(name).copied().unwrap_or(0), stats.successes);
            let excess = stats.errors.len().saturating_sub(TOOL_ERRORS_KEPT);
            stats.errors.drain(..excess);
        }

        MonitorStats {
            total_calls,
            success_rate: self.success_rate(None, Some(window)),
            average_duration_ms: self.average_duration(None, Some(window)),
            tool_stats,
            recent_errors,
        }
    }
}

fn cutoff_for(window: Duration) -> DateTime<Utc> {
    let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX);
    Utc::now()
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn matches(m: &CallMetrics, tool: Option<&str>, cutoff: Option<DateTime<Utc>>) -> bool {
    tool.is_none_or(|t| m.tool_name == t) && cutoff.is_none_or(|c| m.timestamp > c)
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
}

fn mean_millis(sum: u64, count: usize) -> u64 {
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tool: &str, ms: u64, success: bool, age: Duration) -> CallMetrics {
        CallMetrics {
            tool_name: tool.to_string(),
            symbol: Some("7203.T".to_string()),
            duration: Duration::from_millis(ms),
            success,
            error: (!success).then(|| format!("{tool} failed")),
            timestamp: Utc::now() - chrono::Duration::from_std(age).unwrap(),
        }
    }

    #[test]
    fn test_empty_monitor() {
        let monitor = CallMonitor::new();
        assert!(monitor.is_empty());
        assert_eq!(monitor.success_rate(None, None), 0.0);
        assert_eq!(monitor.average_duration(None, None), 0);

        let stats = monitor.stats(None);
        assert_eq!(stats.total_calls, 0);
        assert!(stats.tool_stats.is_empty());
        assert!(stats.recent_errors.is_empty());
    }

    #[test]
    fn test_success_rate_rounds_to_two_decimals() {
        let monitor = CallMonitor::new();
        monitor.log_call("get_stock_price", Some("AAPL"), Duration::from_millis(100), true, None);
        monitor.log_call("get_stock_price", Some("AAPL"), Duration::from_millis(100), true, None);
        monitor.log_call("get_stock_price", Some("AAPL"), Duration::from_millis(5), false, Some("timeout"));

        assert_eq!(monitor.success_rate(None, None), 66.67);
        assert_eq!(monitor.success_rate(Some("get_rsi"), None), 0.0);
    }

    #[test]
    fn test_average_duration_ignores_failures() {
        let monitor = CallMonitor::new();
        monitor.record(entry("get_stock_price", 100, true, Duration::ZERO));
        monitor.record(entry("get_stock_price", 201, true, Duration::ZERO));
        monitor.record(entry("get_stock_price", 30_000, false, Duration::ZERO));
        monitor.record(entry("get_rsi", 900, true, Duration::ZERO));

        assert_eq!(monitor.average_duration(Some("get_stock_price"), None), 151);
        assert_eq!(monitor.average_duration(None, None), 400);
    }

    #[test]
    fn test_window_excludes_old_entries() {
        let monitor = CallMonitor::new();
        monitor.record(entry("get_stock_price", 100, false, Duration::from_secs(7200)));
        monitor.record(entry("get_stock_price", 100, true, Duration::ZERO));

        assert_eq!(monitor.success_rate(None, None), 50.0);
        assert_eq!(monitor.success_rate(None, Some(Duration::from_secs(3600))), 100.0);

        let stats = monitor.stats(None);
        assert_eq!(stats.total_calls, 2);
        assert_eq!(stats.tool_stats["get_stock_price"].calls, 1);
        // Recent errors are not windowed.
        assert_eq!(stats.recent_errors.len(), 1);
    }

    #[test]
    fn test_capacity_is_bounded() {
        let monitor = CallMonitor::new();
        for i in 0..(MAX_METRICS + 25) {
            monitor.record(entry(&format!("tool_{i}"), 1, true, Duration::ZERO));
        }
        assert_eq!(monitor.len(), MAX_METRICS);
        assert_eq!(monitor.snapshot()[0].tool_name, "tool_25");
    }

    #[test]
    fn test_stats_keep_recent_errors() {
        let monitor = CallMonitor::new();
        for i in 0..12 {
            let mut m = entry("get_stock_history", 10, false, Duration::ZERO);
            m.error = Some(format!("error {i}"));
            monitor.record(m);
        }
        monitor.record(entry("get_stock_history", 40, true, Duration::ZERO));

        let stats = monitor.stats(None);
        let tool = &stats.tool_stats["get_stock_history"];
        assert_eq!(tool.calls, 13);
        assert_eq!(tool.successes, 1);
        assert_eq!(tool.success_rate, 7.69);
        assert_eq!(tool.average_duration_ms, 40);
        assert_eq!(tool.errors, vec!["error 7", "error 8", "error 9", "error 10", "error 11"]);

        assert_eq!(stats.recent_errors.len(), 10);
        assert_eq!(stats.recent_errors[0].error, "error 2");
        assert_eq!(stats.recent_errors[9].error, "error 11");
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let monitor = CallMonitor::new();
        monitor.record(entry("get_rsi", 12, true, Duration::ZERO));
        let json = serde_json::to_value(monitor.stats(None)).unwrap();
        assert_eq!(json["totalCalls"], 1);
        assert_eq!(json["toolStats"]["get_rsi"]["averageDurationMs"], 12);
        assert!(json["recentErrors"].as_array().unwrap().is_empty());
    }
}
