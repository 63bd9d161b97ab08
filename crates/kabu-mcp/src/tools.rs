//! Tool names and argument shapes understood by the stock worker.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GET_STOCK_PRICE: &str = "get_stock_price";
pub const GET_STOCK_HISTORY: &str = "get_stock_history";
pub const COMPARE_STOCKS: &str = "compare_stocks";
pub const GET_FUNDAMENTALS: &str = "get_fundamentals";
pub const ANALYZE_STOCK: &str = "analyze_stock";
pub const ADD_TO_WATCHLIST: &str = "add_to_watchlist";
pub const REMOVE_FROM_WATCHLIST: &str = "remove_from_watchlist";
pub const GET_WATCHLIST: &str = "get_watchlist";
pub const GET_WATCHLIST_PRICES: &str = "get_watchlist_prices";
pub const GET_REALTIME_WATCHLIST_PRICES: &str = "get_realtime_watchlist_prices";
pub const GET_MOVING_AVERAGES: &str = "get_moving_averages";
pub const GET_RSI: &str = "get_rsi";
pub const GET_MACD: &str = "get_macd";
pub const GET_BOLLINGER_BANDS: &str = "get_bollinger_bands";
pub const GET_VOLATILITY_ANALYSIS: &str = "get_volatility_analysis";
pub const GET_SUPPORT_RESISTANCE: &str = "get_support_resistance";
pub const GET_TREND_ANALYSIS: &str = "get_trend_analysis";
pub const GET_TECHNICAL_SUMMARY: &str = "get_technical_summary";

/// Default period for `get_stock_history`.
pub const DEFAULT_HISTORY_PERIOD: &str = "1mo";

fn period_6mo() -> String {
    "6mo".to_string()
}

fn period_1y() -> String {
    "1y".to_string()
}

fn interval_1d() -> String {
    "1d".to_string()
}

/// Arguments for `get_moving_averages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageParams {
    #[serde(default = "period_6mo")]
    pub period: String,
    #[serde(default = "interval_1d")]
    pub interval: String,
    #[serde(default = "MovingAverageParams::default_windows")]
    pub windows: Vec<u32>,
}

impl MovingAverageParams {
    fn default_windows() -> Vec<u32> {
        vec![20, 50, 200]
    }
}

impl Default for MovingAverageParams {
    fn default() -> Self {
        Self {
            period: period_6mo(),
            interval: interval_1d(),
            windows: Self::default_windows(),
        }
    }
}

/// Arguments for `get_rsi`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiParams {
    #[serde(default = "period_6mo")]
    pub period: String,
    #[serde(default = "interval_1d")]
    pub interval: String,
    #[serde(default = "RsiParams::default_window")]
    pub window: u32,
}

impl RsiParams {
    fn default_window() -> u32 {
        14
    }
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: period_6mo(),
            interval: interval_1d(),
            window: Self::default_window(),
        }
    }
}

/// Arguments for `get_macd`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdParams {
    #[serde(default = "period_6mo")]
    pub period: String,
    #[serde(default = "interval_1d")]
    pub interval: String,
    #[serde(default = "MacdParams::default_fast")]
    pub fast_period: u32,
    #[serde(default = "MacdParams::default_slow")]
    pub slow_period: u32,
    #[serde(default = "MacdParams::default_signal")]
    pub signal_period: u32,
}

impl MacdParams {
    fn default_fast() -> u32 {
        12
    }
    fn default_slow() -> u32 {
        26
    }
    fn default_signal() -> u32 {
        9
    }
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            period: period_6mo(),
            interval: interval_1d(),
            fast_period: Self::default_fast(),
            slow_period: Self::default_slow(),
            signal_period: Self::default_signal(),
        }
    }
}

/// Arguments for `get_bollinger_bands`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerParams {
    #[serde(default = "period_6mo")]
    pub period: String,
    #[serde(default = "interval_1d")]
    pub interval: String,
    #[serde(default = "BollingerParams::default_window")]
    pub window: u32,
    #[serde(default = "BollingerParams::default_num_std")]
    pub num_std: f64,
}

impl BollingerParams {
    fn default_window() -> u32 {
        20
    }
    fn default_num_std() -> f64 {
        2.0
    }
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: period_6mo(),
            interval: interval_1d(),
            window: Self::default_window(),
            num_std: Self::default_num_std(),
        }
    }
}

/// Arguments for `get_volatility_analysis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityParams {
    #[serde(default = "period_1y")]
    pub period: String,
    #[serde(default = "interval_1d")]
    pub interval: String,
}

impl Default for VolatilityParams {
    fn default() -> Self {
        Self {
            period: period_1y(),
            interval: interval_1d(),
        }
    }
}

/// Arguments for `get_support_resistance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportResistanceParams {
    #[serde(default = "period_1y")]
    pub period: String,
    #[serde(default = "interval_1d")]
    pub interval: String,
    #[serde(default = "SupportResistanceParams::default_window")]
    pub window: u32,
}

impl SupportResistanceParams {
    fn default_window() -> u32 {
        20
    }
}

impl Default for SupportResistanceParams {
    fn default() -> Self {
        Self {
            period: period_1y(),
            interval: interval_1d(),
            window: Self::default_window(),
        }
    }
}

/// Arguments for `get_trend_analysis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendParams {
    #[serde(default = "period_1y")]
    pub period: String,
    #[serde(default = "interval_1d")]
    pub interval: String,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            period: period_1y(),
            interval: interval_1d(),
        }
    }
}

/// `symbol` followed by a tool's own parameters, flattened into one object.
#[derive(Debug, Serialize)]
pub struct SymbolArgs<'a, P: Serialize> {
    pub symbol: &'a str,
    #[serde(flatten)]
    pub params: &'a P,
}

impl<'a, P: Serialize> SymbolArgs<'a, P> {
    pub fn new(symbol: &'a str, params: &'a P) -> Self {
        Self { symbol, params }
    }

    /// Arguments object for the tool call.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_indicator_defaults() {
        let ma = SymbolArgs::new("AAPL", &MovingAverageParams::default()).to_value().unwrap();
        assert_eq!(
            ma,
            json!({"symbol": "AAPL", "period": "6mo", "interval": "1d", "windows": [20, 50, 200]})
        );

        let macd = SymbolArgs::new("AAPL", &MacdParams::default()).to_value().unwrap();
        assert_eq!(macd["fast_period"], 12);
        assert_eq!(macd["slow_period"], 26);
        assert_eq!(macd["signal_period"], 9);

        let bb = SymbolArgs::new("AAPL", &BollingerParams::default()).to_value().unwrap();
        assert_eq!(bb["window"], 20);
        assert_eq!(bb["num_std"], 2.0);

        let sr = SymbolArgs::new("AAPL", &SupportResistanceParams::default()).to_value().unwrap();
        assert_eq!(sr["period"], "1y");
        assert_eq!(sr["window"], 20);
    }

    #[test]
    fn test_partial_params_fill_defaults() {
        let rsi: RsiParams = serde_json::from_value(json!({"window": 7})).unwrap();
        assert_eq!(rsi.window, 7);
        assert_eq!(rsi.period, "6mo");

        let trend: TrendParams = serde_json::from_value(json!({"interval": "1wk"})).unwrap();
        assert_eq!(trend, TrendParams { period: "1y".into(), interval: "1wk".into() });
    }
}
