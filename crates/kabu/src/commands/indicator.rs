//! Technical indicator commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use kabu_mcp::tools::{
    BollingerParams, MacdParams, MovingAverageParams, RsiParams, SupportResistanceParams,
    TrendParams, VolatilityParams,
};

use super::Context;

#[derive(Args, Debug)]
pub struct IndicatorArgs {
    #[command(subcommand)]
    pub command: IndicatorCommand,
}

/// Period and interval overrides shared by every indicator.
#[derive(Args, Debug, Default)]
pub struct RangeArgs {
    /// Data period (e.g. 6mo, 1y)
    #[arg(long)]
    pub period: Option<String>,

    /// Bar interval (e.g. 1d, 1wk)
    #[arg(long)]
    pub interval: Option<String>,
}

impl RangeArgs {
    fn apply(self, period: &mut String, interval: &mut String) {
        if let Some(p) = self.period {
            *period = p;
        }
        if let Some(i) = self.interval {
            *interval = i;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum IndicatorCommand {
    /// Simple and exponential moving averages
    Ma {
        symbol: String,
        #[command(flatten)]
        range: RangeArgs,
        /// Comma-separated window sizes
        #[arg(long, value_delimiter = ',')]
        windows: Vec<u32>,
    },

    /// Relative strength index
    Rsi {
        symbol: String,
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        window: Option<u32>,
    },

    /// MACD line, signal and histogram
    Macd {
        symbol: String,
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        fast: Option<u32>,
        #[arg(long)]
        slow: Option<u32>,
        #[arg(long)]
        signal: Option<u32>,
    },

    /// Bollinger bands
    Bollinger {
        symbol: String,
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        window: Option<u32>,
        /// Band width in standard deviations
        #[arg(long)]
        num_std: Option<f64>,
    },

    /// Volatility analysis
    Volatility {
        symbol: String,
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Support and resistance levels
    Support {
        symbol: String,
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        window: Option<u32>,
    },

    /// Trend analysis
    Trend {
        symbol: String,
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Summary of all indicators
    Summary { symbol: String },
}

/// Run the indicator command.
pub async fn run(args: IndicatorArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;

    let outcome = match args.command {
        IndicatorCommand::Ma {
            symbol,
            range,
            windows,
        } => {
            let mut params = MovingAverageParams::default();
            range.apply(&mut params.period, &mut params.interval);
            if !windows.is_empty() {
                params.windows = windows;
            }
            client.get_moving_averages(&symbol, &params).await
        }
        IndicatorCommand::Rsi {
            symbol,
            range,
            window,
        } => {
            let mut params = RsiParams::default();
            range.apply(&mut params.period, &mut params.interval);
            if let Some(w) = window {
                params.window = w;
            }
            client.get_rsi(&symbol, &params).await
        }
        IndicatorCommand::Macd {
            symbol,
            range,
            fast,
            slow,
            signal,
        } => {
            let mut params = MacdParams::default();
            range.apply(&mut params.period, &mut params.interval);
            params.fast_period = fast.unwrap_or(params.fast_period);
            params.slow_period = slow.unwrap_or(params.slow_period);
            params.signal_period = signal.unwrap_or(params.signal_period);
            client.get_macd(&symbol, &params).await
        }
        IndicatorCommand::Bollinger {
            symbol,
            range,
            window,
            num_std,
        } => {
            let mut params = BollingerParams::default();
            range.apply(&mut params.period, &mut params.interval);
            params.window = window.unwrap_or(params.window);
            params.num_std = num_std.unwrap_or(params.num_std);
            client.get_bollinger_bands(&symbol, &params).await
        }
        IndicatorCommand::Volatility { symbol, range } => {
            let mut params = VolatilityParams::default();
            range.apply(&mut params.period, &mut params.interval);
            client.get_volatility_analysis(&symbol, &params).await
        }
        IndicatorCommand::Support {
            symbol,
            range,
            window,
        } => {
            let mut params = SupportResistanceParams::default();
            range.apply(&mut params.period, &mut params.interval);
            params.window = window.unwrap_or(params.window);
            client.get_support_resistance(&symbol, &params).await
        }
        IndicatorCommand::Trend { symbol, range } => {
            let mut params = TrendParams::default();
            range.apply(&mut params.period, &mut params.interval);
            client.get_trend_analysis(&symbol, &params).await
        }
        IndicatorCommand::Summary { symbol } => client.get_technical_summary(&symbol).await,
    };

    ctx.emit(&client, outcome)
}
