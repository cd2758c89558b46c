//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::alpha_vantage::{API_KEY_ENV, AlphaVantageClient};
use crate::adapters::csv_adapter::{CsvAdapter, CsvOptions};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analysis::{AnalysisConfig, TrendAnalysis, analyze};
use crate::domain::bias::BiasKind;
use crate::domain::config_validation::{
    parse_list, parse_optional_date, validate_analysis_config, validate_data_config,
    validate_simulation_config, validate_sweep_config,
};
use crate::domain::error::BiastraderError;
use crate::domain::metrics::RunMetrics;
use crate::domain::price::PriceSeries;
use crate::domain::simulation::{SimulationConfig, SimulationResult, run_simulation};
use crate::domain::sweep::{SweepConfig, SweepResult, run_sweep};
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(
    name = "biastrader",
    about = "Bias-weighted trading decisions and portfolio simulation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where prices come from and how results are printed.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Price CSV file; overrides the config
    #[arg(long)]
    pub csv: Option<PathBuf>,
    /// Fetch daily closes for this ticker from Alpha Vantage
    #[arg(long)]
    pub symbol: Option<String>,
    /// Print the result record as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Threshold decision for a single day using the trend bias
    Analyze {
        #[command(flatten)]
        source: SourceArgs,
        /// Analyze as of this date (YYYY-MM-DD) instead of the latest day
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Replay the day-by-day portfolio simulation
    Simulate {
        #[command(flatten)]
        source: SourceArgs,
        /// Bias strategy: volatility or trend
        #[arg(long)]
        bias: Option<BiasKind>,
    },
    /// Grid search over threshold, lookback and bias
    Sweep {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Analyze { source, as_of } => run_analyze(&source, as_of),
        Command::Simulate { source, bias } => run_simulate(&source, bias),
        Command::Sweep { source } => run_sweep_command(&source),
        Command::Validate { config } => run_validate(&config),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load the INI file, or an empty config when no path is given.
pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, BiastraderError> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

fn run_analyze(source: &SourceArgs, as_of: Option<NaiveDate>) -> Result<(), BiastraderError> {
    let config = load_config(source.config.as_ref())?;
    let mut analysis_config = build_analysis_config(&config)?;
    if as_of.is_some() {
        analysis_config.as_of = as_of;
    }
    let series = load_series(source, &config)?;

    let analysis = analyze(&series, &analysis_config)?;
    print_analysis(&analysis);
    if source.json {
        print_json(&analysis)?;
    }
    Ok(())
}

fn run_simulate(source: &SourceArgs, bias: Option<BiasKind>) -> Result<(), BiastraderError> {
    let config = load_config(source.config.as_ref())?;
    let mut sim_config = build_simulation_config(&config)?;
    if let Some(bias) = bias {
        sim_config.bias = bias;
    }
    let series = load_series(source, &config)?;

    eprintln!(
        "Simulating {} days with {} bias (threshold {:.2}%, lookback {})",
        series.len(),
        sim_config.bias,
        sim_config.threshold * 100.0,
        sim_config.lookback_days
    );
    let result = run_simulation(&series, &sim_config)?;
    let metrics = RunMetrics::compute(&result);
    print_simulation(&result, &metrics);

    if source.json {
        print_json(&SimulationReport {
            result: &result,
            metrics: &metrics,
        })?;
    }
    Ok(())
}

fn run_sweep_command(source: &SourceArgs) -> Result<(), BiastraderError> {
    let config = load_config(source.config.as_ref())?;
    let base = build_simulation_config(&config)?;
    let sweep = build_sweep_config(&config)?;
    let series = load_series(source, &config)?;

    eprintln!(
        "Sweeping {} combinations over {} days",
        sweep.combinations(),
        series.len()
    );
    let result = run_sweep(&series, &base, &sweep)?;
    print_sweep(&result);

    if source.json {
        print_json(&result)?;
    }
    Ok(())
}

fn run_validate(path: &PathBuf) -> Result<(), BiastraderError> {
    let config = load_config(Some(path))?;
    validate_data_config(&config)?;
    validate_analysis_config(&config)?;
    validate_simulation_config(&config)?;
    validate_sweep_config(&config)?;
    eprintln!("Configuration is valid.");
    Ok(())
}

pub fn build_csv_options(config: &dyn ConfigPort) -> Result<CsvOptions, BiastraderError> {
    validate_data_config(config)?;
    let defaults = CsvOptions::default();
    Ok(CsvOptions {
        date_column: config
            .get_string("data", "date_column")
            .unwrap_or(defaults.date_column),
        close_column: config
            .get_string("data", "close_column")
            .unwrap_or(defaults.close_column),
        date_format: config
            .get_string("data", "date_format")
            .unwrap_or(defaults.date_format),
    })
}

pub fn build_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, BiastraderError> {
    validate_analysis_config(config)?;
    let defaults = AnalysisConfig::default();
    Ok(AnalysisConfig {
        lookback_days: get_u32(config, "analysis", "lookback_days", defaults.lookback_days),
        threshold: config.get_double("analysis", "threshold", defaults.threshold),
        base_shares: get_u32(config, "analysis", "base_shares", defaults.base_shares),
        as_of: parse_optional_date(config, "analysis", "as_of")?,
    })
}

pub fn build_simulation_config(
    config: &dyn ConfigPort,
) -> Result<SimulationConfig, BiastraderError> {
    validate_simulation_config(config)?;
    let defaults = SimulationConfig::default();
    let bias = match config.get_string("simulation", "bias") {
        Some(value) => value.parse().map_err(|reason| BiastraderError::ConfigInvalid {
            section: "simulation".into(),
            key: "bias".into(),
            reason,
        })?,
        None => defaults.bias,
    };
    Ok(SimulationConfig {
        starting_cash: config.get_double("simulation", "starting_cash", defaults.starting_cash),
        threshold: config.get_double("simulation", "threshold", defaults.threshold),
        lookback_days: get_u32(
            config,
            "simulation",
            "lookback_days",
            defaults.lookback_days,
        ),
        bias,
        start_date: parse_optional_date(config, "simulation", "start_date")?,
        end_date: parse_optional_date(config, "simulation", "end_date")?,
    })
}

/// Sweep grid from `[sweep]`; an absent or empty list keeps the default axis.
pub fn build_sweep_config(config: &dyn ConfigPort) -> Result<SweepConfig, BiastraderError> {
    validate_sweep_config(config)?;
    let defaults = SweepConfig::default();
    Ok(SweepConfig {
        thresholds: or_default(parse_list(config, "sweep", "thresholds")?, defaults.thresholds),
        lookbacks: or_default(parse_list(config, "sweep", "lookbacks")?, defaults.lookbacks),
        biases: or_default(parse_list(config, "sweep", "bias")?, defaults.biases),
    })
}

fn or_default<T>(values: Vec<T>, fallback: Vec<T>) -> Vec<T> {
    if values.is_empty() { fallback } else { values }
}

/// Resolve the price source: `--csv`, then `--symbol`, then `[data] csv_path`,
/// then `[data] symbol`.
pub fn load_series(
    source: &SourceArgs,
    config: &dyn ConfigPort,
) -> Result<PriceSeries, BiastraderError> {
    if let Some(path) = &source.csv {
        return load_csv(path, config);
    }
    if let Some(symbol) = &source.symbol {
        return fetch_symbol(symbol, config);
    }
    if let Some(path) = non_blank(config.get_string("data", "csv_path")) {
        return load_csv(&PathBuf::from(path), config);
    }
    if let Some(symbol) = non_blank(config.get_string("data", "symbol")) {
        return fetch_symbol(&symbol, config);
    }
    Err(BiastraderError::ConfigMissing {
        section: "data".into(),
        key: "csv_path".into(),
    })
}

fn load_csv(path: &PathBuf, config: &dyn ConfigPort) -> Result<PriceSeries, BiastraderError> {
    eprintln!("Loading prices from {}", path.display());
    CsvAdapter::new(build_csv_options(config)?).load(path)
}

fn fetch_symbol(symbol: &str, config: &dyn ConfigPort) -> Result<PriceSeries, BiastraderError> {
    let api_key = non_blank(config.get_string("data", "api_key"))
        .or_else(|| non_blank(std::env::var(API_KEY_ENV).ok()))
        .ok_or_else(|| BiastraderError::ConfigMissing {
            section: "data".into(),
            key: "api_key".into(),
        })?;
    let symbol = symbol.trim().to_uppercase();
    eprintln!("Fetching daily closes for {}", symbol);
    AlphaVantageClient::new(api_key)?.fetch_daily(&symbol)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn get_u32(config: &dyn ConfigPort, section: &str, key: &str, default: u32) -> u32 {
    u32::try_from(config.get_int(section, key, i64::from(default))).unwrap_or(default)
}

#[derive(Serialize)]
struct SimulationReport<'a> {
    result: &'a SimulationResult,
    metrics: &'a RunMetrics,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), BiastraderError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| BiastraderError::Io(std::io::Error::other(e)))?;
    println!("{json}");
    Ok(())
}

fn print_analysis(a: &TrendAnalysis) {
    eprintln!("\n=== Trend Analysis ===");
    eprintln!("Today:            {} @ {:.2}", a.today_date, a.today_price);
    eprintln!("Window start:     {} @ {:.2}", a.start_date, a.start_price);
    eprintln!(
        "Change vs start:  {:+.2}% (threshold {:.2}%)",
        a.pct_change_vs_start * 100.0,
        a.threshold * 100.0
    );
    eprintln!(
        "Price delta:      {:+.2} ({:+.2}%)",
        a.window_delta.delta,
        a.window_delta.delta_pct * 100.0
    );
    eprintln!("Bias points:      {:+.4}", a.cumulative_change);
    eprintln!(
        "Bias:             up {:.4}, down {:.4}, net {:.4}, raw {:+.4}",
        a.score.bias_up, a.score.bias_down, a.score.bias_net, a.score.raw_bias
    );
    eprintln!(
        "Multipliers:      buy {:.3}, sell {:.3}",
        a.score.buy_multiplier, a.score.sell_multiplier
    );
    eprintln!(
        "Decision:         {} {} shares (base {})",
        a.decision.action, a.decision.quantity, a.base_shares
    );
}

fn print_simulation(r: &SimulationResult, m: &RunMetrics) {
    eprintln!("\n=== Simulation Results ===");
    eprintln!("Starting Cash:    {:.2}", r.starting_cash);
    eprintln!("Final Cash:       {:.2}", r.final_cash);
    eprintln!("Shares Held:      {}", r.shares_held());
    eprintln!("Final Price:      {:.2} ({})", r.final_price, r.final_date);
    eprintln!("Final Valuation:  {:.2}", r.final_valuation);
    eprintln!(
        "Profit:           {:+.2} ({:+.2}%)",
        r.profit,
        r.profit_pct * 100.0
    );
    eprintln!(
        "Annualized:       {:+.2}%",
        m.annualized_return * 100.0
    );
    eprintln!(
        "Max Drawdown:     -{:.1}% over {} days",
        m.max_drawdown * 100.0,
        m.max_drawdown_duration
    );
    eprintln!(
        "Trades:           {} buys ({} shares), {} sells ({} shares)",
        m.buy_count, m.shares_bought, m.sell_count, m.shares_sold
    );
    match &r.last_decision {
        Some(d) => eprintln!("Last Decision:    {} {} on {}", d.action, d.quantity, d.date),
        None => eprintln!("Last Decision:    none"),
    }
    if !r.lots.is_empty() {
        eprintln!("\n=== Open Lots ===");
        for lot in &r.lots {
            eprintln!(
                "  {}  {:>6} @ {:.2}",
                lot.purchase_date, lot.quantity, lot.purchase_price
            );
        }
    }
}

fn print_sweep(s: &SweepResult) {
    eprintln!("\n=== Sweep Results ({} runs) ===", s.entries.len());
    let mut ranked: Vec<_> = s.entries.iter().collect();
    ranked.sort_by(|a, b| b.profit_pct.total_cmp(&a.profit_pct));
    for entry in ranked.iter().take(10) {
        eprintln!(
            "  {:<10} lookback {:>3}  threshold {:>5.2}%  profit {:+.2}%  ({} buys, {} sells)",
            entry.bias.to_string(),
            entry.lookback_days,
            entry.threshold * 100.0,
            entry.profit_pct * 100.0,
            entry.buys,
            entry.sells
        );
    }
    eprintln!(
        "\nBest: {} bias, lookback {}, threshold {:.2}% -> valuation {:.2} ({:+.2}%)",
        s.best.bias,
        s.best.lookback_days,
        s.best.threshold * 100.0,
        s.best.final_valuation,
        s.best.profit_pct * 100.0
    );
}
