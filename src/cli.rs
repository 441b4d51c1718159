//! CLI definition and dispatch.

use chrono::{Local, Months, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_export::CsvExport;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report::JsonReport;
use crate::adapters::text_report::TextReport;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    optional_date, required_date, validate_backtest_config, validate_ranking_config,
};
use crate::domain::error::{Exclusion, InertiaError};
use crate::domain::inertia::InertiaParams;
use crate::domain::ranking::{rank_latest, RankingResult};
use crate::domain::universe::{
    load_universe, parse_codes, require_instruments, LoadOptions, SkipReason, Universe,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

/// Default history fetched before the first decision date.
const DEFAULT_HISTORY_MONTHS: u32 = 36;

#[derive(Parser, Debug)]
#[command(
    name = "inertia",
    about = "Momentum/volatility ranking and monthly rotation backtester"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank the universe on its latest monthly bar
    Rank {
        #[arg(short, long)]
        config: PathBuf,
        /// Rank as of this date (YYYY-MM-DD) instead of today
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the monthly rotation backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write nav.csv and trades.csv into this directory
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the configured data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Rank {
            config,
            as_of,
            format,
            output,
        } => run_rank(&config, as_of, format, output.as_ref()),
        Command::Backtest {
            config,
            format,
            output,
            csv_dir,
        } => run_backtest(&config, format, output.as_ref(), csv_dir.as_ref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

fn fail(err: InertiaError) -> ExitCode {
    error!("{err}");
    (&err).into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

pub fn build_params(adapter: &dyn ConfigPort) -> InertiaParams {
    let defaults = InertiaParams::default();
    let period = |key: &str, default: usize| {
        adapter
            .get_int("indicator", key, default as i64)
            .max(1) as usize
    };
    InertiaParams {
        fast: period("fast", defaults.fast),
        slow: period("slow", defaults.slow),
        period: period("period", defaults.period),
        weight_fast: adapter.get_double("indicator", "weight_fast", defaults.weight_fast),
        weight_slow: adapter.get_double("indicator", "weight_slow", defaults.weight_slow),
        weight_volatility: adapter.get_double(
            "indicator",
            "weight_volatility",
            defaults.weight_volatility,
        ),
    }
}

pub fn build_universe(adapter: &dyn ConfigPort) -> Result<Universe, InertiaError> {
    let codes_str = adapter
        .get_string("universe", "codes")
        .ok_or_else(|| InertiaError::ConfigMissing {
            section: "universe".into(),
            key: "codes".into(),
        })?;
    let codes = parse_codes(&codes_str).map_err(|e| InertiaError::ConfigInvalid {
        section: "universe".into(),
        key: "codes".into(),
        reason: e.to_string(),
    })?;
    let benchmark = adapter
        .get_string("universe", "benchmark")
        .map(|b| b.trim().to_uppercase())
        .filter(|b| !b.is_empty())
        .ok_or_else(|| InertiaError::ConfigMissing {
            section: "universe".into(),
            key: "benchmark".into(),
        })?;
    Ok(Universe { codes, benchmark })
}

pub fn top_k(adapter: &dyn ConfigPort) -> usize {
    adapter.get_int("backtest", "top_k", 2).max(1) as usize
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, InertiaError> {
    let universe = build_universe(adapter)?;
    Ok(BacktestConfig {
        universe: universe.codes,
        benchmark: universe.benchmark,
        params: build_params(adapter),
        top_k: top_k(adapter),
        start_date: required_date(adapter, "backtest", "start_date")?,
        end_date: optional_date(adapter, "backtest", "end_date")?,
    })
}

/// Start of the daily fetch window: `[backtest] history_start`, or enough
/// months before `anchor` to cover the indicator lookback.
pub fn history_start(
    adapter: &dyn ConfigPort,
    anchor: NaiveDate,
    params: &InertiaParams,
) -> Result<NaiveDate, InertiaError> {
    if let Some(date) = optional_date(adapter, "backtest", "history_start")? {
        return Ok(date);
    }
    let months = DEFAULT_HISTORY_MONTHS.max(params.lookback() as u32 + 2);
    Ok(anchor
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN))
}

pub fn data_adapter(adapter: &dyn ConfigPort) -> Result<CsvAdapter, InertiaError> {
    let path = adapter
        .get_string("data", "path")
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| InertiaError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(path.trim())))
}

fn report_for(format: OutputFormat) -> Box<dyn ReportPort> {
    match format {
        OutputFormat::Text => Box::new(TextReport::new()),
        OutputFormat::Json => Box::new(JsonReport::new()),
        OutputFormat::Csv => Box::new(CsvExport::new()),
    }
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>, InertiaError> {
    match path {
        Some(p) => Ok(Box::new(BufWriter::new(fs::File::create(p)?))),
        None => Ok(Box::new(io::stdout().lock())),
    }
}

/// Load the universe and rank every instrument on its latest bar.
///
/// A shortfall against `top_k` is reported as a partial result, not an error.
/// Nothing ranked at all fails with `InsufficientCandidates`.
pub fn run_rank_pipeline(
    data_port: &dyn DataPort,
    universe: &Universe,
    params: &InertiaParams,
    top_k: usize,
    opts: &LoadOptions,
) -> Result<RankingResult, InertiaError> {
    let loaded = load_universe(data_port, universe, opts);
    require_instruments(&loaded)?;

    let unavailable = loaded
        .skipped
        .iter()
        .map(|s| {
            let reason = match &s.reason {
                SkipReason::Excluded(e) => e.clone(),
                SkipReason::DataSource(_) => Exclusion::NoData,
            };
            (s.code.clone(), reason)
        })
        .collect();

    let outcome = rank_latest(
        &loaded.instruments,
        unavailable,
        &universe.codes,
        params,
        top_k,
    );
    let result = RankingResult::from_outcome(outcome, top_k);
    if result.rankings.is_empty() {
        return Err(InertiaError::InsufficientCandidates {
            eligible: 0,
            required: top_k,
        });
    }
    if result.partial {
        warn!(
            ranked = result.rankings.len(),
            top_k, "fewer instruments ranked than requested"
        );
    }
    Ok(result)
}

/// Load the universe and benchmark, then simulate.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    opts: &LoadOptions,
) -> Result<BacktestResult, InertiaError> {
    let universe = Universe {
        codes: bt_config.universe.clone(),
        benchmark: bt_config.benchmark.clone(),
    };
    let loaded = load_universe(data_port, &universe, opts);
    require_instruments(&loaded)?;

    info!(
        instruments = loaded.instruments.len(),
        benchmark = %bt_config.benchmark,
        start = %bt_config.start_date,
        top_k = bt_config.top_k,
        "running backtest"
    );
    backtest_engine::run_backtest(&loaded.instruments, loaded.benchmark.as_ref(), bt_config)
}

fn run_rank(
    config_path: &PathBuf,
    as_of: Option<NaiveDate>,
    format: OutputFormat,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    info!(path = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match rank_command(&adapter, as_of, format, output_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn rank_command(
    adapter: &FileConfigAdapter,
    as_of: Option<NaiveDate>,
    format: OutputFormat,
    output_path: Option<&PathBuf>,
) -> Result<(), InertiaError> {
    validate_ranking_config(adapter)?;
    let universe = build_universe(adapter)?;
    let params = build_params(adapter);
    let top_k = top_k(adapter);
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let opts = LoadOptions {
        history_start: history_start(adapter, as_of, &params)?,
        end_date: as_of,
        include_open_period: adapter.get_bool("backtest", "include_open_period", false),
        as_of,
        atr_period: params.period,
    };
    let data_port = data_adapter(adapter)?;

    info!(codes = universe.count(), %as_of, "ranking universe");
    let result = run_rank_pipeline(&data_port, &universe, &params, top_k, &opts)?;

    let mut out = open_output(output_path)?;
    report_for(format).write_ranking(&result, &mut out)?;
    out.flush()?;
    Ok(())
}

fn run_backtest(
    config_path: &PathBuf,
    format: OutputFormat,
    output_path: Option<&PathBuf>,
    csv_dir: Option<&PathBuf>,
) -> ExitCode {
    info!(path = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match backtest_command(&adapter, format, output_path, csv_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn backtest_command(
    adapter: &FileConfigAdapter,
    format: OutputFormat,
    output_path: Option<&PathBuf>,
    csv_dir: Option<&PathBuf>,
) -> Result<(), InertiaError> {
    validate_backtest_config(adapter)?;
    let bt_config = build_backtest_config(adapter)?;
    let today = Local::now().date_naive();
    let end_date = bt_config.end_date.unwrap_or(today);
    let opts = LoadOptions {
        history_start: history_start(adapter, bt_config.start_date, &bt_config.params)?,
        end_date,
        include_open_period: adapter.get_bool("backtest", "include_open_period", false),
        as_of: today,
        atr_period: bt_config.params.period,
    };
    let data_port = data_adapter(adapter)?;

    let result = run_backtest_pipeline(&data_port, &bt_config, &opts)?;
    info!(
        total_return = %format!("{:.2}%", result.portfolio.total_return),
        cagr = %format!("{:.2}%", result.portfolio.cagr),
        benchmark_cagr = %format!("{:.2}%", result.benchmark.cagr),
        months = result.rebalanced_months,
        skipped = result.skipped_months.len(),
        "backtest complete"
    );

    let mut out = open_output(output_path)?;
    report_for(format).write_backtest(&result, &mut out)?;
    out.flush()?;
    if let Some(path) = output_path {
        info!(path = %path.display(), "report written");
    }

    if let Some(dir) = csv_dir {
        let (nav, trades) = CsvExport::new().export_dir(&result, dir)?;
        info!(nav = %nav.display(), trades = %trades.display(), "CSV export written");
    }
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let checked = if adapter.has_key("backtest", "start_date") {
        validate_backtest_config(&adapter)
    } else {
        validate_ranking_config(&adapter)
    };
    if let Err(e) = checked {
        return fail(e);
    }

    let universe = match build_universe(&adapter) {
        Ok(u) => u,
        Err(e) => return fail(e),
    };
    let params = build_params(&adapter);
    info!("config validated successfully");
    println!("universe:  {}", universe.codes.join(", "));
    println!("benchmark: {}", universe.benchmark);
    println!(
        "indicator: ROC({})*{} + ROC({})*{} over (ATR({})/SMA({}))*{}",
        params.fast,
        params.weight_fast,
        params.slow,
        params.weight_slow,
        params.period,
        params.period,
        params.weight_volatility
    );
    println!("top_k:     {}", top_k(&adapter));
    println!("lookback:  {} months", params.lookback());
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let symbols = match data_adapter(&adapter).and_then(|port| port.list_symbols()) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    for symbol in &symbols {
        println!("{}", symbol);
    }
    info!(count = symbols.len(), "symbols listed");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn cli_parses_rank_with_as_of() {
        let cli = Cli::try_parse_from([
            "inertia", "rank", "-c", "cfg.ini", "--as-of", "2024-03-15", "-f", "json",
        ])
        .unwrap();
        match cli.command {
            Command::Rank { as_of, format, .. } => {
                assert_eq!(as_of, NaiveDate::from_ymd_opt(2024, 3, 15));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn cli_backtest_defaults_to_text() {
        let cli = Cli::try_parse_from(["inertia", "backtest", "--config", "cfg.ini"]).unwrap();
        match cli.command {
            Command::Backtest {
                format, csv_dir, ..
            } => {
                assert_eq!(format, OutputFormat::Text);
                assert!(csv_dir.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn history_start_defaults_to_three_years() {
        let a = adapter("[backtest]\n");
        let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let hs = history_start(&a, start, &InertiaParams::default()).unwrap();
        assert_eq!(hs, NaiveDate::from_ymd_opt(2007, 1, 1).unwrap());
    }

    #[test]
    fn history_start_covers_long_lookback() {
        let a = adapter("[backtest]\n");
        let params = InertiaParams {
            fast: 30,
            slow: 40,
            period: 14,
            ..InertiaParams::default()
        };
        let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let hs = history_start(&a, start, &params).unwrap();
        assert_eq!(hs, NaiveDate::from_ymd_opt(2005, 5, 1).unwrap());
    }

    #[test]
    fn history_start_from_config() {
        let a = adapter("[backtest]\nhistory_start = 2001-06-30\n");
        let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let hs = history_start(&a, start, &InertiaParams::default()).unwrap();
        assert_eq!(hs, NaiveDate::from_ymd_opt(2001, 6, 30).unwrap());
    }

    #[test]
    fn data_adapter_requires_path() {
        let a = adapter("[data]\n");
        assert!(matches!(
            data_adapter(&a),
            Err(InertiaError::ConfigMissing { .. })
        ));
    }
}
