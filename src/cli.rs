//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

use crate::adapters::csv_adapter::CsvDirStrategy;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::fred_adapter::FredAdapter;
use crate::adapters::http_client::ReqwestHttp;
use crate::adapters::json_chart_adapter::JsonChartAdapter;
use crate::adapters::nasdaq::{BulkExportStrategy, PerSymbolStrategy};
use crate::adapters::system_clock::SystemClock;
use crate::adapters::yaml_portfolio_adapter::{load_portfolio, sample_portfolio, save_portfolio};
use crate::domain::analysis::{Analyzer, PortfolioReport};
use crate::domain::basket::LabeledConfig;
use crate::domain::benchmark::BenchmarkSource;
use crate::domain::cache::PriceCache;
use crate::domain::error::RollfolioError;
use crate::domain::price_store::PriceStore;
use crate::domain::settings::{Credentials, Settings};
use crate::ports::clock_port::Clock;
use crate::ports::http_port::HttpPort;
use crate::ports::price_port::AcquisitionStrategy;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "rollfolio",
    version,
    about = "Rollover-compounded basket portfolio tracker"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunOptions {
    /// INI settings file
    #[arg(short, long)]
    pub settings: Option<PathBuf>,
    /// Output directory (defaults to [output] dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Read `<SYMBOL>.csv` price files from this directory instead of the network
    #[arg(long)]
    pub prices_dir: Option<PathBuf>,
    /// Skip the benchmark even when a key is configured
    #[arg(long)]
    pub no_benchmark: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one portfolio
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Compare 2 to 5 portfolios, ranked by total return
    Compare {
        #[arg(required = true)]
        configs: Vec<PathBuf>,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Validate a portfolio document without fetching prices
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Write a sample portfolio document
    Init {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        force: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Analyze { config, options } => run_analyze(&config, &options),
        Command::Compare { configs, options } => run_compare(&configs, &options),
        Command::Validate { config } => run_validate(&config),
        Command::Init { config, force } => run_init(&config, force),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Price store, optional benchmark and output directory for one run.
pub struct Pipeline {
    pub store: PriceStore,
    pub benchmark: Option<BenchmarkSource>,
    pub output_dir: PathBuf,
}

pub fn load_settings(path: Option<&Path>) -> Result<(FileConfigAdapter, Settings), RollfolioError> {
    let adapter = match path {
        Some(p) => FileConfigAdapter::from_file(p)?,
        None => FileConfigAdapter::empty(),
    };
    let settings = Settings::from_config(&adapter)?;
    Ok((adapter, settings))
}

/// Wires adapters from settings. With `prices_dir` the run is fully offline:
/// no credentials are read and no benchmark is fetched.
pub fn build_pipeline(options: &RunOptions) -> Result<Pipeline, RollfolioError> {
    let (adapter, settings) = load_settings(options.settings.as_deref())?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = PriceCache::new(settings.cache_ttl, clock.clone());
    let output_dir = options
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.output_dir));

    if let Some(dir) = &options.prices_dir {
        info!(dir = %dir.display(), "using local price files");
        let strategies: Vec<Box<dyn AcquisitionStrategy>> =
            vec![Box::new(CsvDirStrategy::new(dir.clone()))];
        return Ok(Pipeline {
            store: PriceStore::new(strategies, cache),
            benchmark: None,
            output_dir,
        });
    }

    let credentials = Credentials::from_env(&adapter)?;
    let http: Arc<dyn HttpPort> = Arc::new(ReqwestHttp::new(settings.request_timeout).map_err(
        |e| RollfolioError::Acquisition {
            reason: e.to_string(),
        },
    )?);

    let strategies: Vec<Box<dyn AcquisitionStrategy>> = vec![
        Box::new(BulkExportStrategy::new(
            http.clone(),
            clock.clone(),
            &credentials.price_key,
            &settings.nasdaq_url,
            settings.poll,
        )),
        Box::new(PerSymbolStrategy::new(
            http.clone(),
            clock.clone(),
            &credentials.price_key,
            &settings.nasdaq_url,
            settings.symbol_delay,
        )),
    ];

    let benchmark = match credentials.benchmark_key {
        Some(key) if !options.no_benchmark => Some(BenchmarkSource::new(
            Box::new(FredAdapter::new(http, key, &settings.fred_url)),
            settings.benchmark_series.clone(),
        )),
        _ => None,
    };

    Ok(Pipeline {
        store: PriceStore::new(strategies, cache),
        benchmark,
        output_dir,
    })
}

fn writers() -> Vec<Box<dyn ReportPort>> {
    vec![Box::new(CsvReportAdapter), Box::new(JsonChartAdapter)]
}

fn run_analyze(config_path: &Path, options: &RunOptions) -> Result<(), RollfolioError> {
    let labeled = load_portfolio(config_path)?;
    info!(portfolio = %labeled.label, "loaded {}", config_path.display());

    let pipeline = build_pipeline(options)?;
    let analyzer = Analyzer::new(&pipeline.store, pipeline.benchmark.as_ref());
    let report = analyzer.analyze(&labeled)?;

    for writer in writers() {
        writer.write(&report, &pipeline.output_dir)?;
    }
    print!("{}", format_summary(std::slice::from_ref(&report)));
    Ok(())
}

fn run_compare(config_paths: &[PathBuf], options: &RunOptions) -> Result<(), RollfolioError> {
    let configs = config_paths
        .iter()
        .map(|p| load_portfolio(p))
        .collect::<Result<Vec<LabeledConfig>, _>>()?;

    let pipeline = build_pipeline(options)?;
    let analyzer = Analyzer::new(&pipeline.store, pipeline.benchmark.as_ref());
    let reports = analyzer.compare(&configs)?;

    for writer in writers() {
        writer.write_comparison(&reports, &pipeline.output_dir)?;
    }
    print!("{}", format_summary(&reports));
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), RollfolioError> {
    let labeled = load_portfolio(config_path)?;
    let config = &labeled.config;
    println!(
        "{}: {} baskets, {} symbols, {} to {}",
        labeled.label,
        config.baskets().len(),
        config.symbols().len(),
        config.start_date(),
        config.end_date()
    );
    for (i, basket) in config.baskets().iter().enumerate() {
        let window = config.window(i);
        println!(
            "  basket {}: [{}, {}) {}",
            i + 1,
            window.start,
            window.end,
            basket.tickers().join(", ")
        );
    }
    Ok(())
}

fn run_init(config_path: &Path, force: bool) -> Result<(), RollfolioError> {
    if config_path.exists() && !force {
        return Err(RollfolioError::config(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )));
    }
    save_portfolio(config_path, &sample_portfolio()?)?;
    println!("wrote sample portfolio to {}", config_path.display());
    Ok(())
}

fn pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Fixed-width table of the headline metrics, one row per report.
pub fn format_summary(reports: &[PortfolioReport]) -> String {
    let mut out = format!(
        "{:<24} {:>10} {:>10} {:>8} {:>10} {:>10} {:>10}\n",
        "portfolio", "total", "annual", "sharpe", "max_dd", "benchmark", "excess"
    );
    for r in reports {
        let m = &r.metrics;
        out.push_str(&format!(
            "{:<24} {:>10} {:>10} {:>8} {:>10} {:>10} {:>10}\n",
            r.label,
            pct(Some(m.total_return)),
            pct(Some(m.annualized_return)),
            m.sharpe_ratio
                .map(|s| format!("{s:.2}"))
                .unwrap_or_else(|| "n/a".to_string()),
            pct(Some(m.max_drawdown)),
            pct(m.benchmark_total_return),
            pct(m.outperformance),
        ));
    }
    out
}
