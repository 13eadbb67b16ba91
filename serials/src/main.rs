use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use inventory_csv::ReportWriter;
use std::path::PathBuf;
use std::sync::Arc;
use systeminfo::{HttpGet, QueryOptions, SweepOptions, SweepSummary, SystemInfoClient};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

mod config;

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| String::new())
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
enum OutputFormat { #[default] Text, Json }

#[derive(Debug, Parser)]
#[command(name = "serials", version, about = "Collect device serial numbers from systeminfo endpoints")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./serials.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Only warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args, Default)]
struct RunArgs {
    /// Host list; the first column of each row is queried (default: ip_list.csv)
    #[arg(long, value_name = "FILE")]
    targets: Option<PathBuf>,
    /// Two-line secret: username, then password (default: password.txt)
    #[arg(long, value_name = "FILE")]
    credentials: Option<PathBuf>,
    /// Report file, overwritten on every run (default: results.csv)
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
    /// Timeout per request in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds
    #[arg(long)]
    connect_timeout_ms: Option<u64>,
    /// Hosts queried at once; 1 queries strictly one after another
    #[arg(long)]
    concurrency: Option<usize>,
    /// URL scheme
    #[arg(long, value_parser = ["https", "http"])]
    scheme: Option<String>,
    /// Completion summary format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Query every host and write the serial number report
    Run(RunArgs),
    /// Create template host list and credential files if they are missing
    Init {
        #[arg(long, value_name = "FILE", default_value = "ip_list.csv")]
        targets: PathBuf,
        #[arg(long, value_name = "FILE", default_value = "password.txt")]
        credentials: PathBuf,
    },
}

/// Effective run settings: CLI flags over config file over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    targets: PathBuf,
    credentials: PathBuf,
    out: PathBuf,
    query: QueryOptions,
    scheme: String,
    concurrency: usize,
}

impl Settings {
    fn resolve(args: &RunArgs, cfg: Option<&config::RunConfig>) -> Self {
        let mut s = Settings {
            targets: PathBuf::from("ip_list.csv"),
            credentials: PathBuf::from("password.txt"),
            out: PathBuf::from("results.csv"),
            query: QueryOptions::default(),
            scheme: "https".into(),
            concurrency: 1,
        };
        if let Some(c) = cfg {
            if let Some(v) = &c.targets { s.targets = v.clone(); }
            if let Some(v) = &c.credentials { s.credentials = v.clone(); }
            if let Some(v) = &c.out { s.out = v.clone(); }
            if let Some(v) = c.timeout_ms { s.query.timeout_ms = v; }
            if let Some(v) = c.connect_timeout_ms { s.query.connect_timeout_ms = v; }
            if let Some(v) = c.concurrency { s.concurrency = v; }
            if let Some(v) = &c.scheme { s.scheme = v.clone(); }
            if let Some(v) = &c.user_agent { s.query.user_agent = v.clone(); }
        }
        if let Some(v) = &args.targets { s.targets = v.clone(); }
        if let Some(v) = &args.credentials { s.credentials = v.clone(); }
        if let Some(v) = &args.out { s.out = v.clone(); }
        if let Some(v) = args.timeout_ms { s.query.timeout_ms = v; }
        if let Some(v) = args.connect_timeout_ms { s.query.connect_timeout_ms = v; }
        if let Some(v) = args.concurrency { s.concurrency = v; }
        if let Some(v) = &args.scheme { s.scheme = v.clone(); }
        s.concurrency = s.concurrency.clamp(1, systeminfo::MAX_CONCURRENCY);
        s
    }

    fn sweep_options(&self) -> SweepOptions {
        SweepOptions { scheme: self.scheme.clone(), concurrency: self.concurrency }
    }
}

#[derive(Debug)]
struct RunReport {
    summary: SweepSummary,
    rows: usize,
    started_at: String,
    ended_at: String,
}

/// Load inputs, open the report, sweep. Inputs are validated before the report is created,
/// so a fatal input error leaves no report behind.
async fn run<E: HttpGet>(settings: &Settings, executor: Arc<E>) -> Result<RunReport> {
    let credential = credentials::load_credential(&settings.credentials)?;
    let targets = inventory_csv::load_targets(&settings.targets)?;
    log::info!("{} targets loaded from {}", targets.len(), settings.targets.display());
    let mut sink = ReportWriter::create(&settings.out)?;
    let started_at = now_rfc3339();
    let summary = systeminfo::sweep(&targets, &credential, executor, &mut sink, &settings.sweep_options())
        .await
        .with_context(|| format!("failed writing report '{}'", settings.out.display()))?;
    Ok(RunReport { summary, rows: sink.rows(), started_at, ended_at: now_rfc3339() })
}

fn print_report(settings: &Settings, report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let kinds = report.summary.by_kind.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join(", ");
            println!("All queries processed. Results saved to '{}'", settings.out.display());
            println!("{} rows ({}) [{} .. {}]", report.rows, if kinds.is_empty() { "none".to_string() } else { kinds }, report.started_at, report.ended_at);
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "out": settings.out,
                "rows": report.rows,
                "succeeded": report.summary.succeeded(),
                "failed": report.summary.failed(),
                "by_kind": report.summary.by_kind,
                "started_at": report.started_at,
                "ended_at": report.ended_at,
            });
            println!("{}", serde_json::to_string(&obj)?);
        }
    }
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose { builder.filter_level(log::LevelFilter::Debug); }
    if quiet { builder.filter_level(log::LevelFilter::Warn); }
    builder.format_target(false).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    match cli.command {
        Commands::Version => {
            println!("serials {} (core {})", env!("CARGO_PKG_VERSION"), sweep_core::version());
        }
        Commands::Init { targets, credentials: secret } => {
            for (path, created) in [
                (&targets, inventory_csv::write_template(&targets)?),
                (&secret, credentials::write_template(&secret)?),
            ] {
                if created {
                    println!("created {} (edit it before running)", path.display());
                } else {
                    println!("kept existing {}", path.display());
                }
            }
        }
        Commands::Run(args) => {
            let loaded_cfg = config::load_config(cli.config.as_deref())?;
            let settings = Settings::resolve(&args, loaded_cfg.as_ref().and_then(|c| c.run.as_ref()));
            log::debug!("settings: {:?}", settings);
            let executor = Arc::new(SystemInfoClient::new(&settings.query));
            let rt = tokio::runtime::Runtime::new()?;
            let report = rt.block_on(run(&settings, executor))?;
            print_report(&settings, &report, args.format)?;
            if report.rows != report.summary.total {
                return Err(anyhow!("report has {} rows for {} targets", report.rows, report.summary.total));
            }
        }
    }
    Ok(())
}
