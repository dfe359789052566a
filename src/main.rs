use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pkgvet::{
    analyzer::{analyze, AnalyzeOptions},
    cache::Cache,
    config::Config,
    logging::{self, Verbosity},
    model::AnalysisReport,
    output::{self, print_patterns, print_report, OutputFormat},
    registry::{PyPiRegistry, Registry},
    risk::RiskScore,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const RISK_THRESHOLD: u8 = 10;
}

#[derive(Parser)]
#[command(name = "pkgvet")]
#[command(
    author,
    version,
    about = "Static vetting of Python package archives before installation"
)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence diagnostic output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a local package archive
    Scan {
        /// Path to a .tar.gz source distribution or .whl wheel
        archive: PathBuf,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Scan files concurrently
        #[arg(long)]
        parallel: bool,

        /// Keep the extracted tree on disk after analysis
        #[arg(long)]
        keep_tree: bool,

        /// Exit with an error code if the risk reaches this level
        #[arg(long, value_enum)]
        fail_on: Option<FailLevel>,

        /// Clear the cache before running
        #[arg(long)]
        clear_cache: bool,
    },

    /// Download a package archive from PyPI
    Fetch {
        /// Package name on the index
        name: String,

        /// Exact version (defaults to the latest release)
        #[arg(long)]
        version: Option<String>,

        /// Directory to download into
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Analyze the downloaded archive immediately
        #[arg(long)]
        scan: bool,

        /// Output format when --scan is given (table, json)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// List the indicator patterns the scanner looks for
    Patterns,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Clear the cache
    ClearCache,
}

#[derive(Clone, Copy, ValueEnum)]
enum FailLevel {
    High,
    Moderate,
    Never,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Scan {
            archive,
            format,
            output,
            parallel,
            keep_tree,
            fail_on,
            clear_cache,
        } => {
            if clear_cache {
                let cache = Cache::new();
                cache.clear()?;
            }

            let format_str = format.unwrap_or(config.default_format.clone());
            let parallel = parallel || config.parallel_scan;

            run_scan(&archive, format_str, output, parallel, keep_tree, fail_on).await
        }
        Commands::Fetch {
            name,
            version,
            dir,
            scan,
            format,
        } => {
            let dir = dir.unwrap_or(config.download_dir.clone());
            let format_str = format.unwrap_or(config.default_format.clone());
            run_fetch(&name, version, &dir, scan, format_str, &config).await
        }
        Commands::Patterns => {
            print_patterns();
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache => {
            let cache = Cache::new();
            cache.clear()?;
            println!("Cache cleared.");
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(
    archive: &Path,
    format: String,
    output_file: Option<String>,
    parallel: bool,
    keep_tree: bool,
    fail_on: Option<FailLevel>,
) -> Result<u8> {
    let format = OutputFormat::from_str(&format).map_err(|e| anyhow::anyhow!(e))?;
    let is_interactive = format == OutputFormat::Table && output_file.is_none();

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Analyzing {}...", archive.display()));
        Some(pb)
    } else {
        None
    };

    let options = AnalyzeOptions {
        parallel,
        keep_tree,
        cancel: None,
    };
    let report = analyze(archive, &options).await;

    if let Some(pb) = progress {
        match &report {
            Ok(report) => pb.finish_with_message(format!(
                "Found {} findings in {} files",
                report.scan.total_findings(),
                report.scan.files.len()
            )),
            Err(_) => pb.finish_and_clear(),
        }
    }

    let report = report?;

    // Handle output
    if let Some(path) = output_file {
        let content = output::format_report_to_string(&report, format)?;
        std::fs::write(&path, content)?;
        println!("Report written to: {}", path);
    } else {
        print_report(&report, format)?;
    }

    Ok(determine_exit_code(&report, fail_on))
}

async fn run_fetch(
    name: &str,
    version: Option<String>,
    dir: &Path,
    scan_after: bool,
    format: String,
    config: &Config,
) -> Result<u8> {
    let registry = PyPiRegistry::with_cache(Cache::with_ttl_seconds(config.cache_ttl_seconds));

    let version = match version {
        Some(version) => version,
        None => {
            let latest = registry.latest_version(name).await?;
            println!("Latest version of {}: {}", name, latest);
            latest
        }
    };

    let release = registry.release_info(name, &version).await?;
    println!("Downloading {} {} ({})...", name, version, release.filename);

    let path = registry.download(&release, dir).await?;
    println!("Saved to: {}", path.display());

    if scan_after {
        return run_scan(&path, format, None, config.parallel_scan, false, None).await;
    }

    Ok(exit_codes::SUCCESS)
}

/// Maps the report's risk score onto an exit code per --fail-on.
fn determine_exit_code(report: &AnalysisReport, fail_on: Option<FailLevel>) -> u8 {
    let fail_on = match fail_on {
        Some(level) => level,
        None => return exit_codes::SUCCESS,
    };

    let risk = report.scan.risk;
    let exceeded = match fail_on {
        FailLevel::High => risk >= RiskScore::High,
        FailLevel::Moderate => risk >= RiskScore::Moderate,
        FailLevel::Never => false,
    };

    if exceeded {
        exit_codes::RISK_THRESHOLD
    } else {
        exit_codes::SUCCESS
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'pkgvet config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
