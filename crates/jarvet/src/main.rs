use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use jarvet_core::archive::Archive;
use jarvet_core::catalog::{known_profile, Profile, ProfileCatalog};
use jarvet_core::config::Config;
use jarvet_core::pipeline::AnalysisPipeline;
use jarvet_core::types::Severity;

use jarvet_report::{dot, json, text};

#[derive(Parser)]
#[command(name = "jarvet")]
#[command(about = "Detect classloading hazards in packaged application archives")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Dot,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an archive snapshot and print a full report
    Analyze {
        /// Path to the scanned-archive snapshot (JSON)
        snapshot: PathBuf,
        /// Config file path (defaults to .jarvet.toml near the snapshot)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },
    /// Analyze and exit with code 0 (pass) or 1 (fail)
    Check {
        /// Path to the scanned-archive snapshot (JSON)
        snapshot: PathBuf,
        /// Minimum finding severity to cause failure
        #[arg(long, default_value = "error")]
        fail_on: String,
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Create a default .jarvet.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            snapshot,
            config,
            format,
            compact,
        } => cmd_analyze(&snapshot, config.as_deref(), format, compact),
        Commands::Check {
            snapshot,
            fail_on,
            config,
        } => cmd_check(&snapshot, &fail_on, config.as_deref()),
        Commands::Init { force } => cmd_init(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(2);
    }
}

fn cmd_analyze(
    snapshot: &Path,
    config_path: Option<&Path>,
    format: OutputFormat,
    compact: bool,
) -> Result<()> {
    let config = load_config(snapshot, config_path)?;
    let report = run_analysis(snapshot, config)?;

    match format {
        OutputFormat::Text => print!("{}", text::format_report(&report)),
        OutputFormat::Json => println!("{}", json::format_report(&report, compact)),
        OutputFormat::Dot => print!("{}", dot::generate_graph(&report)),
    }
    Ok(())
}

fn cmd_check(snapshot: &Path, fail_on_str: &str, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(snapshot, config_path)?;
    let fail_on: Severity = fail_on_str.parse()?;
    let report = run_analysis(snapshot, config)?;
    let (output, passed) = text::format_check(&report, fail_on);
    print!("{output}");
    if !passed {
        process::exit(1);
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let target = PathBuf::from(".jarvet.toml");
    if target.exists() && !force {
        anyhow::bail!(".jarvet.toml already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml())?;
    println!("Created .jarvet.toml with default configuration.");
    Ok(())
}

fn load_config(snapshot: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(p) => Config::load(p),
        None => {
            let start = snapshot.parent().unwrap_or_else(|| Path::new("."));
            Ok(Config::load_or_default(start))
        }
    }
}

fn load_snapshot(path: &Path) -> Result<Vec<Archive>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot '{}'", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse snapshot '{}'", path.display()))
}

fn build_catalog(config: &Config) -> Result<ProfileCatalog> {
    let mut catalog = ProfileCatalog::new();
    for source in &config.profiles {
        let (name, class_version, origin) = match known_profile(&source.code) {
            Some(meta) => (
                source.name.clone().unwrap_or_else(|| meta.name.to_string()),
                source.class_version.unwrap_or(meta.class_version),
                source
                    .origin
                    .clone()
                    .unwrap_or_else(|| meta.origin.to_string()),
            ),
            None => (
                source.name.clone().with_context(|| {
                    format!(
                        "profile '{}' is not built in; set name, class_version, and origin",
                        source.code
                    )
                })?,
                source.class_version.with_context(|| {
                    format!("profile '{}' is missing class_version", source.code)
                })?,
                source
                    .origin
                    .clone()
                    .with_context(|| format!("profile '{}' is missing origin", source.code))?,
            ),
        };
        let profile = Profile::load(&source.code, &name, class_version, &origin, &source.path)
            .with_context(|| format!("failed to load profile '{}'", source.code))?;
        catalog.register(profile);
    }
    Ok(catalog)
}

fn run_analysis(snapshot: &Path, config: Config) -> Result<jarvet_core::AnalysisReport> {
    let roots = load_snapshot(snapshot)?;
    let catalog = build_catalog(&config)?;
    let pipeline = AnalysisPipeline::new(config, catalog)?;
    let report = pipeline.analyze(&roots)?;

    for skipped in &report.skipped {
        eprintln!(
            "Warning: skipping malformed archive '{}': {}",
            skipped.name, skipped.reason
        );
    }
    Ok(report)
}
