use clap::{Parser, Subcommand};
use config_gen::generate::{self, GenerateError, GenerationSummary};
use config_gen::{config, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "config-gen")]
#[command(about = "Generate per-environment config from templates and property filters")]
#[command(long_about = "\
Generate per-environment config from templates and property filters

Every file under the filters directory is one environment, written as
key=value property lines. Every file under the templates directory is
rendered once per environment, replacing ${key} placeholders.

Layout:

  src/config/
  ├── filters/
  │   ├── dev.properties           # host=localhost
  │   └── eu/prod.properties       # host=eu.example.com
  └── templates/
      ├── app.conf                 # server=${host}
      └── bin/start.sh

  target/generated-config/
  ├── dev/app.conf                 # server=localhost
  ├── dev/bin/start.sh
  ├── eu/prod/app.conf             # server=eu.example.com
  └── eu/prod/bin/start.sh

Keys defined by some filters but not others are reported per filter.
Run 'config-gen gen-config' to print a documented config-gen.toml.")]
#[command(version)]
struct Cli {
    /// Config file (optional; defaults apply when absent)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Templates directory
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    /// Filters directory
    #[arg(long, global = true)]
    filters: Option<PathBuf>,

    /// Additional filter root for overlay files (repeatable, highest priority first)
    #[arg(long = "external-filters", global = true)]
    external_filters: Vec<PathBuf>,

    /// Output directory (deleted and recreated)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Report missing properties as a warning instead of failing
    #[arg(long, global = true)]
    allow_missing: bool,

    /// Write the missing property report as JSON to this file
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clear the output directory and generate every filter × template
    Generate,
    /// Render everything in memory and report missing properties
    Check,
    /// Print a stock config-gen.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Generate => {
            let config = config::load_config(&cli.config, cli_overrides(&cli))?;
            let summary = finish(generate::run(&config), cli.report.as_deref())?;
            output::print_generate_output(&summary, &config.output_base_path);
        }
        Command::Check => {
            let config = config::load_config(&cli.config, cli_overrides(&cli))?;
            let summary = finish(generate::check(&config), cli.report.as_deref())?;
            output::print_check_output(&summary);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Command-line flags as a TOML table layered over the config file.
fn cli_overrides(cli: &Cli) -> Option<toml::Value> {
    let mut table = toml::map::Map::new();
    let mut set_path = |key: &str, path: &Option<PathBuf>| {
        if let Some(p) = path {
            table.insert(
                key.to_string(),
                toml::Value::String(p.to_string_lossy().into_owned()),
            );
        }
    };
    set_path("templates_base_path", &cli.templates);
    set_path("filters_base_path", &cli.filters);
    set_path("output_base_path", &cli.output);

    if !cli.external_filters.is_empty() {
        let paths = cli
            .external_filters
            .iter()
            .map(|p| toml::Value::String(p.to_string_lossy().into_owned()))
            .collect();
        table.insert(
            "external_filter_base_paths".to_string(),
            toml::Value::Array(paths),
        );
    }
    if cli.allow_missing {
        table.insert(
            "fail_on_missing_property".to_string(),
            toml::Value::Boolean(false),
        );
    }

    (!table.is_empty()).then_some(toml::Value::Table(table))
}

/// Write the JSON report if requested, also when the run failed on missing
/// properties, then hand back the run result. A run that aborted before
/// finishing leaves any existing report untouched.
fn finish(
    result: Result<GenerationSummary, GenerateError>,
    report_path: Option<&Path>,
) -> Result<GenerationSummary, Box<dyn std::error::Error>> {
    if let (Some(path), Some(report)) = (report_path, generate::reported_missing(&result)) {
        std::fs::write(path, serde_json::to_string_pretty(report)?)?;
    }
    Ok(result?)
}
