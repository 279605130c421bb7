mod client;
mod config;
mod db;
mod lookup;
mod report;
mod resolver;
mod server;

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use config::Config;
use db::PropertyStore;
use report::{export, Report, ReportConfig};

#[derive(Parser)]
#[command(name = "revalix", about = "Property record API and address lookup")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the read-only property API
    Serve {
        /// Bind address (default: REVALIX_BIND or 0.0.0.0:8000)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Resolve an address, fetch its records from the API and print the report
    Lookup {
        /// Free-form property address
        address: String,
        /// Directory for the CSV and JSON exports
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
        /// Print the report only
        #[arg(long)]
        no_export: bool,
    },
    /// Build the report for an account straight from the local store
    Report {
        /// Parcel account number
        acct: String,
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Print the normalized form of an address
    Normalize { address: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let config = Config::from_env();

    let result = match cli.command {
        Commands::Serve { bind } => {
            let report_config = ReportConfig::load(config.mapping_file.as_deref())?;
            let store = PropertyStore::new(
                &config.db_path,
                report_config.table_names(),
                config.timeout,
            );
            let bind = bind.unwrap_or_else(|| config.bind_addr.clone());
            server::serve(&bind, server::AppState::new(store)).await
        }
        Commands::Lookup {
            address,
            out_dir,
            no_export,
        } => {
            let report_config = ReportConfig::load(config.mapping_file.as_deref())?;
            let resolver = resolver::AttomResolver::new(config.attom_api_key()?, config.timeout)?
                .with_endpoint(&config.attom_url);
            let api = client::ApiClient::new(&config.api_url, config.timeout)?;

            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
            pb.set_message("Retrieving property data...");
            pb.enable_steady_tick(Duration::from_millis(100));
            let outcome = lookup::run_lookup(&report_config, &resolver, &api, &address).await;
            pb.finish_and_clear();

            let found = outcome?;

            println!("Normalized Property Address: {}\n", found.normalized);
            print!("{}", found.report.render_text(&report_config));

            if !no_export {
                let (csv_path, json_path) =
                    export::write_exports(&out_dir, &found.normalized, &found.report.record)?;
                println!("\nWrote {} and {}", csv_path.display(), json_path.display());
            }
            Ok(())
        }
        Commands::Report { acct, format } => {
            let report_config = ReportConfig::load(config.mapping_file.as_deref())?;
            let store = PropertyStore::new(
                &config.db_path,
                report_config.table_names(),
                config.timeout,
            );
            let rows = store.fetch(&acct).await?;
            let report = Report::build(&report_config, &acct, &rows);
            if report.record.is_empty() {
                println!("No property data found in database for {}.", acct);
                return Ok(());
            }
            match format {
                Format::Text => print!("{}", report.render_text(&report_config)),
                Format::Csv => std::io::stdout()
                    .write_all(&export::to_csv(&report.record)?)
                    .context("Failed to write CSV to stdout")?,
                Format::Json => println!("{}", export::to_json(&report.record)?),
            }
            Ok(())
        }
        Commands::Normalize { address } => {
            println!("{}", resolver::normalize_address(&address));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
