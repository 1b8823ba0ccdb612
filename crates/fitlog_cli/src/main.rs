use std::path::PathBuf;

use clap::{Parser, Subcommand};

use fitlog_cli::commands;

#[derive(Parser)]
#[command(name = "fitlog")]
#[command(author, version, about = "Normalize personal fitness exports into daily tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trim the health export.xml into compact records/workouts tables
    Trim {
        /// Path to the health export.xml
        #[arg(long)]
        xml: PathBuf,
        /// Output directory
        #[arg(long, default_value = "data/processed/trimmed", env = "FITLOG_OUT_DIR")]
        out: PathBuf,
        /// Keep only the last N days
        #[arg(long, default_value_t = 365, env = "FITLOG_SINCE_DAYS",
              value_parser = clap::value_parser!(u32).range(1..))]
        since_days: u32,
        /// Record types to keep (friendly keys or HK identifiers).
        /// Ex: body_mass heart_rate step_count
        #[arg(long, num_args = 0..)]
        types: Vec<String>,
        /// Skip the workouts table
        #[arg(long)]
        no_workouts: bool,
    },
    /// Build the daily health table (weight, BMI, body fat, lean mass)
    Health {
        /// Path to the health export.xml
        #[arg(long)]
        xml: PathBuf,
        /// Output directory
        #[arg(long, default_value = "data/processed", env = "FITLOG_OUT_DIR")]
        outdir: PathBuf,
        /// Keep only the last N days
        #[arg(long, default_value_t = 365, env = "FITLOG_SINCE_DAYS",
              value_parser = clap::value_parser!(u32).range(1..))]
        since_days: u32,
    },
    /// Build the strength tables (daily, per-exercise, personal records)
    Strength {
        /// Path to the strength-log CSV
        #[arg(long)]
        csv: PathBuf,
        /// Output directory
        #[arg(long, default_value = "data/processed", env = "FITLOG_OUT_DIR")]
        outdir: PathBuf,
    },
    /// Build everything including the combined daily dataset
    Build {
        /// Path to the health export.xml
        #[arg(long)]
        xml: PathBuf,
        /// Path to the strength-log CSV
        #[arg(long)]
        strong: PathBuf,
        /// Output directory
        #[arg(long, default_value = "data/processed", env = "FITLOG_OUT_DIR")]
        outdir: PathBuf,
        /// Keep only the last N days
        #[arg(long, default_value_t = 365, env = "FITLOG_SINCE_DAYS",
              value_parser = clap::value_parser!(u32).range(1..))]
        since_days: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let log_env = fitlog_cli::log_filter_from_env_with(|k| std::env::var(k).ok());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&log_env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();

    let cli = Cli::parse();
    let summary = match cli.command {
        Commands::Trim {
            xml,
            out,
            since_days,
            types,
            no_workouts,
        } => serde_json::to_value(commands::trim(
            &xml,
            &out,
            since_days,
            types,
            !no_workouts,
        )?)?,
        Commands::Health {
            xml,
            outdir,
            since_days,
        } => serde_json::to_value(commands::health(&xml, &outdir, since_days)?)?,
        Commands::Strength { csv, outdir } => {
            serde_json::to_value(commands::strength(&csv, &outdir)?)?
        }
        Commands::Build {
            xml,
            strong,
            outdir,
            since_days,
        } => serde_json::to_value(commands::build(&xml, &strong, &outdir, since_days)?)?,
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
