use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use chatsim::{simulate, SimulationConfig};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chatsim-eval")]
#[command(about = "Simulate users against a dialogue system and report its success rate")]
struct Args {
    /// Simulation config file (YAML/JSON). Built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of generated conversations
    #[arg(long)]
    runs: Option<usize>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Turn ceiling per conversation
    #[arg(long)]
    max_turns: Option<usize>,

    /// Output path for the JSON report
    #[arg(long)]
    out: Option<PathBuf>,

    /// Keep every conversation transcript in the report
    #[arg(long)]
    transcripts: bool,

    /// Print the JSON schema of the config file and exit
    #[arg(long)]
    print_schema: bool,
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn default_out_path() -> PathBuf {
    let ts = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    PathBuf::from(format!("runs/{ts}.json"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.print_schema {
        let schema = schemars::schema_for!(SimulationConfig);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(runs) = args.runs {
        config.runs = runs;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(max_turns) = args.max_turns {
        config.max_turns = max_turns;
    }
    config.validate()?;

    let report = simulate(&config, args.transcripts)?;

    let out_path = args.out.unwrap_or_else(default_out_path);
    ensure_parent_dir(&out_path)?;
    let mut writer = BufWriter::new(fs::File::create(&out_path)?);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writer.flush()?;

    println!("{}", report.summary());
    println!("Report: {}", out_path.display());

    for conversation in report.failures().filter(|c| c.failed) {
        println!("System failure in conversation {} after {} turns", conversation.index, conversation.turns);
    }

    Ok(())
}
