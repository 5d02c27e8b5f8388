use std::{
    fs,
    io::{self, Read, Write},
    path::PathBuf,
    process::ExitCode,
    time::Instant,
};

use clap::{Parser, Subcommand, ValueEnum};
use item_recommender::{Endpoint, RecommendError, Recommender, RecommenderConfig, Result, Service};
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "item-recommender", about = "Item-based recommender over per-category ratings")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// override the configured number of recommendations
    #[arg(long, global = true)]
    top_n: Option<usize>,
    /// response encoding
    #[arg(long, global = true, value_enum, default_value_t = Output::Json)]
    output: Output,
    /// request file, stdin when omitted
    #[arg(long, short, global = true)]
    input: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// records + category -> {item: {user: rating}}
    Matrix,
    /// {item: {user: rating}} -> {item: {item: similarity}}
    Similarity,
    /// user + rating matrix + similarity matrix -> recommended items
    Recommend,
    /// records + user -> recommendations for every category
    Catalog,
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    Json,
    Cbor,
}

impl Command {
    fn endpoint(&self) -> Endpoint {
        match self {
            Command::Matrix => Endpoint::UserItemMatrix,
            Command::Similarity => Endpoint::ItemSimilarity,
            Command::Recommend => Endpoint::Recommend,
            Command::Catalog => Endpoint::RecommendAll,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = RecommenderConfig::load(cli.config.as_deref())?;
    if let Some(n) = cli.top_n {
        config.top_n = n;
    }
    let service = Service::new(Recommender::new(config));

    let raw = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let body: Value = serde_json::from_str(&raw)?;

    let endpoint = cli.command.endpoint();
    let start = Instant::now();
    let response = service.dispatch(endpoint, body)?;
    info!(
        endpoint = endpoint.path(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "request served"
    );

    let mut stdout = io::stdout().lock();
    match cli.output {
        Output::Json => {
            serde_json::to_writer(&mut stdout, &response)?;
            writeln!(stdout)?;
        }
        Output::Cbor => {
            let bytes = serde_cbor::to_vec(&response).map_err(RecommendError::from)?;
            stdout.write_all(&bytes)?;
        }
    }
    Ok(())
}
