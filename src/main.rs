use anyhow::{Context, Result};
use seq_dataset::{
    DatasetConfig, build_vocab_from_dir, get_minibatch_iterator, load_corpus_from_dir, telemetry,
};
use std::path::PathBuf;
use tracing::{Level, info, warn};
use tracing_subscriber::{Layer, filter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Load environment variables from .env file when present.
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err).context("reading .env");
        }
    }

    let filter = telemetry::env_filter_with_level("info", Level::INFO);
    let own_events = fmt::layer()
        .with_target(false)
        .with_filter(filter::filter_fn(|meta| {
            meta.target().starts_with(env!("CARGO_CRATE_NAME"))
        }));
    tracing_subscriber::registry()
        .with(filter)
        .with(telemetry::layer())
        .with(own_events)
        .init();

    let cfg = DatasetConfig::from_env()?;
    info!(
        "using hyperparameters: {}",
        serde_json::to_string(&cfg).context("serializing config")?
    );

    let train_dir = env_path("CODESEQ_TRAIN_DIR")?;
    let valid_dir = std::env::var_os("CODESEQ_VALID_DIR").map(PathBuf::from);

    info!("Loading data ...");
    let (vocab, _) = build_vocab_from_dir(&train_dir, &cfg)
        .with_context(|| format!("building vocabulary from {}", train_dir.display()))?;
    info!("Built vocabulary of {} entries.", vocab.len());

    if let Some(path) = std::env::var_os("CODESEQ_VOCAB_OUT") {
        vocab.save_json(PathBuf::from(path))?;
    }

    let (train, _) = load_corpus_from_dir(&vocab, &train_dir, &cfg)?;
    info!(
        "Loaded {} training samples from {}.",
        train.rows(),
        train_dir.display()
    );

    let batches = get_minibatch_iterator(&train, cfg.batch_size, true, true)?;
    let (count, rows) = batches.fold((0usize, 0usize), |(n, r), b| (n + 1, r + b.rows()));
    info!(
        "Training split yields {} minibatches ({} rows) per epoch.",
        count, rows
    );

    match valid_dir {
        Some(dir) => {
            let (valid, _) = load_corpus_from_dir(&vocab, &dir, &cfg)?;
            info!(
                "Loaded {} validation samples from {}.",
                valid.rows(),
                dir.display()
            );
            let batches = get_minibatch_iterator(&valid, cfg.batch_size, false, false)?;
            let rows: usize = batches.map(|b| b.rows()).sum();
            info!("Validation split covers {} rows in minibatches.", rows);
        }
        None => warn!("CODESEQ_VALID_DIR not set; skipping validation split"),
    }

    Ok(())
}

fn env_path(key: &str) -> Result<PathBuf> {
    std::env::var_os(key)
        .map(PathBuf::from)
        .with_context(|| format!("{key} must point to a directory of .proto records"))
}
