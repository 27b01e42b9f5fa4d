//! Geotrek exporter: loads a JSON dataset into the in-memory store and writes the
//! selected features in one of the public API formats.

mod dataset;
mod error;
mod settings;

use clap::Parser;
use dataset::Dataset;
use error::{ExportError, Result};
use geotrek_core::serialize::{self, OriginalFiles, SerializeContext};
use geotrek_core::{Feature, FeatureStore, PropertyRegistry};
use settings::Settings;
use std::io::Write;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_LEVEL: &str = if cfg!(debug_assertions) {
    "debug"
} else {
    "info"
};

/// Filter from the RUST_LOG directives, or the default level when unset or invalid
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Log to stderr; stdout is reserved for the exported document
fn setup_logging() {
    let directives = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .init();
}

/// Live features matching the kind and id filters, by ascending id
fn select<'a>(store: &'a FeatureStore, settings: &Settings) -> Result<Vec<&'a Feature>> {
    let selected: Vec<&Feature> = store
        .features()
        .filter(|feature| feature.is_live())
        .filter(|feature| settings.kind.is_none_or(|kind| feature.kind == kind))
        .filter(|feature| settings.id.is_none_or(|id| feature.id == id))
        .collect();
    match settings.id {
        Some(id) if selected.is_empty() => Err(ExportError::NotFound(id)),
        _ => Ok(selected),
    }
}

fn run(settings: &Settings) -> Result<()> {
    let dataset = Dataset::load(&settings.dataset)?;
    let mut config = dataset.config.clone();
    settings.apply(&mut config);
    let store = dataset.into_store(config);

    let registry = PropertyRegistry::standard();
    let language = settings.language();
    let mut ctx = SerializeContext::new(&registry, &OriginalFiles);
    if let Some(language) = &language {
        ctx = ctx.with_language(language);
    }

    let features = select(&store, settings)?;
    tracing::info!(
        "Exporting {} features as {}",
        features.len(),
        settings.format.extension()
    );
    let output = match (settings.id, features.as_slice()) {
        (Some(_), [single]) => serialize::serialize(
            &store,
            single,
            settings.format,
            &settings.field_set(),
            &ctx,
        )?,
        _ => serialize::serialize_many(
            &store,
            &features,
            settings.format,
            &settings.field_set(),
            &ctx,
        )?,
    };
    let bytes = output.into_bytes()?;

    match &settings.output {
        Some(path) => std::fs::write(path, bytes)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn main() {
    setup_logging();
    let settings = Settings::parse();
    if let Err(e) = run(&settings) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
