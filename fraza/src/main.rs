//! Phrase screenshot parser CLI.
//!
//! Commands map onto the pipeline's entry points: `parse` and `info` for ad
//! hoc single-file runs, `import` for walking an exported channel into the
//! database, `init-db` to create the tables.

mod config;
mod dump;
mod export;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use config::Config;
use pex::{OwnedImage, Pipeline, RecordMeta};

const USAGE: &str = "usage: fraza <command>

commands:
  parse <image>             parse one screenshot and print the records
  info <image>              parse one screenshot and print JSON summaries
  import <dir> [channel]    ingest a chat-export directory into the database
  init-db                   create the database tables";

fn main() -> Result<()> {
    // Structured logging. Use `RUST_LOG=info` etc.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("parse") => cmd_parse(args.get(1).context("usage: fraza parse <image>")?),
        Some("info") => cmd_info(args.get(1).context("usage: fraza info <image>")?),
        Some("import") => cmd_import(
            args.get(1).context("usage: fraza import <dir> [channel]")?,
            args.get(2).map(String::as_str),
        ),
        Some("init-db") => cmd_init_db(),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

/// Metadata for ad hoc runs outside any ingestion batch.
fn ad_hoc_meta() -> RecordMeta {
    RecordMeta {
        meta_id: None,
        message_id: 0,
        message_date: Local::now().naive_local(),
    }
}

fn cmd_parse(path: &str) -> Result<()> {
    let cfg = Config::load_or_default();
    let pipeline = Pipeline::new(cfg.parse.clone(), cfg.recognizer());

    let source = Path::new(path);
    let image = OwnedImage::open(source)?;
    let records = pipeline.process(&image, &ad_hoc_meta());

    for record in &records {
        println!(
            "{}; {}; {}; {}; {}",
            record.file_index(),
            record.state(),
            record.success(),
            record.target_mask(),
            record.translate_mask(),
        );

        if cfg.dump_crops {
            dump::dump_crops(record, source)?;
        }
    }

    tracing::info!(count = records.len(), "parsed {}", path);
    Ok(())
}

fn cmd_info(path: &str) -> Result<()> {
    let cfg = Config::load_or_default();
    let pipeline = Pipeline::new(cfg.parse.clone(), cfg.recognizer());

    let image = OwnedImage::open(path)?;
    let records = pipeline.process(&image, &ad_hoc_meta());

    let summaries: Vec<_> = records.iter().map(|r| r.summary()).collect();
    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}

fn cmd_import(dir: &str, channel: Option<&str>) -> Result<()> {
    let cfg = Config::load_or_default();
    let pipeline = Pipeline::new(cfg.parse.clone(), cfg.recognizer());

    let dir = Path::new(dir);
    let channel = channel
        .map(str::to_string)
        .or_else(|| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .context("cannot derive a channel name from the directory")?;

    let conn = store::open(&cfg.db_path)?;
    store::create_tables(&conn)?;

    let stats = export::import(dir, &channel, &pipeline, &conn)?;
    println!(
        "messages: {}, records: {}, saved: {}, conflicts: {}, errors: {}",
        stats.messages, stats.records, stats.saved, stats.conflicts, stats.errors,
    );
    Ok(())
}

fn cmd_init_db() -> Result<()> {
    let cfg = Config::load_or_default();
    let conn = store::open(&cfg.db_path)?;
    store::create_tables(&conn)?;
    println!("created tables in {:?}", cfg.db_path);
    Ok(())
}
