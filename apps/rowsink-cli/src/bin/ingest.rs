use std::env;

use arrow_array::RecordBatch;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rowsink_core::config::{expand_path, Config, WriterOptions};
use rowsink_core::StoreClient;
use rowsink_lance::{source, table, LanceStore};
use rowsink_writer::{CommitMessage, MemoryStore, PartitionWriter};

struct Args {
    source_table: String,
    source_uri: Option<String>,
    dry_run: bool,
}

fn usage() -> ! {
    eprintln!("Usage: rowsink-ingest <source_table> [--source-uri URI] [--dry-run]");
    eprintln!("Example: rowsink-ingest articles --source-uri ../dev_data/lancedb");
    std::process::exit(1)
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let (mut source_table, mut source_uri, mut dry_run) = (None, None, false);
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--dry-run" | "-n" => dry_run = true,
            "--source-uri" => {
                if i + 1 < args.len() { source_uri = Some(args[i + 1].clone()); i += 1; } else { eprintln!("Error: --source-uri requires a value"); usage(); }
            }
            a if !a.starts_with('-') => source_table = Some(a.to_string()),
            other => { eprintln!("Error: unknown flag {other}"); usage(); }
        }
        i += 1;
    }
    match source_table {
        Some(source_table) => Args { source_table, source_uri, dry_run },
        None => usage(),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let args = parse_args();
    let options = config.writer_options()?;
    let store_options = config.store_options()?;
    let store_uri = expand_path(&store_options.uri).to_string_lossy().to_string();
    let source_uri = args.source_uri.map_or_else(|| store_uri.clone(), |u| expand_path(u).to_string_lossy().to_string());

    info!(source = %source_uri, table = %args.source_table, "reading source partitions");
    let partitions = tokio::runtime::Runtime::new()?.block_on(async {
        let conn = table::open_db(&source_uri).await?;
        table::scan_batches(&conn, &args.source_table).await
    })?;

    let messages = if args.dry_run {
        info!("dry run: objects are kept in memory");
        let store = MemoryStore::new();
        let messages = ingest(&partitions, &options, &store)?;
        info!(objects = store.len(), "dry run finished");
        messages
    } else {
        let store = LanceStore::open(&store_uri, &options.class_name, store_options.vector_dim)?;
        let messages = ingest(&partitions, &options, &store)?;
        info!(table = store.table_name(), rows = store.count()?, "target table updated");
        messages
    };

    let written: usize = messages.iter().map(|m| m.written).sum();
    let incomplete: Vec<_> = messages.iter().filter(|m| !m.is_complete()).collect();
    println!("\n✅ Ingested {} objects from {} partitions into '{}'", written, messages.len(), options.class_name);
    for m in &incomplete {
        println!("⚠️  {m}");
        for r in &m.rejected { println!("     {} => {}", r.id, r.error); }
    }
    Ok(())
}

/// One writer per source batch; a failing partition is aborted and stops the run.
fn ingest<S: StoreClient>(partitions: &[RecordBatch], options: &WriterOptions, store: &S) -> anyhow::Result<Vec<CommitMessage>> {
    let total: usize = partitions.iter().map(RecordBatch::num_rows).sum();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({percent}%) {msg}")?.progress_chars("#>-"));

    let mut messages = Vec::with_capacity(partitions.len());
    for (partition_id, batch) in (0u64..).zip(partitions) {
        let schema = source::record_schema(&batch.schema())?;
        let mut writer = PartitionWriter::new(partition_id, schema, options.clone(), store)?;
        pb.set_message(format!("partition {}", partition_id));
        for record in source::records(batch)? {
            if let Err(e) = writer.write(&record) {
                error!(partition_id, error = %e, "partition failed");
                writer.abort()?;
                pb.abandon();
                return Err(e.into());
            }
            pb.inc(1);
        }
        let message = writer.commit()?;
        writer.close();
        messages.push(message);
    }
    pb.finish_with_message("done");
    Ok(messages)
}
