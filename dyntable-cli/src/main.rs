//! Fixture inspector
//!
//! Loads a JSON fixture (table config, column metadata per field path, raw
//! records and optional edits), runs the table engine against an in-memory
//! backend and prints the derived columns, rows, pending changes and errors.
//!
//! Usage: `dyntable-cli <fixture.json> [--commit] [--verbose]`

use std::collections::BTreeMap;
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use dyntable_lib::DynamicTable;
use dyntable_lib::backend::InMemoryBackend;
use dyntable_lib::config::TableConfig;
use dyntable_lib::event::TableEvent;
use dyntable_lib::model::FieldMetadata;
use dyntable_lib::model::RawRecord;
use dyntable_lib::model::Value;
use serde::Deserialize;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    table: TableConfig,
    #[serde(default)]
    metadata: BTreeMap<String, FieldMetadata>,
    #[serde(default)]
    records: Vec<RawRecord>,
    #[serde(default)]
    edits: Vec<Edit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Edit {
    record_id: String,
    column: String,
    value: Value,
}

struct Args {
    path: String,
    commit: bool,
    verbose: bool,
}

fn parse_args() -> Option<Args> {
    let mut path = None;
    let mut commit = false;
    let mut verbose = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--commit" => commit = true,
            "--verbose" | "-v" => verbose = true,
            _ if path.is_none() => path = Some(arg),
            _ => return None,
        }
    }
    Some(Args {
        path: path?,
        commit,
        verbose,
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let Some(args) = parse_args() else {
        eprintln!("Usage: dyntable-cli <fixture.json> [--commit] [--verbose]");
        return ExitCode::from(2);
    };

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&args.path)?;
    let fixture: Fixture = serde_json::from_str(&text)?;

    let backend = Arc::new(InMemoryBackend::new());
    for (path, metadata) in fixture.metadata {
        backend.insert_metadata(&path, metadata);
    }
    for record in fixture.records {
        backend.insert_record(record);
    }

    let mut table = DynamicTable::builder(fixture.table)
        .source(backend.clone())
        .committer(backend.clone())
        .deleter(backend)
        .build();
    let mut events = table.subscribe();

    if let Err(e) = table.load().await {
        log::warn!("Load incomplete: {}", e);
    }

    for edit in fixture.edits {
        let outcome = table.apply_edit(&edit.record_id, &edit.column, edit.value);
        log::info!("{} / {}: {:?}", edit.record_id, edit.column, outcome);
    }

    if args.commit {
        let updated = table.commit().await?;
        log::info!("Committed {} record(s)", updated);
    }

    let columns = table.columns();
    let rows = table.rows();
    let pending = table.pending();
    let errors = table.errors().snapshot();
    let mut notifications = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let TableEvent::Notification(n) = event {
            notifications.push(n);
        }
    }

    let report = serde_json::json!({
        "title": table.config().title,
        "showCheckboxColumn": table.show_checkbox_column(),
        "columns": &*columns,
        "rows": &*rows,
        "pending": pending,
        "errors": &*errors,
        "errorCount": table.errors().count(),
        "notifications": notifications,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
