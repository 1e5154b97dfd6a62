//! # CLI - StrataKV Interactive Shell
//!
//! A REPL-style command-line interface for the StrataKV storage engine.
//! Reads commands from stdin, executes them against the engine, and prints
//! results to stdout. Designed for both interactive use and scripted testing
//! (pipe commands via stdin). Logs go to stderr.
//!
//! ## Commands
//!
//! ```text
//! put key value      Insert or update a key-value pair
//! get key            Look up a key
//! delete key         Delete a key (writes a tombstone)
//! flush              Force flush memtable to a level-0 table
//! stats              Print engine debug info
//! exit / quit        Flush and shut down
//! ```
//!
//! Commands are case-insensitive.
//!
//! ## Configuration
//!
//! ```text
//! STRATA_DATA_DIR        storage directory                  (default: "./data")
//! STRATA_MEMTABLE_BYTES  flush threshold in bytes           (default: 8000)
//! STRATA_BLOOM_ITEMS     bloom filter expected items        (default: 10000)
//! STRATA_BLOOM_FPR       bloom filter false positive rate   (default: 0.01)
//! STRATA_LEVEL_RATIO     table-count growth per level       (default: 10)
//! STRATA_L0_TARGET       level-0 table-count target         (default: 4)
//! STRATA_STRICT_DELETE   deleting a missing key is an error (default: false)
//! STRATA_LOG             log level on stderr                (default: "warn")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! StrataKV started (dir=./data, memtable=8000B, l0_target=4, level_ratio=10)
//! > put name Alice
//! OK
//! > get name
//! Key: name, Value: Alice
//! > exit
//! bye
//! ```

use anyhow::{Context, Result};
use config::EngineConfig;
use engine::{Engine, EngineError, Record};
use std::io::{self, BufRead, Write};
use tracing::Level;

/// One parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Get(&'a str),
    Put(&'a str, String),
    Delete(&'a str),
    Flush,
    Stats,
    Exit,
    Empty,
}

fn parse(line: &str) -> std::result::Result<Command<'_>, String> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Ok(Command::Empty);
    };
    match cmd.to_lowercase().as_str() {
        "get" => parts.next().map(Command::Get).ok_or_else(|| "usage: get <key>".to_string()),
        "put" => {
            let key = parts.next();
            let value = parts.collect::<Vec<&str>>().join(" ");
            match key {
                Some(k) if !value.is_empty() => Ok(Command::Put(k, value)),
                _ => Err("usage: put <key> <value>".to_string()),
            }
        }
        "delete" => parts
            .next()
            .map(Command::Delete)
            .ok_or_else(|| "usage: delete <key>".to_string()),
        "flush" => Ok(Command::Flush),
        "stats" => Ok(Command::Stats),
        "exit" | "quit" => Ok(Command::Exit),
        other => Err(format!("unknown command: {}", other)),
    }
}

/// Runs one command and returns the text to print.
fn execute(engine: &Engine, command: Command<'_>) -> String {
    match command {
        Command::Get(k) => match engine.get(k.as_bytes()) {
            Ok(record) => format!(
                "Key: {}, Value: {}",
                String::from_utf8_lossy(&record.key),
                String::from_utf8_lossy(&record.value)
            ),
            Err(EngineError::NotFound) => "Key not found".to_string(),
            Err(e) => format!("Error: {}", e),
        },
        Command::Put(k, v) => match engine.put(Record::new(k, v)) {
            Ok(()) => "OK".to_string(),
            Err(e) => format!("Error: {}", e),
        },
        Command::Delete(k) => match engine.delete(k.as_bytes()) {
            Ok(()) => "OK".to_string(),
            Err(EngineError::NotFound) => "Key not found".to_string(),
            Err(e) => format!("Error: {}", e),
        },
        Command::Flush => match engine.force_flush() {
            Ok(()) => format!("OK (tables per level: {:?})", engine.table_counts()),
            Err(e) => format!("Error: {}", e),
        },
        Command::Stats => format!("{:?}", engine),
        Command::Exit => "bye".to_string(),
        Command::Empty => String::new(),
    }
}

fn init_logging() {
    let level = std::env::var("STRATA_LOG")
        .ok()
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::WARN);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let config = EngineConfig::from_env().context("invalid configuration")?;
    println!(
        "StrataKV started (dir={}, memtable={}B, l0_target={}, level_ratio={})",
        config.data_dir.display(),
        config.memtable_threshold,
        config.l0_target,
        config.level_ratio
    );
    let engine = Engine::open(config).context("failed to open engine")?;

    println!("Commands: put key value | get key | delete key | flush | stats | exit");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match parse(&line) {
            Ok(Command::Exit) => {
                println!("bye");
                break;
            }
            Ok(Command::Empty) => {}
            Ok(command) => println!("{}", execute(&engine, command)),
            Err(msg) => println!("Error: {}", msg),
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    // Dropping the engine flushes whatever is still in the memtable.
    drop(engine);
    Ok(())
}
