//! Interactive query shell
//!
//! Reads one statement per line at a `query> ` prompt, executes it, and
//! prints SELECT results as a fixed-width table (column widths follow the
//! declared types). Errors print as `Error: <message>`; `quit` exits.

use clap::Parser;
use flatsql::types::Row;
use flatsql::{Executor, Query, StorageConfig};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flatsql", version, about = "SQL queries over plain text table files")]
struct Args {
    /// Directory holding the table files
    #[arg(long, default_value = "./tables")]
    data_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let executor = Executor::new(StorageConfig::new(args.data_dir));

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("query> ") {
            Ok(line) => {
                if line == "quit" {
                    break;
                }
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(&line);
                if let Err(e) = run_query(&executor, &line) {
                    println!("Error: {}", e);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn run_query(executor: &Executor, line: &str) -> flatsql::Result<()> {
    let query = Query::parse(line)?;
    let Some(mut table) = executor.execute(query)? else {
        return Ok(());
    };
    let mut first = true;
    while let Some(row) = table.next_row()? {
        if first {
            println!();
            print_headers(&row);
            println!();
            first = false;
        }
        print_row(&row);
        println!();
    }
    Ok(())
}

fn print_headers(row: &Row) {
    for col in row.columns() {
        let width = col.metadata().column_type.display_width();
        let header = format!("{}.{}", col.metadata().table, col.metadata().name);
        print!("{:<width$}  ", header, width = width);
    }
    println!();
}

fn print_row(row: &Row) {
    for col in row.columns() {
        let width = col.metadata().column_type.display_width();
        let value = if col.is_null() { "NULL" } else { col.raw_value() };
        print!("{:<width$}  ", value, width = width);
    }
    println!();
}
