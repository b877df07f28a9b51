use anyhow::Result;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use readlite::{exec, formatting, pager::Pager};

fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout carries only query results.
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        println!("Missing <database path> and <command>");
        return Ok(());
    }

    // Failures print one diagnostic line and exit normally.
    if let Err(e) = run(&args[0], &args[1]) {
        println!("{}", e);
    }
    Ok(())
}

fn run(path: &str, command: &str) -> Result<()> {
    let pager = Pager::open(path)?;
    match command {
        ".dbinfo" => {
            let info = exec::db_info(&pager)?;
            println!("database page size: {}", info.page_size);
            println!("number of tables: {}", info.num_tables);
        }
        ".tables" => {
            println!("{}", exec::list_tables(&pager)?.join(" "));
        }
        sql => {
            let output = readlite::run_query(&pager, sql)?;
            formatting::write_rows(&mut std::io::stdout().lock(), &output)?;
        }
    }
    Ok(())
}
