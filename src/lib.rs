//! readlite is a read-only query engine for SQLite-format database files.
//!
//! Page 1 (the first page) is always a b-tree page, and it is the root page
//! of the schema table, which references the root pages of all other b-trees.
//! A query runs by resolving names against the schema, then walking the
//! relevant table (and possibly index) b-trees.

pub mod ast;
pub mod btree;
pub mod create_stmt;
pub mod dbheader;
pub mod exec;
pub mod formatting;
pub mod pager;
pub mod parser;
pub mod pt_to_ast;
pub mod record;
pub mod schema;
pub mod serial_type;
pub mod sql_value;
pub mod varint;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Parse(#[from] pt_to_ast::Error),
    #[error("{0}")]
    Exec(#[from] exec::Error),
}

/// Parse and evaluate one SQL statement of the supported subset.
pub fn run_query(pager: &pager::Pager, sql: &str) -> Result<exec::QueryOutput, Error> {
    let stmt = pt_to_ast::parse_select_statement(sql)?;
    Ok(exec::run_select(pager, &stmt)?)
}
