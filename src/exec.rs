//! The query evaluator: turns a structured query plus an open database into
//! rows.
//!
//! Two execution strategies exist for predicated selects and must be
//! observably identical: a full table scan with the predicate applied to each
//! row, and an index probe that first collects matching rowids and then
//! materializes just those rows.  The index path is taken when the schema
//! has an index whose first indexed column is the predicate column.

use std::collections::BTreeSet;

use tracing::debug;

use crate::ast;
use crate::btree;
use crate::btree::RowId;
use crate::create_stmt;
use crate::create_stmt::ColumnDef;
use crate::pager::Pager;
use crate::schema;
use crate::sql_value::SqlValue;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Schema(#[from] schema::Error),
    #[error("{0}")]
    Btree(#[from] btree::Error),
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    #[error("Cannot read column list of table {0}.")]
    UnreadableColumnList(String),
    #[error("COUNT(*) must be the only select item and takes no WHERE clause.")]
    MixedAggregate,
}

/// One result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub items: Vec<SqlValue>,
}

/// The rows a query produced, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutput {
    pub rows: Vec<Row>,
}

/// What `.dbinfo` reports.
#[derive(Debug, Clone)]
pub struct DbInfo {
    pub page_size: u32,
    pub num_tables: usize,
}

/// Report the page size and the number of tables.
///
/// Tables are counted by walking the whole schema b-tree for entries of type
/// "table", so indexes, views and triggers do not inflate the count and a
/// schema spanning multiple pages is counted fully.
pub fn db_info(pager: &Pager) -> Result<DbInfo, Error> {
    let num_tables = schema::objects(pager)?
        .iter()
        .filter(|o| o.kind == "table")
        .count();
    Ok(DbInfo {
        page_size: pager.page_size(),
        num_tables,
    })
}

/// Names of the user tables, in schema order.
pub fn list_tables(pager: &Pager) -> Result<Vec<String>, Error> {
    Ok(schema::objects(pager)?
        .into_iter()
        .filter(|o| o.kind == "table" && !o.name.starts_with("sqlite_"))
        .map(|o| o.name)
        .collect())
}

/// Evaluate one select statement.
pub fn run_select(pager: &Pager, stmt: &ast::SelectStatement) -> Result<QueryOutput, Error> {
    let table_name = &stmt.from.tablename;
    let table = schema::find_table(pager, table_name)?
        .ok_or_else(|| Error::TableNotFound(table_name.clone()))?;

    // COUNT(*) needs no record decoding at all: leaf cell counts are summed
    // across the table's subtree.
    if stmt
        .select
        .items
        .iter()
        .any(|i| matches!(i, ast::SelItem::CountAll))
    {
        if stmt.select.items.len() != 1 || stmt.where_clause.is_some() {
            return Err(Error::MixedAggregate);
        }
        let n = btree::table::count_rows(pager, table.root_page)?;
        return Ok(QueryOutput {
            rows: vec![Row {
                items: vec![SqlValue::Int(n as i64)],
            }],
        });
    }

    let columns = create_stmt::columns(&table.create_sql)
        .ok_or_else(|| Error::UnreadableColumnList(table_name.clone()))?;
    let projection = resolve_projection(&stmt.select.items, &columns)?;

    let predicate = match &stmt.where_clause {
        Some(w) => {
            let idx = create_stmt::column_index(&table.create_sql, &w.column.name)
                .ok_or_else(|| Error::ColumnNotFound(w.column.name.clone()))?;
            Some((idx, w.value.as_str()))
        }
        None => None,
    };

    let mut rows: Vec<Row> = Vec::new();
    let mut sink = |rowid: RowId, payload: &[u8]| -> Result<(), btree::Error> {
        let mut values = crate::record::parse_record(payload)?;
        substitute_rowid(&mut values, &columns, rowid);
        if let Some((col, want)) = predicate {
            let have = values.get(col).map(|v| v.to_string()).unwrap_or_default();
            if have.as_bytes() != want.as_bytes() {
                return Ok(());
            }
        }
        rows.push(Row {
            items: projection
                .iter()
                .map(|&i| values.get(i).cloned().unwrap_or(SqlValue::Null))
                .collect(),
        });
        Ok(())
    };

    // Strategy choice: an index serves the predicate if its first indexed
    // column is the predicate column.  Both strategies yield rows in
    // ascending rowid order.
    let index = match &stmt.where_clause {
        Some(w) => schema::find_index(pager, table_name, &w.column.name)?,
        None => None,
    };
    match (index, &stmt.where_clause) {
        (Some(idx), Some(w)) if idx.root_page != 0 => {
            debug!(index = %idx.name, "using index lookup");
            let rowids = btree::index::find_rowids(pager, idx.root_page, &w.value)?;
            let targets: BTreeSet<RowId> = rowids.into_iter().collect();
            btree::table::scan_rowids(pager, table.root_page, &targets, &mut sink)?;
        }
        _ => {
            debug!(table = %table_name, "using full scan");
            btree::table::scan(pager, table.root_page, &mut sink)?;
        }
    }
    Ok(QueryOutput { rows })
}

// Map the projection list to column ordinals; `*` expands to all columns in
// declaration order.
fn resolve_projection(
    items: &[ast::SelItem],
    columns: &[ColumnDef],
) -> Result<Vec<usize>, Error> {
    let mut projection: Vec<usize> = Vec::new();
    for item in items {
        match item {
            ast::SelItem::Star => projection.extend(0..columns.len()),
            ast::SelItem::ColName(c) => {
                let idx = columns
                    .iter()
                    .position(|col| col.name.eq_ignore_ascii_case(&c.name))
                    .ok_or_else(|| Error::ColumnNotFound(c.name.clone()))?;
                projection.push(idx);
            }
            ast::SelItem::CountAll => return Err(Error::MixedAggregate),
        }
    }
    Ok(projection)
}

// A column declared INTEGER PRIMARY KEY aliases the rowid: the stored record
// holds NULL there and the live value is the cell's rowid.
fn substitute_rowid(values: &mut [SqlValue], columns: &[ColumnDef], rowid: RowId) {
    for (i, col) in columns.iter().enumerate() {
        if col.is_ipk && matches!(values.get(i), Some(SqlValue::Null)) {
            values[i] = SqlValue::Int(rowid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coldefs(names: &[(&str, bool)]) -> Vec<ColumnDef> {
        names
            .iter()
            .map(|(n, ipk)| ColumnDef {
                name: String::from(*n),
                is_ipk: *ipk,
            })
            .collect()
    }

    #[test]
    fn test_resolve_projection() {
        let cols = coldefs(&[("id", true), ("name", false), ("color", false)]);
        let items = vec![
            ast::SelItem::ColName(ast::ColName {
                name: String::from("color"),
            }),
            ast::SelItem::ColName(ast::ColName {
                name: String::from("NAME"),
            }),
        ];
        assert_eq!(resolve_projection(&items, &cols).unwrap(), vec![2, 1]);
        assert_eq!(
            resolve_projection(&[ast::SelItem::Star], &cols).unwrap(),
            vec![0, 1, 2]
        );
        let missing = vec![ast::SelItem::ColName(ast::ColName {
            name: String::from("taste"),
        })];
        assert!(matches!(
            resolve_projection(&missing, &cols),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_substitute_rowid() {
        let cols = coldefs(&[("id", true), ("name", false)]);
        let mut values = vec![SqlValue::Null, SqlValue::Text(String::from("x"))];
        substitute_rowid(&mut values, &cols, 42);
        assert_eq!(values[0], SqlValue::Int(42));
        // A non-NULL value in an ipk position is left alone.
        let mut values = vec![SqlValue::Int(7), SqlValue::Null];
        substitute_rowid(&mut values, &cols, 42);
        assert_eq!(values[0], SqlValue::Int(7));
        assert_eq!(values[1], SqlValue::Null);
    }
}
