//! Walks the schema table to locate tables and indexes.
//!
//! Page 1 is always the root of the schema table, whose rows describe every
//! other object in the file.  Each row has 5 columns, in order:
//! `type`, `name`, `tbl_name`, `rootpage`, `sql`.

use crate::btree;
use crate::create_stmt;
use crate::pager::{PageNum, Pager};
use crate::sql_value::SqlValue;

pub const SCHEMA_BTREE_ROOT_PAGENUM: PageNum = 1;

const SCHEMA_TYPE_COLIDX: usize = 0;
const SCHEMA_NAME_COLIDX: usize = 1;
const SCHEMA_TBL_NAME_COLIDX: usize = 2;
const SCHEMA_ROOTPAGE_COLIDX: usize = 3;
const SCHEMA_SQL_COLIDX: usize = 4;
const SCHEMA_NUM_COLS: usize = 5;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error walking schema table: {0}")]
    Btree(#[from] btree::Error),
    #[error("Error decoding schema record: {0}")]
    Record(#[from] crate::record::Error),
    #[error("Schema table record does not have the expected shape.")]
    MalformedSchemaRecord,
}

/// One row of the schema table.
#[derive(Debug, Clone)]
pub struct SchemaObject {
    /// "table", "index", "view" or "trigger".
    pub kind: String,
    pub name: String,
    /// The table this object belongs to; equal to `name` for tables.
    pub tbl_name: String,
    /// Root page of the object's b-tree; 0 for views and triggers.
    pub root_page: PageNum,
    /// The stored CREATE statement; absent for auto-created indexes.
    pub sql: Option<String>,
}

/// A located table: where its b-tree starts and how it was declared.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub root_page: PageNum,
    pub create_sql: String,
}

/// A located index.
#[derive(Debug, Clone)]
pub struct IndexInfo {
    pub root_page: PageNum,
    pub name: String,
}

/// Enumerate every schema entry, in schema-table order.
///
/// The schema is walked as a full b-tree: small databases keep it on a single
/// leaf, but nothing here depends on that.
pub fn objects(pager: &Pager) -> Result<Vec<SchemaObject>, Error> {
    let mut payloads: Vec<Vec<u8>> = Vec::new();
    btree::table::scan(pager, SCHEMA_BTREE_ROOT_PAGENUM, &mut |_rowid, payload| {
        payloads.push(payload.to_vec());
        Ok(())
    })?;
    payloads.iter().map(|p| decode_schema_record(p)).collect()
}

fn decode_schema_record(payload: &[u8]) -> Result<SchemaObject, Error> {
    let values = crate::record::parse_record(payload)?;
    if values.len() < SCHEMA_NUM_COLS {
        return Err(Error::MalformedSchemaRecord);
    }
    let text = |idx: usize| -> Result<String, Error> {
        values[idx]
            .as_text()
            .cloned()
            .ok_or(Error::MalformedSchemaRecord)
    };
    let root_page = match &values[SCHEMA_ROOTPAGE_COLIDX] {
        SqlValue::Int(i) if *i >= 0 => *i as PageNum,
        // Views and triggers have no b-tree and store NULL or 0 here.
        SqlValue::Null => 0,
        _ => return Err(Error::MalformedSchemaRecord),
    };
    let sql = match &values[SCHEMA_SQL_COLIDX] {
        SqlValue::Text(s) => Some(s.clone()),
        SqlValue::Null => None,
        _ => return Err(Error::MalformedSchemaRecord),
    };
    Ok(SchemaObject {
        kind: text(SCHEMA_TYPE_COLIDX)?,
        name: text(SCHEMA_NAME_COLIDX)?,
        tbl_name: text(SCHEMA_TBL_NAME_COLIDX)?,
        root_page,
        sql,
    })
}

/// Locate the table called `name` (ASCII case-insensitive).
pub fn find_table(pager: &Pager, name: &str) -> Result<Option<TableInfo>, Error> {
    for obj in objects(pager)? {
        if obj.kind == "table" && obj.name.eq_ignore_ascii_case(name) {
            let create_sql = obj.sql.ok_or(Error::MalformedSchemaRecord)?;
            return Ok(Some(TableInfo {
                root_page: obj.root_page,
                create_sql,
            }));
        }
    }
    Ok(None)
}

/// Locate an index on `table` whose first indexed column is `column`.
/// The first matching schema entry wins.  Auto-created indexes (which store
/// no CREATE text) cannot be matched and are skipped.
pub fn find_index(pager: &Pager, table: &str, column: &str) -> Result<Option<IndexInfo>, Error> {
    for obj in objects(pager)? {
        if obj.kind != "index" || !obj.tbl_name.eq_ignore_ascii_case(table) {
            continue;
        }
        let Some(sql) = &obj.sql else { continue };
        if create_stmt::index_column(sql)
            .map(|c| c.eq_ignore_ascii_case(column))
            .unwrap_or(false)
        {
            return Ok(Some(IndexInfo {
                root_page: obj.root_page,
                name: obj.name,
            }));
        }
    }
    Ok(None)
}
