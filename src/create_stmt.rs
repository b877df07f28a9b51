//! Resolves column positions out of stored CREATE statements.
//!
//! The schema table stores each object's original CREATE text.  Record
//! bodies carry column values in declaration order with no names, so the
//! only way to know which body position a column name refers to is to read
//! it back out of that text.  This is a text scanner, not a SQL parser: it
//! understands just enough structure (top-level commas, quoting, the
//! constraint keywords) to recover ordinal positions from real-world
//! statements, including ones the query grammar itself would reject.

/// One declared column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    /// Declared `INTEGER PRIMARY KEY`: the record stores NULL in this
    /// position and the row's true value is its rowid.
    pub is_ipk: bool,
}

/// Extract the declared columns of a `CREATE TABLE` statement, in order.
/// Returns None when the text has no parenthesized body.
pub fn columns(create_sql: &str) -> Option<Vec<ColumnDef>> {
    let body = paren_body(create_sql)?;
    let mut cols = Vec::new();
    for fragment in split_top_level(body) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }
        let mut tokens = fragment.split_whitespace();
        let first = tokens.next()?;
        // Table-level constraints are not columns.
        if matches!(
            first.to_ascii_lowercase().as_str(),
            "primary" | "foreign" | "unique" | "check" | "constraint"
        ) {
            continue;
        }
        let name = unquote(first);
        let is_ipk = tokens
            .next()
            .map(|t| t.eq_ignore_ascii_case("integer"))
            .unwrap_or(false)
            && fragment.to_ascii_lowercase().contains("primary key");
        cols.push(ColumnDef { name, is_ipk });
    }
    Some(cols)
}

/// Zero-based position of `column` among the declared columns,
/// case-insensitively.
pub fn column_index(create_sql: &str, column: &str) -> Option<usize> {
    columns(create_sql)?
        .iter()
        .position(|c| c.name.eq_ignore_ascii_case(column))
}

/// The first indexed column of a `CREATE INDEX ... ON t (col, ...)` statement.
pub fn index_column(create_sql: &str) -> Option<String> {
    let body = paren_body(create_sql)?;
    let first = split_top_level(body).into_iter().next()?;
    let token = first.split_whitespace().next()?;
    Some(unquote(token))
}

// The text between the first '(' and the last ')'.
fn paren_body(sql: &str) -> Option<&str> {
    let open = sql.find('(')?;
    let close = sql.rfind(')')?;
    if close <= open {
        return None;
    }
    Some(&sql[open + 1..close])
}

// Split on commas at parenthesis depth zero, so type arguments like
// DECIMAL(10,2) stay inside their fragment.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    for (i, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                fragments.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fragments.push(&body[start..]);
    fragments
}

// Strip one layer of identifier quoting: "name", `name` or [name].
fn unquote(token: &str) -> String {
    let t = token.trim();
    let stripped = t
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| t.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .or_else(|| t.strip_prefix('[').and_then(|s| s.strip_suffix(']')))
        .unwrap_or(t);
    String::from(stripped)
}

#[test]
fn test_columns() {
    let cases: Vec<(&str, Vec<(&str, bool)>)> = vec![
        (
            "CREATE TABLE apples (id INTEGER, name TEXT, color TEXT)",
            vec![("id", false), ("name", false), ("color", false)],
        ),
        (
            "CREATE TABLE t (id integer primary key autoincrement, name text)",
            vec![("id", true), ("name", false)],
        ),
        // Type arguments with nested parens and commas must not split.
        (
            "CREATE TABLE p (price DECIMAL(10,2), qty INT)",
            vec![("price", false), ("qty", false)],
        ),
        // Quoted identifiers.  A quoted name containing whitespace splits at
        // the space; known limitation.
        (
            "CREATE TABLE q (\"first name\" TEXT, `last` TEXT, [age] INT)",
            vec![("\"first", false), ("last", false), ("age", false)],
        ),
        // Table-level constraints are skipped.
        (
            "CREATE TABLE c (a INT, b INT, PRIMARY KEY (a, b))",
            vec![("a", false), ("b", false)],
        ),
        // Newlines and odd spacing.
        (
            "CREATE TABLE s (\n\ta int,\n\tb text\n)",
            vec![("a", false), ("b", false)],
        ),
        // TEXT PRIMARY KEY is not a rowid alias.
        (
            "CREATE TABLE k (code TEXT PRIMARY KEY, v INT)",
            vec![("code", false), ("v", false)],
        ),
    ];
    for (i, case) in cases.iter().enumerate() {
        println!("Testing case {}: {}", i, case.0);
        let expected: Vec<ColumnDef> = case
            .1
            .iter()
            .map(|(n, ipk)| ColumnDef {
                name: String::from(*n),
                is_ipk: *ipk,
            })
            .collect();
        assert_eq!(columns(case.0).unwrap(), expected);
    }
}

#[test]
fn test_column_index() {
    let sql = "CREATE TABLE apples (id INTEGER, name TEXT, color TEXT)";
    assert_eq!(column_index(sql, "id"), Some(0));
    assert_eq!(column_index(sql, "color"), Some(2));
    assert_eq!(column_index(sql, "COLOR"), Some(2));
    assert_eq!(column_index(sql, "taste"), None);
    assert_eq!(column_index("not a create statement", "x"), None);
}

#[test]
fn test_index_column() {
    let cases: Vec<(&str, Option<&str>)> = vec![
        ("CREATE INDEX idx_color ON apples (color)", Some("color")),
        ("CREATE INDEX idx ON t(a, b)", Some("a")),
        ("CREATE INDEX idx ON t (\"a\")", Some("a")),
        ("CREATE INDEX idx ON t ( a ASC )", Some("a")),
        ("CREATE INDEX broken ON t", None),
    ];
    for (i, case) in cases.iter().enumerate() {
        println!("Testing case {}: {}", i, case.0);
        assert_eq!(index_column(case.0), case.1.map(String::from));
    }
}
