//! Defines an enum of all the possible values a stored column can hold.

use enum_as_inner::EnumAsInner;

/// One decoded column value.
/// The variants mirror the storage classes of the file format: `NULL`,
/// `INTEGER`, `REAL`, `TEXT` and `BLOB`.
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum SqlValue {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// `Display` is the single textual view of a value: projection output and
/// byte-wise predicate comparison both go through it.
/// NULL renders as the empty string, matching the sqlite3 CLI's list mode.
impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Null => Ok(()),
            SqlValue::Int(x) => x.fmt(f),
            SqlValue::Real(x) => x.fmt(f),
            SqlValue::Text(x) => x.fmt(f),
            SqlValue::Blob(_) => "<BLOB>".fmt(f),
        }
    }
}

#[test]
fn test_display() {
    let cases: Vec<(SqlValue, &str)> = vec![
        (SqlValue::Null, ""),
        (SqlValue::Int(42), "42"),
        (SqlValue::Int(-1), "-1"),
        (SqlValue::Real(1.5), "1.5"),
        (SqlValue::Text(String::from("Granny Smith")), "Granny Smith"),
        (SqlValue::Blob(vec![0, 1, 2]), "<BLOB>"),
    ];
    for (i, case) in cases.iter().enumerate() {
        println!("Testing case {}: display {:?}", i, case.0);
        assert_eq!(format!("{}", case.0), case.1);
    }
}
