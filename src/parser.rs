//! `parser` holds the generated parsing routines for the SQL subset and
//! grammar-level tests on them.

#[allow(unused_imports)]
use pest::Parser as _; // The trait needs to be in scope for SqlParser::parse to resolve.
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "sql.pest"]
pub struct SqlParser;

#[test]
fn test_parse_select_statements() {
    let cases = vec![
        "SELECT name FROM apples",
        "SELECT name, color FROM apples",
        "select name , color from apples",
        "sElEcT name FrOm apples",
        "SELECT * FROM apples",
        "SELECT COUNT(*) FROM apples",
        "select count(*) from apples",
        "SELECT COUNT ( * ) FROM apples",
        "SELECT name FROM apples WHERE color = 'Red'",
        "select name from apples where color = 'Light Green'",
        "SELECT name FROM apples WHERE color = ''",
        "SELECT name FROM apples;",
        "SELECT _private, a1 FROM t_2",
    ];
    for case in cases {
        println!("Case: {}", case);
        assert!(SqlParser::parse(Rule::select_stmt, case).is_ok());
    }
}

#[test]
fn test_not_parse_invalid_select_statements() {
    let cases = vec![
        "",
        "SELECT",
        "SELECT FROM t",
        "SELECT name",
        "SELECT name, FROM t",
        "CREATE TABLE t (a int)",
        "SELECT name FROM t WHERE color = Red",
        "SELECT name FROM t WHERE color = \"Red\"",
        "SELECT name FROM t WHERE color",
        "SELECT name FROM t WHERE color = 'Red' AND size = 'Big'",
        "SELECT 1name FROM t",
        "DELETE FROM t",
    ];
    for case in cases {
        println!("Case: {}", case);
        assert!(SqlParser::parse(Rule::select_stmt, case).is_err());
    }
}
