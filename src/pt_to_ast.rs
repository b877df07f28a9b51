//! `pt_to_ast` converts pest parse trees into the AST the evaluator consumes.
//! A pest parse tree has one enum for all terminals and non-terminals; the
//! AST keeps only the structure and discards lexical detail like keyword case.

use crate::ast;
use crate::parser::{Rule, SqlParser};
use pest::Parser;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unsupported SQL: {0}")]
    Unsupported(String),
}

/// Parse one statement of the supported subset into an AST.
pub fn parse_select_statement(query: &str) -> Result<ast::SelectStatement, Error> {
    let select_stmt = SqlParser::parse(Rule::select_stmt, query)
        .map_err(|_| Error::Unsupported(String::from(query)))?
        .next()
        .ok_or_else(|| Error::Unsupported(String::from(query)))?;

    let mut items: Vec<ast::SelItem> = vec![];
    let mut tablename: Option<String> = None;
    let mut where_clause: Option<ast::WhereClause> = None;

    for s in select_stmt.into_inner() {
        match s.as_rule() {
            Rule::select_items => {
                for item in s.into_inner() {
                    let u = item
                        .into_inner()
                        .next()
                        .ok_or_else(|| Error::Unsupported(String::from(query)))?;
                    items.push(match u.as_rule() {
                        Rule::column_name => ast::SelItem::ColName(ast::ColName {
                            name: String::from(u.as_str()),
                        }),
                        Rule::star => ast::SelItem::Star,
                        Rule::count_star => ast::SelItem::CountAll,
                        _ => return Err(Error::Unsupported(String::from(query))),
                    });
                }
            }
            Rule::from_clause => {
                let t = s
                    .into_inner()
                    .next()
                    .ok_or_else(|| Error::Unsupported(String::from(query)))?;
                tablename = Some(String::from(t.as_str()));
            }
            Rule::where_clause => {
                let mut inner = s.into_inner();
                let col = inner
                    .next()
                    .ok_or_else(|| Error::Unsupported(String::from(query)))?;
                let lit = inner
                    .next()
                    .ok_or_else(|| Error::Unsupported(String::from(query)))?;
                // The literal pair wraps a string_inner pair holding the
                // text between the quotes.
                let value = lit
                    .into_inner()
                    .next()
                    .map(|p| String::from(p.as_str()))
                    .unwrap_or_default();
                where_clause = Some(ast::WhereClause {
                    column: ast::ColName {
                        name: String::from(col.as_str()),
                    },
                    value,
                });
            }
            Rule::EOI => (),
            _ => return Err(Error::Unsupported(String::from(query))),
        }
    }

    Ok(ast::SelectStatement {
        select: ast::SelectClause { items },
        from: ast::FromClause {
            tablename: tablename.ok_or_else(|| Error::Unsupported(String::from(query)))?,
        },
        where_clause,
    })
}

#[test]
fn test_parse_select_statement() {
    use ast::SelItem;
    let cases: Vec<(&str, Vec<SelItem>, &str, Option<(&str, &str)>)> = vec![
        (
            "SELECT name FROM apples",
            vec![col("name")],
            "apples",
            None,
        ),
        (
            "SELECT name, color FROM apples",
            vec![col("name"), col("color")],
            "apples",
            None,
        ),
        ("SELECT * FROM apples", vec![SelItem::Star], "apples", None),
        (
            "select count(*) from apples",
            vec![SelItem::CountAll],
            "apples",
            None,
        ),
        (
            "SELECT name FROM apples WHERE color = 'Light Green'",
            vec![col("name")],
            "apples",
            Some(("color", "Light Green")),
        ),
        (
            "select NAME from APPLES where COLOR = 'Red'",
            vec![col("NAME")],
            "APPLES",
            Some(("COLOR", "Red")),
        ),
        (
            "SELECT name FROM apples WHERE color = ''",
            vec![col("name")],
            "apples",
            Some(("color", "")),
        ),
    ];
    for (i, case) in cases.iter().enumerate() {
        println!("Testing case {}: {}", i, case.0);
        let stmt = parse_select_statement(case.0).unwrap();
        assert_eq!(stmt.select.items, case.1);
        assert_eq!(stmt.from.tablename, case.2);
        assert_eq!(
            stmt.where_clause,
            case.3.map(|(c, v)| ast::WhereClause {
                column: ast::ColName {
                    name: String::from(c)
                },
                value: String::from(v),
            })
        );
    }
}

#[cfg(test)]
fn col(name: &str) -> ast::SelItem {
    ast::SelItem::ColName(ast::ColName {
        name: String::from(name),
    })
}

#[test]
fn test_parse_select_statement_errors() {
    let cases = vec![
        "",
        "UPDATE t SET a = 1",
        "SELECT name FROM t WHERE a = 1",
        "SELECT name",
    ];
    for case in cases {
        println!("Case: {}", case);
        assert!(parse_select_statement(case).is_err());
    }
}
