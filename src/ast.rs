//! Abstract syntax tree for the supported query subset.
//!
//! This is the structured value handed to the evaluator; the evaluator never
//! sees SQL text.  Keeping the boundary here means the pest grammar could be
//! swapped for a real one without touching the execution core.

use enum_as_inner::EnumAsInner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColName {
    pub name: String,
}

impl std::fmt::Display for ColName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.name.fmt(f)
    }
}

/// One item of the projection list.
#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum SelItem {
    ColName(ColName),
    Star,
    /// `COUNT(*)`, the only aggregate in the subset.
    CountAll,
}

impl std::fmt::Display for SelItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelItem::ColName(x) => x.fmt(f),
            SelItem::Star => "*".fmt(f),
            SelItem::CountAll => "count(*)".fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectClause {
    pub items: Vec<SelItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromClause {
    pub tablename: String,
}

/// `WHERE <column> = '<literal>'`; the only predicate shape in the subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    pub column: ColName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectStatement {
    pub select: SelectClause,
    pub from: FromClause,
    pub where_clause: Option<WhereClause>,
}
