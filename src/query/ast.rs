//! Predicate tree produced by the query parser
//!
//! The WHERE clause is a closed set of node kinds; translators match on it
//! exhaustively. Leaves keep the raw token text the parser saw so that
//! literal evaluation can apply the query language's quoting rules.

/// Position of a token in the query text, used to look up column metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourcePosition(pub usize);

/// A column token as written in the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnToken {
    /// Property query name or select alias
    pub name: String,
    /// Optional table qualifier (`d.cmis:name`)
    pub qualifier: Option<String>,
    /// Where the token appeared
    pub position: SourcePosition,
}

impl ColumnToken {
    pub fn new(name: impl Into<String>, position: SourcePosition) -> Self {
        Self {
            name: name.into(),
            qualifier: None,
            position,
        }
    }

    pub fn qualified(
        qualifier: impl Into<String>,
        name: impl Into<String>,
        position: SourcePosition,
    ) -> Self {
        Self {
            name: name.into(),
            qualifier: Some(qualifier.into()),
            position,
        }
    }
}

/// Raw literal token text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralToken {
    /// `TRUE` / `false`
    Boolean(String),
    /// `42`, `-3.5`, `1e10`
    Numeric(String),
    /// `'text'` including the surrounding quotes
    String(String),
    /// `TIMESTAMP '2024-01-31T10:00:00.000Z'`
    Timestamp(String),
    /// `('a', 'b')`
    List(Vec<LiteralToken>),
}

impl LiteralToken {
    /// Builds a quoted string token, doubling embedded quotes
    pub fn quoted(text: &str) -> Self {
        LiteralToken::String(format!("'{}'", text.replace('\'', "''")))
    }

    /// Builds a numeric token
    pub fn number(text: impl Into<String>) -> Self {
        LiteralToken::Numeric(text.into())
    }

    /// Builds a boolean token
    pub fn boolean(value: bool) -> Self {
        LiteralToken::Boolean(if value { "TRUE" } else { "FALSE" }.to_string())
    }

    /// Builds a timestamp token from an RFC 3339 string
    pub fn timestamp(text: &str) -> Self {
        LiteralToken::Timestamp(format!("TIMESTAMP '{}'", text))
    }

    /// Builds a list of quoted strings
    pub fn string_list<'a>(items: impl IntoIterator<Item = &'a str>) -> Self {
        LiteralToken::List(items.into_iter().map(LiteralToken::quoted).collect())
    }

    /// Category name for error messages
    pub fn category(&self) -> &'static str {
        match self {
            LiteralToken::Boolean(_) => "boolean",
            LiteralToken::Numeric(_) => "numeric",
            LiteralToken::String(_) => "string",
            LiteralToken::Timestamp(_) => "timestamp",
            LiteralToken::List(_) => "list",
        }
    }
}

/// Operand of a predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal(LiteralToken),
    Column(ColumnToken),
    /// Function call such as `SCORE()`
    Function(String),
}

impl Operand {
    pub fn literal(token: LiteralToken) -> Self {
        Operand::Literal(token)
    }

    pub fn column(token: ColumnToken) -> Self {
        Operand::Column(token)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operand::Literal(_) => "literal",
            Operand::Column(_) => "column",
            Operand::Function(_) => "function",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Gt,
    Gteq,
    Lt,
    Lteq,
}

impl ComparisonOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Neq => "<>",
            ComparisonOp::Gt => ">",
            ComparisonOp::Gteq => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lteq => "<=",
        }
    }
}

/// Full-text search expression inside `CONTAINS('...')`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FullTextNode {
    /// All children must match
    And(Vec<FullTextNode>),
    /// Any child may match
    Or(Vec<FullTextNode>),
    /// Children must not match (`-word`)
    Minus(Vec<FullTextNode>),
    /// A single word
    Word(String),
    /// A quoted phrase, delimiters included
    Phrase(String),
}

/// A WHERE clause node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateNode {
    And(Box<PredicateNode>, Box<PredicateNode>),
    Or(Box<PredicateNode>, Box<PredicateNode>),
    Not(Box<PredicateNode>),
    /// `col <op> literal`
    Comparison {
        op: ComparisonOp,
        column: Operand,
        value: Operand,
    },
    /// `col [NOT] LIKE 'pattern'`
    Like {
        column: Operand,
        pattern: Operand,
        negated: bool,
    },
    /// `col [NOT] IN (...)`
    In {
        column: Operand,
        values: Operand,
        negated: bool,
    },
    /// `[NOT] ANY col IN (...)`
    AnyIn {
        column: Operand,
        values: Operand,
        negated: bool,
    },
    /// `'value' = ANY col`
    EqAny { value: Operand, column: Operand },
    /// `col IS [NOT] NULL`
    IsNull { column: Operand, negated: bool },
    /// `IN_FOLDER([qualifier,] 'folderId')`
    InFolder {
        qualifier: Option<String>,
        folder: Operand,
    },
    /// `IN_TREE([qualifier,] 'folderId')`
    InTree {
        qualifier: Option<String>,
        folder: Operand,
    },
    /// `CONTAINS([qualifier,] '...')`
    Contains {
        qualifier: Option<String>,
        expression: FullTextNode,
    },
}

impl PredicateNode {
    pub fn and(left: PredicateNode, right: PredicateNode) -> Self {
        PredicateNode::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: PredicateNode, right: PredicateNode) -> Self {
        PredicateNode::Or(Box::new(left), Box::new(right))
    }

    pub fn not(child: PredicateNode) -> Self {
        PredicateNode::Not(Box::new(child))
    }

    pub fn compare(op: ComparisonOp, column: ColumnToken, value: LiteralToken) -> Self {
        PredicateNode::Comparison {
            op,
            column: Operand::Column(column),
            value: Operand::Literal(value),
        }
    }

    pub fn eq(column: ColumnToken, value: LiteralToken) -> Self {
        Self::compare(ComparisonOp::Eq, column, value)
    }

    pub fn like(column: ColumnToken, pattern: &str) -> Self {
        PredicateNode::Like {
            column: Operand::Column(column),
            pattern: Operand::Literal(LiteralToken::quoted(pattern)),
            negated: false,
        }
    }

    pub fn in_list(column: ColumnToken, values: LiteralToken) -> Self {
        PredicateNode::In {
            column: Operand::Column(column),
            values: Operand::Literal(values),
            negated: false,
        }
    }

    pub fn is_null(column: ColumnToken) -> Self {
        PredicateNode::IsNull {
            column: Operand::Column(column),
            negated: false,
        }
    }

    pub fn in_folder(folder_id: &str) -> Self {
        PredicateNode::InFolder {
            qualifier: None,
            folder: Operand::Literal(LiteralToken::quoted(folder_id)),
        }
    }

    pub fn in_tree(folder_id: &str) -> Self {
        PredicateNode::InTree {
            qualifier: None,
            folder: Operand::Literal(LiteralToken::quoted(folder_id)),
        }
    }

    pub fn contains(expression: FullTextNode) -> Self {
        PredicateNode::Contains {
            qualifier: None,
            expression,
        }
    }

    /// Operator name for error messages
    pub fn operator_name(&self) -> &'static str {
        match self {
            PredicateNode::And(..) => "AND",
            PredicateNode::Or(..) => "OR",
            PredicateNode::Not(_) => "NOT",
            PredicateNode::Comparison { .. } => "comparison",
            PredicateNode::Like { negated: false, .. } => "LIKE",
            PredicateNode::Like { negated: true, .. } => "NOT LIKE",
            PredicateNode::In { negated: false, .. } => "IN",
            PredicateNode::In { negated: true, .. } => "NOT IN",
            PredicateNode::AnyIn { negated: false, .. } => "ANY IN",
            PredicateNode::AnyIn { negated: true, .. } => "NOT ANY IN",
            PredicateNode::EqAny { .. } => "= ANY",
            PredicateNode::IsNull { negated: false, .. } => "IS NULL",
            PredicateNode::IsNull { negated: true, .. } => "IS NOT NULL",
            PredicateNode::InFolder { .. } => "IN_FOLDER",
            PredicateNode::InTree { .. } => "IN_TREE",
            PredicateNode::Contains { .. } => "CONTAINS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_doubles_embedded_quotes() {
        assert_eq!(
            LiteralToken::quoted("it's"),
            LiteralToken::String("'it''s'".into())
        );
    }

    #[test]
    fn test_operator_names() {
        let col = ColumnToken::new("cmis:name", SourcePosition(0));
        let like = PredicateNode::like(col.clone(), "a%");
        assert_eq!(like.operator_name(), "LIKE");

        let not_null = PredicateNode::IsNull {
            column: Operand::Column(col),
            negated: true,
        };
        assert_eq!(not_null.operator_name(), "IS NOT NULL");
    }

    #[test]
    fn test_timestamp_token() {
        assert_eq!(
            LiteralToken::timestamp("2024-01-01T00:00:00Z"),
            LiteralToken::Timestamp("TIMESTAMP '2024-01-01T00:00:00Z'".into())
        );
    }
}
