//! Predicate tree rendered to `?`-placeholder text at finalize time.
//!
//! A [`Predicate`] is a flat, left-to-right chain of terms, each joined to
//! the previous one by its own connective. Nesting only happens through
//! [`Expr::Group`], which is how bracket groups are represented.

use sea_query::Value;
use std::fmt::Write;

/// Connective joining a term to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn keyword(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    NotLike,
}

impl CompareOp {
    fn sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Like => "LIKE",
            CompareOp::NotLike => "NOT LIKE",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    Null {
        column: String,
        negated: bool,
    },
    InList {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    Between {
        column: String,
        low: Value,
        high: Value,
        negated: bool,
    },
    Group(Predicate),
}

impl Expr {
    fn render(&self, sql: &mut String, args: &mut Vec<Value>) {
        match self {
            Expr::Compare { column, op, value } => {
                let _ = write!(sql, "{column} {} ?", op.sql());
                args.push(value.clone());
            }
            Expr::Null { column, negated } => {
                let not = if *negated { " NOT" } else { "" };
                let _ = write!(sql, "{column} IS{not} NULL");
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                let _ = write!(sql, "{column} {not}IN (");
                if values.is_empty() {
                    sql.push_str("NULL");
                } else {
                    let placeholders = vec!["?"; values.len()].join(", ");
                    sql.push_str(&placeholders);
                    args.extend(values.iter().cloned());
                }
                sql.push(')');
            }
            Expr::Between {
                column,
                low,
                high,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                let _ = write!(sql, "{column} {not}BETWEEN ? AND ?");
                args.push(low.clone());
                args.push(high.clone());
            }
            Expr::Group(inner) => {
                sql.push('(');
                inner.render(sql, args);
                sql.push(')');
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Term {
    connective: Connective,
    expr: Expr,
}

/// Ordered chain of predicate terms.
#[derive(Debug, Clone, Default)]
pub(crate) struct Predicate {
    terms: Vec<Term>,
}

impl Predicate {
    /// Append a term. The connective of the first term is never rendered.
    pub fn push(&mut self, connective: Connective, expr: Expr) {
        self.terms.push(Term { connective, expr });
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn render(&self, sql: &mut String, args: &mut Vec<Value>) {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(term.connective.keyword());
                sql.push(' ');
            }
            term.expr.render(sql, args);
        }
    }

    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut args = Vec::new();
        self.render(&mut sql, &mut args);
        (sql, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compare(column: &str, op: CompareOp, value: i32) -> Expr {
        Expr::Compare {
            column: column.to_string(),
            op,
            value: value.into(),
        }
    }

    #[test]
    fn test_first_connective_is_not_rendered() {
        let mut predicate = Predicate::default();
        predicate.push(Connective::Or, compare("a", CompareOp::Eq, 1));
        predicate.push(Connective::And, compare("b", CompareOp::Ge, 2));
        let (sql, args) = predicate.to_sql();
        assert_eq!(sql, "a = ? AND b >= ?");
        assert_eq!(args, vec![Value::from(1), Value::from(2)]);
    }

    #[test]
    fn test_null_and_between() {
        let mut predicate = Predicate::default();
        predicate.push(
            Connective::And,
            Expr::Null {
                column: "deleted_at".into(),
                negated: false,
            },
        );
        predicate.push(
            Connective::Or,
            Expr::Between {
                column: "age".into(),
                low: 18.into(),
                high: 30.into(),
                negated: true,
            },
        );
        let (sql, args) = predicate.to_sql();
        assert_eq!(sql, "deleted_at IS NULL OR age NOT BETWEEN ? AND ?");
        assert_eq!(args, vec![Value::from(18), Value::from(30)]);
    }

    #[test]
    fn test_in_list_placeholders() {
        let mut predicate = Predicate::default();
        predicate.push(
            Connective::And,
            Expr::InList {
                column: "id".into(),
                values: vec![1.into(), 2.into(), 3.into()],
                negated: false,
            },
        );
        let (sql, args) = predicate.to_sql();
        assert_eq!(sql, "id IN (?, ?, ?)");
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_empty_in_list() {
        let mut predicate = Predicate::default();
        predicate.push(
            Connective::And,
            Expr::InList {
                column: "id".into(),
                values: Vec::new(),
                negated: true,
            },
        );
        let (sql, args) = predicate.to_sql();
        assert_eq!(sql, "id NOT IN (NULL)");
        assert!(args.is_empty());
    }

    #[test]
    fn test_group_renders_in_parentheses() {
        let mut inner = Predicate::default();
        inner.push(Connective::And, compare("b", CompareOp::Eq, 2));
        inner.push(Connective::Or, compare("c", CompareOp::Eq, 3));

        let mut outer = Predicate::default();
        outer.push(Connective::And, compare("a", CompareOp::Eq, 1));
        outer.push(Connective::And, Expr::Group(inner));

        let (sql, args) = outer.to_sql();
        assert_eq!(sql, "a = ? AND (b = ? OR c = ?)");
        assert_eq!(args, vec![Value::from(1), Value::from(2), Value::from(3)]);
    }
}
