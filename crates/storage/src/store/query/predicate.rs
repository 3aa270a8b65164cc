#![forbid(unsafe_code)]

use super::super::support::{json_to_sql, quote_ident};
use rusqlite::types::Value as SqlValue;
use serde_json::Value as JsonValue;

/// Closed set of comparison operators accepted by `where_op`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CmpOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Like => "LIKE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "=" => Some(Self::Eq),
            "!=" | "<>" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "LIKE" => Some(Self::Like),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub(super) enum Clause {
    Compare {
        column: String,
        op: CmpOp,
        value: JsonValue,
    },
    In {
        column: String,
        values: Vec<JsonValue>,
        negated: bool,
    },
    Null {
        column: String,
        negated: bool,
    },
    And(Box<Clause>, Box<Clause>),
    Or(Box<Clause>, Box<Clause>),
}

/// Left-folded boolean predicate. `or` wraps everything accumulated so far.
#[derive(Clone, Debug, Default)]
pub(super) struct Predicate {
    root: Option<Clause>,
}

impl Predicate {
    pub(super) fn and(&mut self, clause: Clause) {
        self.root = Some(match self.root.take() {
            None => clause,
            Some(prev) => Clause::And(Box::new(prev), Box::new(clause)),
        });
    }

    pub(super) fn or(&mut self, clause: Clause) {
        self.root = Some(match self.root.take() {
            None => clause,
            Some(prev) => Clause::Or(Box::new(prev), Box::new(clause)),
        });
    }

    /// Renders ` WHERE ...` (or nothing) and appends bound values to `params`.
    pub(super) fn render(&self, params: &mut Vec<SqlValue>) -> String {
        let Some(root) = self.root.as_ref() else {
            return String::new();
        };
        let mut sql = String::from(" WHERE ");
        render_clause(root, &mut sql, params);
        sql
    }
}

fn render_clause(clause: &Clause, sql: &mut String, params: &mut Vec<SqlValue>) {
    match clause {
        Clause::Compare { column, op, value } => {
            let op_sql = match (op, value.is_null()) {
                (CmpOp::Eq, true) => "IS",
                (CmpOp::Ne, true) => "IS NOT",
                (op, _) => op.as_sql(),
            };
            sql.push_str(&format!("{} {op_sql} ?", quote_ident(column)));
            params.push(json_to_sql(value));
        }
        Clause::In {
            column,
            values,
            negated,
        } => {
            if values.is_empty() {
                sql.push_str(if *negated { "1" } else { "0" });
                return;
            }
            let marks = vec!["?"; values.len()].join(", ");
            let keyword = if *negated { "NOT IN" } else { "IN" };
            sql.push_str(&format!("{} {keyword} ({marks})", quote_ident(column)));
            params.extend(values.iter().map(json_to_sql));
        }
        Clause::Null { column, negated } => {
            let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
            sql.push_str(&format!("{} {keyword}", quote_ident(column)));
        }
        Clause::And(left, right) | Clause::Or(left, right) => {
            let joiner = if matches!(clause, Clause::And(..)) {
                " AND "
            } else {
                " OR "
            };
            sql.push('(');
            render_clause(left, sql, params);
            sql.push_str(joiner);
            render_clause(right, sql, params);
            sql.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Clause, CmpOp, Predicate};
    use serde_json::json;

    fn eq(column: &str, value: serde_json::Value) -> Clause {
        Clause::Compare {
            column: column.to_string(),
            op: CmpOp::Eq,
            value,
        }
    }

    #[test]
    fn or_wraps_the_whole_accumulated_predicate() {
        let mut predicate = Predicate::default();
        predicate.and(eq("a", json!(1)));
        predicate.and(eq("b", json!(2)));
        predicate.or(eq("c", json!(3)));
        predicate.and(eq("d", json!(4)));

        let mut params = Vec::new();
        let sql = predicate.render(&mut params);
        assert_eq!(
            sql,
            " WHERE (((\"a\" = ? AND \"b\" = ?) OR \"c\" = ?) AND \"d\" = ?)"
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn empty_in_lists_match_nothing_or_everything() {
        let mut predicate = Predicate::default();
        predicate.and(Clause::In {
            column: "card_id".to_string(),
            values: Vec::new(),
            negated: false,
        });
        predicate.and(Clause::In {
            column: "card_id".to_string(),
            values: Vec::new(),
            negated: true,
        });
        let mut params = Vec::new();
        assert_eq!(predicate.render(&mut params), " WHERE (0 AND 1)");
        assert!(params.is_empty());
    }

    #[test]
    fn null_equality_uses_is() {
        let mut predicate = Predicate::default();
        predicate.and(eq("card_state", json!(null)));
        let mut params = Vec::new();
        assert_eq!(predicate.render(&mut params), " WHERE \"card_state\" IS ?");
    }

    #[test]
    fn operator_set_is_closed() {
        assert_eq!(CmpOp::parse("like"), Some(CmpOp::Like));
        assert_eq!(CmpOp::parse("<>"), Some(CmpOp::Ne));
        assert_eq!(CmpOp::parse("; DROP"), None);
    }
}
