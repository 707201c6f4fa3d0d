//! Predicate trees.
//!
//! A predicate is an ordered list of clauses; each clause is either a rendered
//! boolean fragment (leaf) or a nested group. Every clause after the first
//! carries its own connector describing how it joins what precedes it, so
//! `a = ? OR b = ?` and `a = ? AND (b = ? OR c = ?)` fall out of the same
//! renderer. Bindings live next to the tree and stay in lock-step with the `?`
//! placeholders the renderer emits: same count, same left-to-right order.

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::ident::quote_field;
use crate::value::Value;

/// Comparison operators accepted by the predicate entry points.
///
/// Matched case-insensitively; anything outside the list is rejected at call
/// time, before any SQL text is built.
pub const ALLOWED_OPERATORS: &[&str] = &[
    "=", "<", ">", "<=", ">=", "<>", "!=", "LIKE", "NOT LIKE", "REGEXP", "NOT REGEXP", "&", "|",
    "^", "<<", ">>",
];

/// Logical connector joining a clause to its previous sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    fn as_sql(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// One node of a predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// A rendered boolean fragment.
    Leaf { connector: Connector, expr: String },
    /// A parenthesized subtree.
    Group {
        connector: Connector,
        clauses: Vec<Clause>,
    },
}

impl Clause {
    fn connector(&self) -> Connector {
        match self {
            Clause::Leaf { connector, .. } | Clause::Group { connector, .. } => *connector,
        }
    }
}

/// Render a clause list into a boolean expression string.
///
/// The first entry never carries a leading connector; every later entry is
/// preceded by its own. Groups recurse, which is the only place nesting depth
/// is handled.
pub fn render_clauses(clauses: &[Clause]) -> String {
    let mut out = String::new();
    for (index, clause) in clauses.iter().enumerate() {
        if index > 0 {
            out.push(' ');
            out.push_str(clause.connector().as_sql());
            out.push(' ');
        }
        match clause {
            Clause::Leaf { expr, .. } => out.push_str(expr),
            Clause::Group { clauses, .. } => {
                out.push('(');
                out.push_str(&render_clauses(clauses));
                out.push(')');
            }
        }
    }
    out
}

/// Composer for one predicate tree (WHERE, HAVING, or a join's ON) together
/// with its bindings.
///
/// Group callbacks receive a fresh `Predicate`; its `where_`-family methods
/// append to whichever tree is being grouped, so nested composition uses the
/// same call shape as the top level.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    dialect: Dialect,
    clauses: Vec<Clause>,
    bindings: Vec<Value>,
}

impl Predicate {
    pub(crate) fn new(dialect: Dialect) -> Predicate {
        Predicate {
            dialect,
            clauses: Vec::new(),
            bindings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Number of top-level clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Bindings in the exact order their placeholders appear in `render()`.
    pub fn bindings(&self) -> &[Value] {
        &self.bindings
    }

    pub fn render(&self) -> String {
        render_clauses(&self.clauses)
    }

    // ==================== value comparisons ====================

    /// Append `field <op> ?` joined with AND, binding `value`.
    pub fn where_(
        &mut self,
        field: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.compare(Connector::And, field, operator, value.into())
    }

    /// Append `field <op> ?` joined with OR, binding `value`.
    pub fn or_where(
        &mut self,
        field: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.compare(Connector::Or, field, operator, value.into())
    }

    fn compare(
        &mut self,
        connector: Connector,
        field: &str,
        operator: &str,
        value: Value,
    ) -> Result<&mut Self> {
        let op = normalize_operator(operator)?;
        self.bindings.push(value);
        let expr = format!("{} {} ?", quote_field(self.dialect, field), op);
        self.push_leaf(connector, expr);
        Ok(self)
    }

    // ==================== null checks ====================

    pub fn where_null(&mut self, field: &str) -> &mut Self {
        self.null_check(Connector::And, field, true)
    }

    pub fn or_where_null(&mut self, field: &str) -> &mut Self {
        self.null_check(Connector::Or, field, true)
    }

    pub fn where_not_null(&mut self, field: &str) -> &mut Self {
        self.null_check(Connector::And, field, false)
    }

    pub fn or_where_not_null(&mut self, field: &str) -> &mut Self {
        self.null_check(Connector::Or, field, false)
    }

    fn null_check(&mut self, connector: Connector, field: &str, is_null: bool) -> &mut Self {
        let check = if is_null { "IS NULL" } else { "IS NOT NULL" };
        let expr = format!("{} {}", quote_field(self.dialect, field), check);
        self.push_leaf(connector, expr);
        self
    }

    // ==================== ranges and lists ====================

    /// Append `field BETWEEN ? AND ?`, binding both bounds in order.
    pub fn where_between(
        &mut self,
        field: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.between(Connector::And, field, low.into(), high.into(), false)
    }

    pub fn where_not_between(
        &mut self,
        field: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.between(Connector::And, field, low.into(), high.into(), true)
    }

    fn between(
        &mut self,
        connector: Connector,
        field: &str,
        low: Value,
        high: Value,
        negated: bool,
    ) -> &mut Self {
        self.bindings.push(low);
        self.bindings.push(high);
        let keyword = if negated { "NOT BETWEEN" } else { "BETWEEN" };
        let expr = format!("{} {} ? AND ?", quote_field(self.dialect, field), keyword);
        self.push_leaf(connector, expr);
        self
    }

    /// Append `field IN (?, ...)` with one binding per element.
    ///
    /// An empty list renders the constant `1=0` (nothing matches) with no
    /// bindings rather than emitting invalid `IN ()` SQL.
    pub fn where_in<T: Into<Value>>(&mut self, field: &str, values: Vec<T>) -> &mut Self {
        self.in_list(Connector::And, field, values, false)
    }

    /// Negated `where_in`; an empty list renders `1=1` (everything matches).
    pub fn where_not_in<T: Into<Value>>(&mut self, field: &str, values: Vec<T>) -> &mut Self {
        self.in_list(Connector::And, field, values, true)
    }

    fn in_list<T: Into<Value>>(
        &mut self,
        connector: Connector,
        field: &str,
        values: Vec<T>,
        negated: bool,
    ) -> &mut Self {
        if values.is_empty() {
            let expr = if negated { "1=1" } else { "1=0" };
            self.push_leaf(connector, expr.to_string());
            return self;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        for value in values {
            self.bindings.push(value.into());
        }
        let keyword = if negated { "NOT IN" } else { "IN" };
        let expr = format!(
            "{} {} ({})",
            quote_field(self.dialect, field),
            keyword,
            placeholders
        );
        self.push_leaf(connector, expr);
        self
    }

    // ==================== raw fragments ====================

    /// Append a raw boolean fragment verbatim, with no bindings.
    pub fn where_raw(&mut self, expr: &str) -> &mut Self {
        self.push_leaf(Connector::And, expr.to_string());
        self
    }

    pub fn or_where_raw(&mut self, expr: &str) -> &mut Self {
        self.push_leaf(Connector::Or, expr.to_string());
        self
    }

    /// Append a raw fragment together with its bindings. The caller keeps the
    /// fragment's `?` count equal to `values.len()`.
    pub fn where_template(&mut self, expr: &str, values: Vec<Value>) -> &mut Self {
        self.bindings.extend(values);
        self.push_leaf(Connector::And, expr.to_string());
        self
    }

    // ==================== groups ====================

    /// Collect clauses built by `build` into one parenthesized group joined
    /// with AND. A callback that appends nothing leaves this predicate
    /// untouched; no empty parens are ever emitted.
    pub fn where_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Predicate) -> Result<()>,
    {
        self.group(Connector::And, build)
    }

    /// `where_group` joined with OR.
    pub fn or_where_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Predicate) -> Result<()>,
    {
        self.group(Connector::Or, build)
    }

    fn group<F>(&mut self, connector: Connector, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Predicate) -> Result<()>,
    {
        let mut sub = Predicate::new(self.dialect);
        build(&mut sub)?;
        if !sub.is_empty() {
            self.bindings.extend(sub.bindings);
            self.clauses.push(Clause::Group {
                connector,
                clauses: sub.clauses,
            });
        }
        Ok(self)
    }

    // ==================== identifier comparisons ====================

    /// Append `left <op> right` where both sides are quoted identifiers.
    /// Used for join ON trees; binds nothing.
    pub fn on(&mut self, left: &str, operator: &str, right: &str) -> Result<&mut Self> {
        self.ident_pair(Connector::And, left, operator, right)
    }

    pub fn or_on(&mut self, left: &str, operator: &str, right: &str) -> Result<&mut Self> {
        self.ident_pair(Connector::Or, left, operator, right)
    }

    fn ident_pair(
        &mut self,
        connector: Connector,
        left: &str,
        operator: &str,
        right: &str,
    ) -> Result<&mut Self> {
        let op = normalize_operator(operator)?;
        let expr = format!(
            "{} {} {}",
            quote_field(self.dialect, left),
            op,
            quote_field(self.dialect, right)
        );
        self.push_leaf(connector, expr);
        Ok(self)
    }

    fn push_leaf(&mut self, connector: Connector, expr: String) {
        self.clauses.push(Clause::Leaf { connector, expr });
    }
}

fn normalize_operator(operator: &str) -> Result<String> {
    let candidate = operator.trim().to_ascii_uppercase();
    if ALLOWED_OPERATORS.contains(&candidate.as_str()) {
        Ok(candidate)
    } else {
        Err(Error::UnsupportedOperator(operator.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicate() -> Predicate {
        Predicate::new(Dialect::Sqlite)
    }

    #[test]
    fn test_first_clause_has_no_connector() {
        let mut p = predicate();
        p.where_("a", "=", 1).unwrap();
        p.where_("b", ">", 2).unwrap();
        assert_eq!(p.render(), "`a` = ? AND `b` > ?");
        assert_eq!(p.bindings(), &[Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn test_or_connector_belongs_to_the_following_clause() {
        let mut p = predicate();
        p.where_("a", "=", 1).unwrap();
        p.or_where("b", "=", 2).unwrap();
        assert_eq!(p.render(), "`a` = ? OR `b` = ?");
    }

    #[test]
    fn test_groups_render_parenthesized_in_order() {
        let mut p = predicate();
        p.where_("a", "=", 1).unwrap();
        p.where_group(|q| {
            q.where_("b", "=", 2)?;
            q.or_where("c", "=", 3)?;
            Ok(())
        })
        .unwrap();
        p.where_("d", "=", 4).unwrap();
        assert_eq!(p.render(), "`a` = ? AND (`b` = ? OR `c` = ?) AND `d` = ?");
        assert_eq!(
            p.bindings(),
            &[
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
                Value::Integer(4)
            ]
        );
    }

    #[test]
    fn test_groups_nest_to_arbitrary_depth() {
        let mut p = predicate();
        p.where_group(|q| {
            q.where_("a", "=", 1)?;
            q.or_where_group(|inner| {
                inner.where_("b", "=", 2)?;
                inner.where_("c", "=", 3)?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(p.render(), "(`a` = ? OR (`b` = ? AND `c` = ?))");
        assert_eq!(p.bindings().len(), 3);
    }

    #[test]
    fn test_empty_group_callback_is_a_no_op() {
        let mut p = predicate();
        p.where_("a", "=", 1).unwrap();
        let before = p.clone();
        p.where_group(|_| Ok(())).unwrap();
        assert_eq!(p, before);
    }

    #[test]
    fn test_failing_group_callback_leaves_parent_untouched() {
        let mut p = predicate();
        p.where_("a", "=", 1).unwrap();
        let before = p.clone();
        let err = p
            .where_group(|q| {
                q.where_("b", "=", 2)?;
                q.where_("c", "DROP TABLE", 3)?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperator(_)));
        assert_eq!(p, before);
    }

    #[test]
    fn test_operator_allow_list_is_enforced_before_rendering() {
        let mut p = predicate();
        let err = p.where_("a", "MATCHES", 1).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperator(op) if op == "MATCHES"));
        assert!(p.is_empty());
        assert!(p.bindings().is_empty());
    }

    #[test]
    fn test_operators_match_case_insensitively() {
        let mut p = predicate();
        p.where_("name", "like", "a%").unwrap();
        p.where_("note", "not like", "%x").unwrap();
        assert_eq!(p.render(), "`name` LIKE ? AND `note` NOT LIKE ?");
    }

    #[test]
    fn test_null_checks_bind_nothing() {
        let mut p = predicate();
        p.where_null("deleted_at");
        p.or_where_not_null("confirmed_at");
        assert_eq!(
            p.render(),
            "`deleted_at` IS NULL OR `confirmed_at` IS NOT NULL"
        );
        assert!(p.bindings().is_empty());
    }

    #[test]
    fn test_between_binds_both_bounds() {
        let mut p = predicate();
        p.where_between("price", 10, 100);
        p.where_not_between("stock", 0, 5);
        assert_eq!(
            p.render(),
            "`price` BETWEEN ? AND ? AND `stock` NOT BETWEEN ? AND ?"
        );
        assert_eq!(p.bindings().len(), 4);
    }

    #[test]
    fn test_in_list_binds_one_per_element() {
        let mut p = predicate();
        p.where_in("id", vec![1, 2, 3]);
        assert_eq!(p.render(), "`id` IN (?, ?, ?)");
        assert_eq!(p.bindings().len(), 3);
    }

    #[test]
    fn test_empty_in_lists_use_constant_predicates() {
        let mut p = predicate();
        p.where_in::<i32>("id", vec![]);
        p.where_not_in::<i32>("id", vec![]);
        assert_eq!(p.render(), "1=0 AND 1=1");
        assert!(p.bindings().is_empty());
    }

    #[test]
    fn test_raw_and_template_fragments() {
        let mut p = predicate();
        p.where_raw("LENGTH(name) > 3");
        p.where_template("(a = ? OR b = ?)", vec![Value::Integer(1), "x".into()]);
        assert_eq!(p.render(), "LENGTH(name) > 3 AND (a = ? OR b = ?)");
        assert_eq!(p.bindings().len(), 2);
    }

    #[test]
    fn test_identifier_pairs_quote_both_sides_and_bind_nothing() {
        let mut p = predicate();
        p.on("u.id", "=", "o.user_id").unwrap();
        p.or_on("u.id", "=", "o.owner_id").unwrap();
        assert_eq!(
            p.render(),
            "`u`.`id` = `o`.`user_id` OR `u`.`id` = `o`.`owner_id`"
        );
        assert!(p.bindings().is_empty());
    }

    #[test]
    fn test_postgres_dialect_quotes_with_double_quotes() {
        let mut p = Predicate::new(Dialect::Postgres);
        p.where_("role", "=", "admin").unwrap();
        assert_eq!(p.render(), "\"role\" = ?");
    }
}
