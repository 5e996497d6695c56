//! Clause value objects and their fixed compile-order priorities.
//!
//! Each clause is a small immutable value object taking already-resolved
//! inputs. `compile` returns the SQL fragment (empty when inapplicable) and
//! `bindings` its ordered parameter list. The invariant throughout: a
//! clause's bindings appear in the same relative order as the clause itself
//! appears in the final compiled statement.

use crate::condition::{self, ConditionBuilder};
use crate::grammar::Grammar;
use crate::ident::TableIdent;
use crate::value::{Arg, Value};

/// Fixed clause ordering; lower values compile earlier in the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClausePriority {
    Join = 10,
    Set = 15,
    Where = 20,
    GroupBy = 30,
    Having = 40,
    OrderBy = 50,
    Limit = 60,
    Values = 70,
}

/// Join flavor keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    FullOuter,
}

impl JoinKind {
    fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::FullOuter => "FULL OUTER",
        }
    }
}

/// `<kind> JOIN <table> ON <condition>`; the target may be a subquery and
/// `table.column` tokens in the ON condition get dialect-quoted.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    kind: JoinKind,
    table: TableIdent,
    on: String,
    bindings: Vec<Value>,
}

impl JoinClause {
    pub fn new(
        kind: JoinKind,
        table: TableIdent,
        on: impl Into<String>,
        bindings: Vec<Value>,
    ) -> Self {
        Self {
            kind,
            table,
            on: on.into(),
            bindings,
        }
    }

    fn compile(&self, grammar: &Grammar) -> String {
        format!(
            "{} JOIN {} ON {}",
            self.kind.keyword(),
            grammar.wrap_table(&self.table),
            condition::rewrite_identifiers(&self.on, grammar)
        )
    }
}

/// `SET col = ?, other = <raw>`; raw assignments emit verbatim with no
/// binding.
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    assignments: Vec<(String, Arg)>,
}

impl SetClause {
    pub fn new(assignments: Vec<(String, Arg)>) -> Self {
        Self { assignments }
    }

    fn compile(&self, grammar: &Grammar) -> String {
        if self.assignments.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .assignments
            .iter()
            .map(|(column, arg)| match arg {
                Arg::Raw(sql) => format!("{} = {}", grammar.wrap_identifier(column), sql),
                Arg::Literal(_) => format!("{} = ?", grammar.wrap_identifier(column)),
            })
            .collect();
        format!("SET {}", parts.join(", "))
    }

    fn bindings(&self) -> Vec<Value> {
        self.assignments
            .iter()
            .filter_map(|(_, arg)| match arg {
                Arg::Literal(value) => Some(value.clone()),
                Arg::Raw(_) => None,
            })
            .collect()
    }
}

/// `GROUP BY col, ...`; raw-tagged entries are emitted verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupByClause {
    pub(crate) columns: Vec<String>,
}

impl GroupByClause {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    fn compile(&self, grammar: &Grammar) -> String {
        if self.columns.is_empty() {
            return String::new();
        }
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| grammar.wrap_identifier(c))
            .collect();
        format!("GROUP BY {}", cols.join(", "))
    }
}

/// Sort direction, normalized to `ASC`/`DESC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    /// Anything that is not `DESC` (case-insensitive) orders ascending.
    pub fn parse(input: &str) -> Self {
        if input.trim().eq_ignore_ascii_case("desc") {
            OrderDirection::Desc
        } else {
            OrderDirection::Asc
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// `ORDER BY col ASC, ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub(crate) orderings: Vec<(String, OrderDirection)>,
}

impl OrderByClause {
    pub fn new(orderings: Vec<(String, OrderDirection)>) -> Self {
        Self { orderings }
    }

    fn compile(&self, grammar: &Grammar) -> String {
        if self.orderings.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .orderings
            .iter()
            .map(|(column, direction)| {
                format!("{} {}", grammar.wrap_identifier(column), direction.keyword())
            })
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

/// `LIMIT n [OFFSET m]`; OFFSET is omitted when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitClause {
    limit: u64,
    offset: Option<u64>,
}

impl LimitClause {
    pub fn new(limit: u64, offset: Option<u64>) -> Self {
        Self { limit, offset }
    }

    fn compile(&self) -> String {
        match self.offset {
            Some(offset) => format!("LIMIT {} OFFSET {}", self.limit, offset),
            None => format!("LIMIT {}", self.limit),
        }
    }
}

/// `(col, ...) VALUES (?, ...), (?, ...)` for INSERT; one parenthesized
/// placeholder group per row, bindings row-major in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesClause {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ValuesClause {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    fn compile(&self, grammar: &Grammar) -> String {
        if self.columns.is_empty() || self.rows.is_empty() {
            return String::new();
        }
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| grammar.wrap_identifier_plain(c))
            .collect();
        let row = format!("({})", grammar.placeholders(self.columns.len()));
        let rows = vec![row; self.rows.len()].join(", ");
        format!("({}) VALUES {}", cols.join(", "), rows)
    }

    fn bindings(&self) -> Vec<Value> {
        self.rows.iter().flatten().cloned().collect()
    }
}

/// `WHERE <tree>`, suppressed entirely when the tree is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    pub(crate) tree: ConditionBuilder,
}

impl WhereClause {
    pub fn new(tree: ConditionBuilder) -> Self {
        Self { tree }
    }

    fn compile(&self, grammar: &Grammar) -> String {
        let sql = self.tree.compile(grammar);
        if sql.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", sql)
        }
    }
}

/// `HAVING <tree>`, suppressed entirely when the tree is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HavingClause {
    pub(crate) tree: ConditionBuilder,
}

impl HavingClause {
    pub fn new(tree: ConditionBuilder) -> Self {
        Self { tree }
    }

    fn compile(&self, grammar: &Grammar) -> String {
        let sql = self.tree.compile(grammar);
        if sql.is_empty() {
            String::new()
        } else {
            format!("HAVING {}", sql)
        }
    }
}

/// A unit of SQL with its own bindings and ordering priority.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Join(JoinClause),
    Set(SetClause),
    Where(WhereClause),
    GroupBy(GroupByClause),
    Having(HavingClause),
    OrderBy(OrderByClause),
    Limit(LimitClause),
    Values(ValuesClause),
}

impl Clause {
    /// The clause's default ordering priority.
    pub fn priority(&self) -> ClausePriority {
        match self {
            Clause::Join(_) => ClausePriority::Join,
            Clause::Set(_) => ClausePriority::Set,
            Clause::Where(_) => ClausePriority::Where,
            Clause::GroupBy(_) => ClausePriority::GroupBy,
            Clause::Having(_) => ClausePriority::Having,
            Clause::OrderBy(_) => ClausePriority::OrderBy,
            Clause::Limit(_) => ClausePriority::Limit,
            Clause::Values(_) => ClausePriority::Values,
        }
    }

    /// Compile to a SQL fragment; an empty string means "inapplicable" and
    /// the fragment is dropped from the final statement.
    pub fn compile(&self, grammar: &Grammar) -> String {
        match self {
            Clause::Join(c) => c.compile(grammar),
            Clause::Set(c) => c.compile(grammar),
            Clause::Where(c) => c.compile(grammar),
            Clause::GroupBy(c) => c.compile(grammar),
            Clause::Having(c) => c.compile(grammar),
            Clause::OrderBy(c) => c.compile(grammar),
            Clause::Limit(c) => c.compile(),
            Clause::Values(c) => c.compile(grammar),
        }
    }

    /// Ordered parameter list for this clause.
    pub fn bindings(&self) -> Vec<Value> {
        match self {
            Clause::Join(c) => c.bindings.clone(),
            Clause::Set(c) => c.bindings(),
            Clause::Where(c) => c.tree.bindings(),
            Clause::Having(c) => c.tree.bindings(),
            Clause::Values(c) => c.bindings(),
            Clause::GroupBy(_) | Clause::OrderBy(_) | Clause::Limit(_) => Vec::new(),
        }
    }
}
