//! Boolean condition trees for WHERE and HAVING.
//!
//! A [`ConditionBuilder`] holds an append-only, ordered list of entries.
//! Each entry carries a logical glue (`AND`/`OR`, ignored for the first
//! entry), an expression (a literal SQL fragment with `?` placeholders, or a
//! nested sub-tree rendered in parentheses) and that entry's bindings.
//! Compiling preserves entry order; bindings flatten depth-first,
//! left-to-right.

use crate::grammar::Grammar;
use crate::raw::Raw;
use crate::value::Value;
use regex::Regex;
use std::sync::LazyLock;

/// Logical connector between adjacent condition entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glue {
    And,
    Or,
}

impl Glue {
    fn keyword(self) -> &'static str {
        match self {
            Glue::And => "AND",
            Glue::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Fragment(String),
    Group(ConditionBuilder),
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    glue: Glue,
    expr: Expr,
    bindings: Vec<Value>,
}

/// Ordered, possibly nested AND/OR expression tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionBuilder {
    entries: Vec<Entry>,
}

static DOTTED_IDENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\.[A-Za-z_][A-Za-z0-9_]*\b").expect("valid regex")
});

impl ConditionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty tree compiles to an empty string; the owning clause must
    /// then suppress its keyword entirely.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a literal fragment with the given glue.
    pub fn push(&mut self, glue: Glue, expr: impl Into<String>, bindings: Vec<Value>) {
        self.entries.push(Entry {
            glue,
            expr: Expr::Fragment(expr.into()),
            bindings,
        });
    }

    /// Append a nested group built by `f`; it renders in parentheses and its
    /// bindings splice in at this position.
    pub fn push_group(&mut self, glue: Glue, f: impl FnOnce(&mut ConditionBuilder)) {
        let mut nested = ConditionBuilder::new();
        f(&mut nested);
        self.entries.push(Entry {
            glue,
            expr: Expr::Group(nested),
            bindings: Vec::new(),
        });
    }

    /// AND-glued fragment.
    pub fn and(&mut self, expr: impl Into<String>, bindings: Vec<Value>) {
        self.push(Glue::And, expr, bindings);
    }

    /// OR-glued fragment.
    pub fn or(&mut self, expr: impl Into<String>, bindings: Vec<Value>) {
        self.push(Glue::Or, expr, bindings);
    }

    /// AND-glued nested group.
    pub fn and_group(&mut self, f: impl FnOnce(&mut ConditionBuilder)) {
        self.push_group(Glue::And, f);
    }

    /// OR-glued nested group.
    pub fn or_group(&mut self, f: impl FnOnce(&mut ConditionBuilder)) {
        self.push_group(Glue::Or, f);
    }

    /// Render the tree in entry order, prefixing every entry after the
    /// first with its glue keyword. Empty groups contribute nothing.
    pub fn compile(&self, grammar: &Grammar) -> String {
        let mut sql = String::new();
        for entry in &self.entries {
            let rendered = match &entry.expr {
                Expr::Fragment(expr) => rewrite_identifiers(expr, grammar),
                Expr::Group(tree) => {
                    let inner = tree.compile(grammar);
                    if inner.is_empty() {
                        continue;
                    }
                    format!("({})", inner)
                }
            };
            if !sql.is_empty() {
                sql.push(' ');
                sql.push_str(entry.glue.keyword());
                sql.push(' ');
            }
            sql.push_str(&rendered);
        }
        sql
    }

    /// Flattened bindings in registration order, recursing into nested
    /// trees depth-first, left-to-right.
    pub fn bindings(&self) -> Vec<Value> {
        let mut out = Vec::new();
        self.collect_bindings(&mut out);
        out
    }

    fn collect_bindings(&self, out: &mut Vec<Value>) {
        for entry in &self.entries {
            match &entry.expr {
                Expr::Fragment(_) => out.extend(entry.bindings.iter().cloned()),
                Expr::Group(tree) => tree.collect_bindings(out),
            }
        }
    }
}

/// Rewrite `table.column`-shaped tokens into dialect-quoted form, unless the
/// token sits inside a quoted string literal or the whole expression is raw.
pub(crate) fn rewrite_identifiers(expr: &str, grammar: &Grammar) -> String {
    if Raw::is(expr) {
        return Raw::get(expr).to_string();
    }

    let mut out = String::with_capacity(expr.len());
    let mut last = 0;
    for m in DOTTED_IDENT.find_iter(expr) {
        out.push_str(&expr[last..m.start()]);
        if inside_quotes(expr, m.start()) {
            out.push_str(m.as_str());
        } else {
            out.push_str(&grammar.wrap_identifier(m.as_str()));
        }
        last = m.end();
    }
    out.push_str(&expr[last..]);
    out
}

/// Naive quote-parity scan: a position counts as inside quotes when an odd
/// number of unescaped single or double quotes precedes it.
fn inside_quotes(expr: &str, position: usize) -> bool {
    let mut single = 0usize;
    let mut double = 0usize;
    let mut escaped = false;
    for ch in expr[..position].chars() {
        match ch {
            '\'' if !escaped => single += 1,
            '"' if !escaped => double += 1,
            _ => {}
        }
        escaped = ch == '\\' && !escaped;
    }
    single % 2 != 0 || double % 2 != 0
}
