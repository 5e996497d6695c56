//! Statement builders.
//!
//! Builders accumulate prioritized clauses through fluent, consuming method
//! chains and compile deterministically on every `build()` call. Shared
//! fluent logic lives in the capability traits; each concrete builder
//! implements exactly the subset relevant to its statement kind.

mod capability;
mod delete;
mod insert;
mod select;
mod update;

#[cfg(test)]
mod tests;

pub use capability::{
    BuilderAccess, GroupByCapable, HavingCapable, JoinCapable, LimitCapable, OrderByCapable,
    WhenCapable, WhereCapable,
};
pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;

use crate::clause::{
    Clause, ClausePriority, GroupByClause, HavingClause, OrderByClause, WhereClause,
};
use crate::condition::ConditionBuilder;
use crate::error::{QueryError, QueryResult};
use crate::grammar::Grammar;
use crate::value::Value;

/// A compiled statement: SQL text plus ordered bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub bindings: Vec<Value>,
}

#[derive(Debug, Clone)]
struct ClauseEntry {
    priority: ClausePriority,
    clause: Clause,
}

/// Shared clause accumulation behind every statement builder.
///
/// Not part of the public API surface; capability traits reach it through
/// [`BuilderAccess`].
#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct BuilderCore {
    pub(crate) table: String,
    pub(crate) grammar: Grammar,
    clauses: Vec<ClauseEntry>,
    pub(crate) build_error: Option<QueryError>,
}

impl BuilderCore {
    pub(crate) fn new(table: &str, grammar: Grammar) -> Self {
        Self {
            table: table.to_string(),
            grammar,
            clauses: Vec::new(),
            build_error: None,
        }
    }

    /// Register a clause under the given priority. Insertion order is the
    /// tie-break for equal priorities.
    pub(crate) fn add_clause(&mut self, clause: Clause, priority: ClausePriority) {
        self.clauses.push(ClauseEntry { priority, clause });
    }

    /// Replace any clause of the same kind, then register the new one.
    pub(crate) fn replace_clause(&mut self, clause: Clause, priority: ClausePriority) {
        let kind = std::mem::discriminant(&clause);
        self.clauses
            .retain(|entry| std::mem::discriminant(&entry.clause) != kind);
        self.add_clause(clause, priority);
    }

    /// The WHERE condition tree, registering the clause on first use.
    pub(crate) fn where_tree_mut(&mut self) -> &mut ConditionBuilder {
        if !self
            .clauses
            .iter()
            .any(|entry| matches!(entry.clause, Clause::Where(_)))
        {
            self.add_clause(
                Clause::Where(WhereClause::default()),
                ClausePriority::Where,
            );
        }
        self.clauses
            .iter_mut()
            .find_map(|entry| match &mut entry.clause {
                Clause::Where(clause) => Some(&mut clause.tree),
                _ => None,
            })
            .expect("where clause registered above")
    }

    /// The HAVING condition tree, registering the clause on first use.
    pub(crate) fn having_tree_mut(&mut self) -> &mut ConditionBuilder {
        if !self
            .clauses
            .iter()
            .any(|entry| matches!(entry.clause, Clause::Having(_)))
        {
            self.add_clause(
                Clause::Having(HavingClause::default()),
                ClausePriority::Having,
            );
        }
        self.clauses
            .iter_mut()
            .find_map(|entry| match &mut entry.clause {
                Clause::Having(clause) => Some(&mut clause.tree),
                _ => None,
            })
            .expect("having clause registered above")
    }

    pub(crate) fn group_by_mut(&mut self) -> Option<&mut GroupByClause> {
        self.clauses
            .iter_mut()
            .find_map(|entry| match &mut entry.clause {
                Clause::GroupBy(clause) => Some(clause),
                _ => None,
            })
    }

    pub(crate) fn order_by_mut(&mut self) -> Option<&mut OrderByClause> {
        self.clauses
            .iter_mut()
            .find_map(|entry| match &mut entry.clause {
                Clause::OrderBy(clause) => Some(clause),
                _ => None,
            })
    }

    /// Keep only the first error; later mutations still apply so the caller
    /// can inspect the builder, but `build()` reports the original failure.
    pub(crate) fn record_error(&mut self, err: QueryError) {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }

    pub(crate) fn check_build_error(&self) -> QueryResult<()> {
        match &self.build_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub(crate) fn ensure_table(&self) -> QueryResult<()> {
        if self.table.trim().is_empty() {
            return Err(QueryError::configuration("Table name cannot be empty"));
        }
        Ok(())
    }

    /// Compile all clauses in stable priority order, collecting bindings in
    /// the same order the fragments appear in the final statement.
    pub(crate) fn compile_clauses(&self) -> (Vec<String>, Vec<Value>) {
        self.compile_clauses_filtered(|_| true)
    }

    pub(crate) fn compile_clauses_filtered(
        &self,
        keep: impl Fn(&Clause) -> bool,
    ) -> (Vec<String>, Vec<Value>) {
        let mut ordered: Vec<&ClauseEntry> = self
            .clauses
            .iter()
            .filter(|entry| keep(&entry.clause))
            .collect();
        ordered.sort_by_key(|entry| entry.priority);

        let mut fragments = Vec::new();
        let mut bindings = Vec::new();
        for entry in ordered {
            let fragment = entry.clause.compile(&self.grammar);
            if fragment.is_empty() {
                continue;
            }
            bindings.extend(entry.clause.bindings());
            fragments.push(fragment);
        }
        (fragments, bindings)
    }
}
