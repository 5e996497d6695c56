//! Capability traits shared across statement builders.
//!
//! Each trait covers one clause family and carries its fluent logic as
//! default methods over the [`BuilderAccess`] core accessor, so a concrete
//! builder opts into exactly the capabilities its statement kind supports.

use super::select::SelectBuilder;
use super::BuilderCore;
use crate::clause::{
    Clause, ClausePriority, GroupByClause, JoinClause, JoinKind, LimitClause, OrderByClause,
    OrderDirection,
};
use crate::condition::ConditionBuilder;
use crate::ident::TableIdent;
use crate::value::{IntoBindings, Value};

/// Access to the shared clause-accumulation core.
#[doc(hidden)]
pub trait BuilderAccess: Sized {
    fn core(&self) -> &BuilderCore;
    fn core_mut(&mut self) -> &mut BuilderCore;
}

/// WHERE-condition accumulation with AND/OR glue and nested groups.
pub trait WhereCapable: BuilderAccess {
    /// Append an AND-glued condition. `expr` is a SQL fragment with `?`
    /// placeholders; `table.column` tokens are dialect-quoted unless raw or
    /// inside a string literal.
    fn where_(mut self, expr: &str, bindings: impl IntoBindings) -> Self {
        self.core_mut()
            .where_tree_mut()
            .and(expr, bindings.into_bindings());
        self
    }

    /// Alias for [`WhereCapable::where_`].
    fn and_where(self, expr: &str, bindings: impl IntoBindings) -> Self {
        self.where_(expr, bindings)
    }

    /// Append an OR-glued condition.
    fn or_where(mut self, expr: &str, bindings: impl IntoBindings) -> Self {
        self.core_mut()
            .where_tree_mut()
            .or(expr, bindings.into_bindings());
        self
    }

    /// Append an AND-glued nested group; the callback's tree renders in
    /// parentheses with its bindings spliced in at this position.
    fn where_group(mut self, f: impl FnOnce(&mut ConditionBuilder)) -> Self {
        self.core_mut().where_tree_mut().and_group(f);
        self
    }

    /// Append an OR-glued nested group.
    fn or_where_group(mut self, f: impl FnOnce(&mut ConditionBuilder)) -> Self {
        self.core_mut().where_tree_mut().or_group(f);
        self
    }

    /// `column IN (?, ...)`. Empty value lists leave the builder unchanged.
    fn where_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        if values.is_empty() {
            return self;
        }
        let placeholders = self.core().grammar.placeholders(values.len());
        let expr = format!("{} IN ({})", column, placeholders);
        let bindings = values.into_iter().map(Into::into).collect();
        self.core_mut().where_tree_mut().and(expr, bindings);
        self
    }

    /// OR-glued `column IN (?, ...)`.
    fn or_where_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        if values.is_empty() {
            return self;
        }
        let placeholders = self.core().grammar.placeholders(values.len());
        let expr = format!("{} IN ({})", column, placeholders);
        let bindings = values.into_iter().map(Into::into).collect();
        self.core_mut().where_tree_mut().or(expr, bindings);
        self
    }
}

/// JOIN registration, including derived-table joins.
pub trait JoinCapable: BuilderAccess {
    /// INNER JOIN.
    fn join(self, table: &str, on: &str, bindings: impl IntoBindings) -> Self {
        self.add_join(JoinKind::Inner, table, on, bindings)
    }

    fn left_join(self, table: &str, on: &str, bindings: impl IntoBindings) -> Self {
        self.add_join(JoinKind::Left, table, on, bindings)
    }

    fn right_join(self, table: &str, on: &str, bindings: impl IntoBindings) -> Self {
        self.add_join(JoinKind::Right, table, on, bindings)
    }

    fn full_join(self, table: &str, on: &str, bindings: impl IntoBindings) -> Self {
        self.add_join(JoinKind::FullOuter, table, on, bindings)
    }

    #[doc(hidden)]
    fn add_join(
        mut self,
        kind: JoinKind,
        table: &str,
        on: &str,
        bindings: impl IntoBindings,
    ) -> Self {
        let clause = JoinClause::new(
            kind,
            TableIdent::parse(table),
            on,
            bindings.into_bindings(),
        );
        self.core_mut()
            .add_clause(Clause::Join(clause), ClausePriority::Join);
        self
    }

    /// Join against a derived table: `f` configures a nested select against
    /// an empty table name, its compiled SQL is parenthesized and aliased as
    /// the join target, and its bindings precede the extra ON-condition
    /// bindings.
    fn join_sub(
        mut self,
        f: impl FnOnce(SelectBuilder) -> SelectBuilder,
        alias: &str,
        on: &str,
        bindings: impl IntoBindings,
    ) -> Self {
        let grammar = self.core().grammar;
        let nested = f(SelectBuilder::new("", grammar));
        match nested.build() {
            Ok(built) => {
                let table = TableIdent::subquery(built.sql, alias);
                let mut all = built.bindings;
                all.extend(bindings.into_bindings());
                self.core_mut().add_clause(
                    Clause::Join(JoinClause::new(JoinKind::Inner, table, on, all)),
                    ClausePriority::Join,
                );
            }
            Err(err) => self.core_mut().record_error(err),
        }
        self
    }
}

/// GROUP BY column accumulation.
pub trait GroupByCapable: BuilderAccess {
    /// Append grouping columns; repeated calls extend the single GROUP BY
    /// clause.
    fn group_by(mut self, columns: &[&str]) -> Self {
        let new: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let core = self.core_mut();
        match core.group_by_mut() {
            Some(clause) => clause.columns.extend(new),
            None => core.add_clause(
                Clause::GroupBy(GroupByClause::new(new)),
                ClausePriority::GroupBy,
            ),
        }
        self
    }
}

/// HAVING-condition accumulation; same contract as WHERE over the grouped
/// result.
pub trait HavingCapable: BuilderAccess {
    fn having(mut self, expr: &str, bindings: impl IntoBindings) -> Self {
        self.core_mut()
            .having_tree_mut()
            .and(expr, bindings.into_bindings());
        self
    }

    fn or_having(mut self, expr: &str, bindings: impl IntoBindings) -> Self {
        self.core_mut()
            .having_tree_mut()
            .or(expr, bindings.into_bindings());
        self
    }

    /// `column IN (?, ...)` over the grouped result. Empty value lists leave
    /// the builder unchanged.
    fn having_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        if values.is_empty() {
            return self;
        }
        let placeholders = self.core().grammar.placeholders(values.len());
        let expr = format!("{} IN ({})", column, placeholders);
        let bindings = values.into_iter().map(Into::into).collect();
        self.core_mut().having_tree_mut().and(expr, bindings);
        self
    }

    fn or_having_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        if values.is_empty() {
            return self;
        }
        let placeholders = self.core().grammar.placeholders(values.len());
        let expr = format!("{} IN ({})", column, placeholders);
        let bindings = values.into_iter().map(Into::into).collect();
        self.core_mut().having_tree_mut().or(expr, bindings);
        self
    }
}

/// ORDER BY with replace-vs-append semantics.
pub trait OrderByCapable: BuilderAccess {
    /// Replace any previously set ordering with this single column.
    /// `direction` is normalized; anything but `desc` orders ascending.
    fn order_by(mut self, column: &str, direction: &str) -> Self {
        let ordering = (column.to_string(), OrderDirection::parse(direction));
        self.core_mut().replace_clause(
            Clause::OrderBy(OrderByClause::new(vec![ordering])),
            ClausePriority::OrderBy,
        );
        self
    }

    /// Append an ordering without replacing earlier ones.
    fn add_order_by(mut self, column: &str, direction: &str) -> Self {
        let ordering = (column.to_string(), OrderDirection::parse(direction));
        let core = self.core_mut();
        match core.order_by_mut() {
            Some(clause) => clause.orderings.push(ordering),
            None => core.add_clause(
                Clause::OrderBy(OrderByClause::new(vec![ordering])),
                ClausePriority::OrderBy,
            ),
        }
        self
    }
}

/// LIMIT/OFFSET with pagination helper.
pub trait LimitCapable: BuilderAccess {
    /// Replace any prior limit.
    fn limit(mut self, limit: u64) -> Self {
        self.core_mut().replace_clause(
            Clause::Limit(LimitClause::new(limit, None)),
            ClausePriority::Limit,
        );
        self
    }

    /// Replace any prior limit, with an explicit offset.
    fn limit_offset(mut self, limit: u64, offset: u64) -> Self {
        self.core_mut().replace_clause(
            Clause::Limit(LimitClause::new(limit, Some(offset))),
            ClausePriority::Limit,
        );
        self
    }

    /// 1-based pagination; `page` is clamped to >= 1.
    fn paginate(self, per_page: u64, page: u64) -> Self {
        let page = page.max(1);
        self.limit_offset(per_page, (page - 1) * per_page)
    }
}

/// Conditional builder mutation preserving the fluent chain.
pub trait WhenCapable: Sized {
    /// Apply `f` when `condition` holds.
    fn when(self, condition: bool, f: impl FnOnce(Self) -> Self) -> Self {
        if condition { f(self) } else { self }
    }

    /// Apply `f` when `condition` holds, `default` otherwise.
    fn when_else(
        self,
        condition: bool,
        f: impl FnOnce(Self) -> Self,
        default: impl FnOnce(Self) -> Self,
    ) -> Self {
        if condition { f(self) } else { default(self) }
    }
}
