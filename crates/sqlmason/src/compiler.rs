//! Thin orchestration between builders and the grammar.

use crate::builder::{BuiltQuery, DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder};
use crate::error::QueryResult;
use crate::grammar::Grammar;

/// Implemented by every statement builder: compile to SQL plus bindings.
pub trait BuildSql {
    fn build(&self) -> QueryResult<BuiltQuery>;
}

impl BuildSql for SelectBuilder {
    fn build(&self) -> QueryResult<BuiltQuery> {
        SelectBuilder::build(self)
    }
}

impl BuildSql for InsertBuilder {
    fn build(&self) -> QueryResult<BuiltQuery> {
        InsertBuilder::build(self)
    }
}

impl BuildSql for UpdateBuilder {
    fn build(&self) -> QueryResult<BuiltQuery> {
        UpdateBuilder::build(self)
    }
}

impl BuildSql for DeleteBuilder {
    fn build(&self) -> QueryResult<BuiltQuery> {
        DeleteBuilder::build(self)
    }
}

/// Orchestrates the builder → grammar handoff and exposes the grammar to
/// capability code that needs identifier quoting outside clause compilation.
#[derive(Debug, Clone, Copy)]
pub struct SqlCompiler {
    grammar: Grammar,
}

impl SqlCompiler {
    pub fn new(grammar: Grammar) -> Self {
        Self { grammar }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Compile any builder into `(sql, bindings)`.
    pub fn compile<B: BuildSql>(&self, builder: &B) -> QueryResult<BuiltQuery> {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SelectBuilder;
    use crate::grammar::{Dialect, Grammar};

    #[test]
    fn compile_delegates_to_builder() {
        let compiler = SqlCompiler::new(Grammar::mysql());
        let builder = SelectBuilder::new("users", *compiler.grammar());
        let built = compiler.compile(&builder).unwrap();
        assert_eq!(built.sql, "SELECT * FROM `users`");
        assert!(built.bindings.is_empty());
    }

    #[test]
    fn exposes_grammar() {
        let compiler = SqlCompiler::new(Grammar::postgres());
        assert_eq!(compiler.grammar().dialect(), Dialect::Postgres);
    }
}
