//! Override-expression compiler.
//!
//! A [`QueryBuilder`] accumulates statement text, rewriting identifier
//! tokens that resolve to current-row columns into positional parameters.
//! Each distinct reference gets one parameter; repeats reuse it. Once the
//! statement is prepared the builder is immutable; a failed prepare poisons
//! the instance so the owning cache can discard and rebuild it.

use crate::lexer::SqlTokenizer;
use rowlog_core::{
    BindingSource, ExecError, ParseError, PlanId, QueryEngine, RowImage, RowlogError, SqlType,
    SqlValue,
};

/// Host ceiling on parameters of one prepared statement.
pub const MAX_QUERY_ARGS: usize = 100;

/// Lifecycle of the plan behind a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    /// Accepting text; nothing prepared yet.
    Building,
    /// Plan attached; statement text is frozen.
    Prepared(PlanId),
    /// Last prepare attempt failed; discard and rebuild on next use.
    Failed,
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    sql: String,
    standard_strings: bool,
    /// Local parameter position -> external lookup index, deduplicated.
    arg_map: Vec<usize>,
    state: PlanState,
}

impl QueryBuilder {
    pub fn new(standard_strings: bool) -> Self {
        Self {
            sql: String::new(),
            standard_strings,
            arg_map: Vec::new(),
            state: PlanState::Building,
        }
    }

    pub fn state(&self) -> PlanState {
        self.state
    }

    pub fn is_prepared(&self) -> bool {
        matches!(self.state, PlanState::Prepared(_))
    }

    /// Accumulated statement text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of distinct parameters referenced so far.
    pub fn arg_count(&self) -> usize {
        self.arg_map.len()
    }

    /// Append text verbatim, without parsing.
    pub fn add_raw(&mut self, text: &str) {
        debug_assert!(matches!(self.state, PlanState::Building));
        self.sql.push_str(text);
    }

    /// Append an expression, rewriting resolvable identifier references
    /// to `$n` placeholders. Unresolved names pass through as raw SQL.
    pub fn add_parsed(
        &mut self,
        expr: &str,
        bindings: &impl BindingSource,
    ) -> Result<(), RowlogError> {
        for tok in SqlTokenizer::new(expr, self.standard_strings) {
            let tok = tok?;
            if tok.kind.is_ident() {
                self.handle_ident(tok.text, bindings)?;
            } else {
                self.sql.push_str(tok.text);
            }
        }
        Ok(())
    }

    /// The ident may or may not be an argument reference.
    fn handle_ident(
        &mut self,
        ident: &str,
        bindings: &impl BindingSource,
    ) -> Result<(), RowlogError> {
        let Some(real_idx) = bindings.resolve(ident) else {
            self.sql.push_str(ident);
            return Ok(());
        };

        let local_idx = match self.arg_map.iter().position(|&r| r == real_idx) {
            Some(i) => i,
            None => {
                if self.arg_map.len() >= MAX_QUERY_ARGS {
                    return Err(ParseError::TooManyParams {
                        max: MAX_QUERY_ARGS,
                    }
                    .into());
                }
                self.arg_map.push(real_idx);
                self.arg_map.len() - 1
            }
        };

        self.sql.push_str(&format!("${}", local_idx + 1));
        Ok(())
    }

    /// Prepare the accumulated statement exactly once.
    ///
    /// A failure leaves the builder in [`PlanState::Failed`]; the caller is
    /// expected to drop the instance and build a fresh one later.
    pub fn prepare(
        &mut self,
        bindings: &impl BindingSource,
        db: &mut impl QueryEngine,
    ) -> Result<(), RowlogError> {
        if self.is_prepared() {
            return Ok(());
        }
        let types: Vec<SqlType> = self.arg_map.iter().map(|&i| bindings.type_of(i)).collect();
        match db.prepare(&self.sql, &types) {
            Ok(plan) => {
                self.state = PlanState::Prepared(plan);
                Ok(())
            }
            Err(e) => {
                self.state = PlanState::Failed;
                Err(e.into())
            }
        }
    }

    /// Look up current argument values and run the plan.
    pub fn execute(
        &self,
        bindings: &impl BindingSource,
        db: &mut impl QueryEngine,
    ) -> Result<Vec<RowImage>, RowlogError> {
        let PlanState::Prepared(plan) = self.state else {
            return Err(ExecError::NotPrepared.into());
        };
        let args: Vec<Option<SqlValue>> =
            self.arg_map.iter().map(|&i| bindings.value_of(i)).collect();
        Ok(db.execute(plan, &args)?)
    }

    /// Release the prepared plan, if any. Called on cache teardown.
    pub fn release(&mut self, db: &mut impl QueryEngine) {
        if let PlanState::Prepared(plan) = self.state {
            db.release(plan);
            self.state = PlanState::Building;
        }
    }
}
