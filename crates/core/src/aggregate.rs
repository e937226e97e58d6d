//! Aggregate root traits for lineup domain models.

/// Aggregate root marker + minimal interface.
///
/// The aggregate root is the only entry point for mutating anything it owns.
/// Entities inside it (slots, markers) are never mutated in isolation.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;
}

/// Aggregate execution semantics (pure, deterministic apart from generated ids/keys).
///
/// - **Decision logic**: `handle(&self, cmd)` returns the changes to persist.
/// - **State mutation**: `apply(&mut self, change)` evolves state.
///
/// Aggregates must not perform IO. The changes they return are what the
/// repository commits atomically; an empty list means "nothing to do".
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Change: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Evolve in-memory state from a single change.
    fn apply(&mut self, change: &Self::Change);

    /// Decide which changes to make given the current state and a command.
    ///
    /// This must not mutate state. State evolution is done through `apply`.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Change>, Self::Error>;

    /// Decide and immediately apply, returning the applied changes.
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Change>, Self::Error> {
        let changes = self.handle(command)?;
        for change in &changes {
            self.apply(change);
        }
        Ok(changes)
    }
}
