/// A domain change decided by an aggregate.
///
/// Changes are:
/// - **immutable** (treat them as facts about one command)
/// - **row-shaped** (each one maps onto a single repository write)
pub trait Change: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable change name (e.g. "schedule.slot.repositioned"), used in logs.
    fn change_type(&self) -> &'static str;
}
