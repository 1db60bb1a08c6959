//! Common surface of the scenario engines.

/// A time-stepped, action-driven patient scenario.
///
/// Implementations own all mutable run state. `dispatch`, `tick` and `reset`
/// never fail: bad numeric input is clamped or ignored.
pub trait ScenarioEngine {
    /// Discrete trainee input.
    type Action;
    /// Owned, self-contained view of the engine after a mutation.
    type Snapshot: Clone;

    /// Apply one action immediately.
    fn dispatch(&mut self, action: Self::Action);

    /// Advance the simulation by `dt_ms` milliseconds.
    ///
    /// Non-finite or non-positive `dt_ms` is a no-op.
    fn tick(&mut self, dt_ms: f64);

    /// Replace all run state with a fresh run of `scenario_id`.
    ///
    /// Unknown ids fall back to the engine's default scenario.
    fn reset(&mut self, scenario_id: &str);

    fn snapshot(&self) -> Self::Snapshot;

    /// Id of the scenario currently loaded.
    fn scenario_id(&self) -> &str;
}
