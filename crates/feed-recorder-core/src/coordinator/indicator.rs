/// User-visible recording indicator, set and cleared only by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    /// No recording.
    Idle,
    /// A session is recording.
    Recording,
}
