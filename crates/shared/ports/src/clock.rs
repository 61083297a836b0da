use gridflex_core::TimeCount;

/// Port for discrete simulation time
///
/// Time is a non-negative step counter; implementations decide how it is
/// advanced.
pub trait Clock: Send + Sync {
    /// Current number of elapsed steps
    fn time_count(&self) -> TimeCount;

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
