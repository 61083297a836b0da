/// Accepts a visitor walking its contents
pub trait Visitable<V: ?Sized> {
    fn accept(&self, visitor: &mut V);
}

/// Hand-off point for report writers
pub trait Writable {
    /// Human-readable rendering of the result
    fn format_result(&self) -> String;
}
