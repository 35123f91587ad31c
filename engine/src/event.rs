//! Window events observed by the lifecycle loop.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub enum Event {
    /// The window was closed or destroyed and the application should stop.
    Quit,
    Other,
}

impl Event {
    #[inline]
    #[must_use]
    pub fn is_quit(&self) -> bool {
        matches!(self, Self::Quit)
    }
}
