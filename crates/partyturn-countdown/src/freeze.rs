//! Reentrant countdown pause.

use partyturn_core::error::TurnError;
use tracing::debug;

/// A counting pause lock.
///
/// Every `push` must be matched by one `pop`. The countdown only resumes
/// once the depth returns to zero, so no caller may assume it holds the only
/// freeze.
///
/// `clear` drops every freeze at once and bumps the epoch. A holder that
/// recorded the epoch when it pushed must not pop once the epoch has moved
/// on, or it would release a freeze taken by someone else after the clear.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FreezeStack {
    depth: usize,
    epoch: u64,
}

impl FreezeStack {
    /// Creates an unfrozen stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one freeze and returns the new depth.
    pub fn push(&mut self, reason: &str) -> usize {
        self.depth += 1;
        debug!(reason, depth = self.depth, "freeze pushed");
        self.depth
    }

    /// Releases one freeze and returns the new depth.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::FreezeUnderflow` if nothing is frozen.
    pub fn pop(&mut self) -> Result<usize, TurnError> {
        if self.depth == 0 {
            return Err(TurnError::FreezeUnderflow);
        }
        self.depth -= 1;
        debug!(depth = self.depth, "freeze popped");
        Ok(self.depth)
    }

    /// Releases every freeze and returns how many were held.
    pub fn clear(&mut self) -> usize {
        self.epoch += 1;
        std::mem::take(&mut self.depth)
    }

    /// Number of clears so far.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Current number of outstanding freezes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `true` while at least one freeze is held.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_balance() {
        let mut stack = FreezeStack::new();
        assert_eq!(stack.push("menu"), 1);
        assert_eq!(stack.push("tutorial"), 2);
        assert_eq!(stack.pop(), Ok(1));
        assert!(stack.is_frozen());
        assert_eq!(stack.pop(), Ok(0));
        assert!(!stack.is_frozen());
    }

    #[test]
    fn test_pop_on_empty_stack_underflows() {
        let mut stack = FreezeStack::new();
        assert_eq!(stack.pop(), Err(TurnError::FreezeUnderflow));
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut stack = FreezeStack::new();
        stack.push("a");
        stack.push("b");
        stack.push("c");
        assert_eq!(stack.clear(), 3);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_clear_moves_the_epoch() {
        let mut stack = FreezeStack::new();
        let before = stack.epoch();
        stack.push("a");
        assert_eq!(stack.epoch(), before);

        stack.clear();
        stack.push("b");

        assert_eq!(stack.epoch(), before + 1);
        assert_eq!(stack.depth(), 1);
    }
}
