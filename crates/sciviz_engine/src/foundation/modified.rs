//! Dirty bit embedded in committable data

/// Tracks whether its owner changed since the last commit.
///
/// Cloning always yields a modified flag: a copy has never been pushed to
/// the device, whatever the state of its source.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ModifiedFlag {
    modified: bool,
}

impl ModifiedFlag {
    /// A clean flag
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag that starts dirty
    pub fn modified() -> Self {
        Self { modified: true }
    }

    /// Assign `value` to `target`, marking the flag only on an actual change
    pub fn update<T: PartialEq>(&mut self, target: &mut T, value: T) -> bool {
        if *target == value {
            return false;
        }
        *target = value;
        self.modified = true;
        true
    }

    /// Force the flag to dirty
    pub fn set_modified(&mut self) {
        self.modified = true;
    }

    /// Current state
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Mark as committed
    pub fn reset(&mut self) {
        self.modified = false;
    }

    /// Return the current state and reset it
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.modified)
    }
}

impl Clone for ModifiedFlag {
    fn clone(&self) -> Self {
        Self::modified()
    }

    fn clone_from(&mut self, _source: &Self) {
        self.modified = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_only_on_change() {
        let mut flag = ModifiedFlag::new();
        let mut value = 3;
        assert!(!flag.update(&mut value, 3));
        assert!(!flag.is_modified());
        assert!(flag.update(&mut value, 4));
        assert_eq!(value, 4);
        assert!(flag.is_modified());
    }

    #[test]
    fn test_clone_is_always_modified() {
        let clean = ModifiedFlag::new();
        assert!(clean.clone().is_modified());

        let mut target = ModifiedFlag::new();
        target.clone_from(&clean);
        assert!(target.is_modified());
    }

    #[test]
    fn test_move_keeps_state() {
        let flag = ModifiedFlag::new();
        let moved = flag;
        assert!(!moved.is_modified());
    }

    #[test]
    fn test_take_resets() {
        let mut flag = ModifiedFlag::modified();
        assert!(flag.take());
        assert!(!flag.take());
    }
}
