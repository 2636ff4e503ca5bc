//! Identifier allocation with reuse of released ids

use crate::core::error::{SceneError, SceneResult};

/// Unsigned integer types usable as ids
pub trait IdType: Copy + Eq + std::fmt::Debug + std::fmt::Display {
    /// Value before the first id
    const ZERO: Self;
    /// Largest representable id
    const MAX: Self;
    /// `self + 1`, callers guarantee `self < MAX`
    fn next(self) -> Self;
}

macro_rules! impl_id_type {
    ($($t:ty),*) => {
        $(impl IdType for $t {
            const ZERO: Self = 0;
            const MAX: Self = <$t>::MAX;
            fn next(self) -> Self {
                self + 1
            }
        })*
    };
}

impl_id_type!(u8, u16, u32, u64, usize);

/// Generates ids starting at 1.
///
/// Released ids are handed out again last-in first-out before the counter
/// moves on.
#[derive(Debug, Clone)]
pub struct IdFactory<T: IdType = u32> {
    counter: T,
    released: Vec<T>,
}

impl<T: IdType> IdFactory<T> {
    /// Create a new factory
    pub fn new() -> Self {
        Self {
            counter: T::ZERO,
            released: Vec::new(),
        }
    }

    /// Allocate an id
    pub fn generate_id(&mut self) -> SceneResult<T> {
        if let Some(id) = self.released.pop() {
            return Ok(id);
        }
        if self.counter == T::MAX {
            return Err(SceneError::Exhausted(format!(
                "no id left after {}",
                self.counter
            )));
        }
        self.counter = self.counter.next();
        Ok(self.counter)
    }

    /// Give an id back for reuse
    pub fn release_id(&mut self, id: T) {
        debug_assert!(!self.released.contains(&id), "id {id} released twice");
        self.released.push(id);
    }

    /// Reset the counter and forget released ids
    pub fn clear(&mut self) {
        self.counter = T::ZERO;
        self.released.clear();
    }

    /// Number of ids waiting for reuse
    pub fn released_count(&self) -> usize {
        self.released.len()
    }
}

impl<T: IdType> Default for IdFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    #[test]
    fn test_sequential_ids() {
        let mut factory = IdFactory::<u32>::new();
        let ids: Vec<_> = (0..3).map(|_| factory.generate_id().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_lifo_reuse() {
        let mut factory = IdFactory::<u32>::new();
        let a = factory.generate_id().unwrap();
        let b = factory.generate_id().unwrap();
        let _c = factory.generate_id().unwrap();

        factory.release_id(a);
        factory.release_id(b);
        assert_eq!(factory.generate_id().unwrap(), b);
        assert_eq!(factory.generate_id().unwrap(), a);
        assert_eq!(factory.generate_id().unwrap(), 4);
    }

    #[test]
    fn test_exhaustion_and_recovery() {
        let mut factory = IdFactory::<u8>::new();
        for expected in 1..=u8::MAX {
            assert_eq!(factory.generate_id().unwrap(), expected);
        }
        let err = factory.generate_id().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exhausted);

        factory.release_id(42);
        assert_eq!(factory.generate_id().unwrap(), 42);
        assert!(factory.generate_id().is_err());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut factory = IdFactory::<u16>::new();
        factory.generate_id().unwrap();
        let id = factory.generate_id().unwrap();
        factory.release_id(id);

        factory.clear();
        assert_eq!(factory.released_count(), 0);
        assert_eq!(factory.generate_id().unwrap(), 1);
    }
}
