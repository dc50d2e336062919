use std::num::NonZero;

/// How many items a buffer is allowed to retain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capacity {
    #[default]
    Unbounded,
    Bounded(NonZero<usize>),
}

impl Capacity {
    /// Returns true if a buffer with this capacity can hold at least `n` items
    pub fn holds(&self, n: usize) -> bool {
        match self {
            Capacity::Unbounded => true,
            Capacity::Bounded(cap) => cap.get() >= n,
        }
    }
}

impl From<usize> for Capacity {
    fn from(value: usize) -> Self {
        match NonZero::new(value) {
            Some(cap) => Capacity::Bounded(cap),
            None => Capacity::Unbounded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_unbounded() {
        assert_eq!(Capacity::from(0usize), Capacity::Unbounded);
        assert_eq!(
            Capacity::from(3usize),
            Capacity::Bounded(NonZero::new(3).unwrap())
        );
    }

    #[test]
    fn test_holds() {
        assert!(Capacity::Unbounded.holds(usize::MAX));
        assert!(Capacity::from(11usize).holds(11));
        assert!(!Capacity::from(10usize).holds(11));
    }
}
