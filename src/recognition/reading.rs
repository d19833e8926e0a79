//! Outcome of one decode attempt.

/// The result of reading one field on one frame.
///
/// A reading is either a fully parsed value or explicitly unreadable;
/// partially recognized text never produces a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading<T> {
    Value(T),
    Unreadable,
}

impl<T> Reading<T> {
    /// Returns the value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Reading::Value(v) => Some(v),
            Reading::Unreadable => None,
        }
    }

    pub fn is_readable(&self) -> bool {
        matches!(self, Reading::Value(_))
    }

    /// Returns `self` if readable, otherwise evaluates `f`.
    pub fn or_else(self, f: impl FnOnce() -> Reading<T>) -> Reading<T> {
        match self {
            Reading::Value(_) => self,
            Reading::Unreadable => f(),
        }
    }
}

impl<T> From<Option<T>> for Reading<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Reading::Value(v),
            None => Reading::Unreadable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_else_keeps_value() {
        let reading = Reading::Value(12).or_else(|| Reading::Value(99));
        assert_eq!(reading, Reading::Value(12));
    }

    #[test]
    fn test_or_else_falls_back() {
        let reading: Reading<u32> = Reading::Unreadable.or_else(|| Reading::Value(99));
        assert_eq!(reading.value(), Some(99));
    }
}
