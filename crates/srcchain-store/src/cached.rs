/// A cache slot: either a value read from (or written to) the wrapped store,
/// or a record that the wrapped store has no entry for the key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cached<V> {
    /// The key maps to this value.
    Present(V),
    /// The wrapped store confirmed the key does not exist.
    Absent,
}

impl<V> Cached<V> {
    /// Returns `true` for [`Cached::Present`].
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Returns `true` for [`Cached::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Borrow the cached value, if any.
    pub fn as_option(&self) -> Option<&V> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// Convert into the lookup result the slot stands for.
    pub fn into_option(self) -> Option<V> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }
}

impl<V> From<Option<V>> for Cached<V> {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(value) => Self::Present(value),
            None => Self::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_conversion_preserves_state() {
        assert_eq!(Cached::from(Some(3)), Cached::Present(3));
        assert_eq!(Cached::<u8>::from(None), Cached::Absent);
        assert_eq!(Cached::Present("v").into_option(), Some("v"));
        assert_eq!(Cached::<&str>::Absent.into_option(), None);
    }

    #[test]
    fn predicates() {
        let present = Cached::Present(1u8);
        assert!(present.is_present());
        assert!(!present.is_absent());
        assert_eq!(present.as_option(), Some(&1));
        assert!(Cached::<u8>::Absent.is_absent());
    }
}
