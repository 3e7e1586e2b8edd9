//! Memory-size estimation for cached keys and values.

/// Estimates how many bytes an item occupies while cached.
pub trait MemSizeEstimator<T: ?Sized>: Send + Sync {
    fn estimate_size(&self, item: &T) -> u64;
}

/// Counts the length of the item's byte representation.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByteLenEstimator;

impl<T: AsRef<[u8]> + ?Sized> MemSizeEstimator<T> for ByteLenEstimator {
    fn estimate_size(&self, item: &T) -> u64 {
        item.as_ref().len() as u64
    }
}

/// Charges the same fixed size for every item.
#[derive(Clone, Copy, Debug)]
pub struct ConstEstimator(pub u64);

impl<T: ?Sized> MemSizeEstimator<T> for ConstEstimator {
    fn estimate_size(&self, _item: &T) -> u64 {
        self.0
    }
}
