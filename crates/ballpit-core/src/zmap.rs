//! Z-bucket index: items partitioned by integer render depth.
//!
//! Buckets are insertion-ordered. Distinct z-values are kept in a separate
//! list sorted descending, so [`ZMap::layers`] walks the highest z first.
//! The engine renders in that order: larger z is further behind and is
//! painted over by lower layers.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ZMap<T> {
    buckets: HashMap<i32, Vec<T>>,
    ordered: Vec<i32>,
}

impl<T> Default for ZMap<T> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
            ordered: Vec::new(),
        }
    }
}

impl<T: Copy + PartialEq + std::fmt::Debug> ZMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item` to the bucket for `z`, creating the bucket if needed.
    pub fn add(&mut self, z: i32, item: T) {
        match self.buckets.get_mut(&z) {
            Some(bucket) => bucket.push(item),
            None => {
                self.buckets.insert(z, vec![item]);
                let at = self.ordered.partition_point(|&existing| existing > z);
                self.ordered.insert(at, z);
            }
        }
    }

    /// Remove `item` from the bucket for `z`. An emptied bucket is dropped
    /// together with its z-value. Returns `false` (and logs) when the item
    /// was never added under that z.
    pub fn remove(&mut self, z: i32, item: T) -> bool {
        let Some(bucket) = self.buckets.get_mut(&z) else {
            log::warn!("z value {z} not found while removing {item:?}");
            return false;
        };
        let Some(at) = bucket.iter().position(|&e| e == item) else {
            log::warn!("{item:?} not found in z bucket {z}");
            return false;
        };
        bucket.remove(at);
        if bucket.is_empty() {
            self.buckets.remove(&z);
            self.ordered.retain(|&existing| existing != z);
        }
        true
    }

    /// Layers in descending z order. Recomputed on every call.
    pub fn layers(&self) -> impl Iterator<Item = (i32, &[T])> + '_ {
        self.ordered
            .iter()
            .filter_map(|z| self.buckets.get(z).map(|bucket| (*z, bucket.as_slice())))
    }

    /// Distinct z-values, descending.
    pub fn depths(&self) -> &[i32] {
        &self.ordered
    }

    /// Items at depth `z`, in insertion order.
    pub fn bucket(&self, z: i32) -> &[T] {
        self.buckets.get(&z).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of items across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.ordered.clear();
    }
}
