use rayon::prelude::*;
use roaring::RoaringBitmap;
use std::{
    borrow::Borrow,
    collections::BTreeMap,
    ops::RangeBounds,
};

// PostingIndex - key -> bitmap of row ids
//
// Rows are addressed by their position in the record store, so iterating a
// bitmap yields rows in store order.
#[derive(Debug, Clone)]
pub struct PostingIndex<K>
where
    K: Ord + Clone + Send + Sync,
{
    postings: BTreeMap<K, RoaringBitmap>,
    rows: u32,
}

impl<K> Default for PostingIndex<K>
where
    K: Ord + Clone + Send + Sync,
{
    fn default() -> Self {
        Self {
            postings: BTreeMap::new(),
            rows: 0,
        }
    }
}

impl<K> PostingIndex<K>
where
    K: Ord + Clone + Send + Sync,
{
    // Builds postings for every row whose extractor yields a key.
    // Rows that yield None are left out of every posting list.
    pub fn build<T, F>(items: &[T], extractor: F) -> Self
    where
        T: Sync,
        F: Fn(&T) -> Option<K> + Sync + Send,
    {
        let rows = items.len() as u32;
        let postings = if items.len() < super::PARALLEL_BUILD_THRESHOLD {
            let mut postings: BTreeMap<K, RoaringBitmap> = BTreeMap::new();
            for (row, item) in items.iter().enumerate() {
                if let Some(key) = extractor(item) {
                    postings.entry(key).or_default().insert(row as u32);
                }
            }
            postings
        } else {
            items
                .par_iter()
                .enumerate()
                .fold(
                    BTreeMap::new,
                    |mut acc: BTreeMap<K, RoaringBitmap>, (row, item)| {
                        if let Some(key) = extractor(item) {
                            acc.entry(key).or_default().insert(row as u32);
                        }
                        acc
                    },
                )
                .reduce(BTreeMap::new, |mut acc, map| {
                    for (key, bitmap) in map {
                        *acc.entry(key).or_default() |= bitmap;
                    }
                    acc
                })
        };
        Self { postings, rows }
    }

    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&RoaringBitmap>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.postings.get(key)
    }

    // Union of the postings of every listed key; unknown keys contribute nothing
    pub fn union_of<'a, Q, I>(&self, keys: I) -> RoaringBitmap
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized + 'a,
        I: IntoIterator<Item = &'a Q>,
    {
        let mut result = RoaringBitmap::new();
        for key in keys {
            if let Some(bitmap) = self.postings.get(key) {
                result |= bitmap;
            }
        }
        result
    }

    // Union of the postings of every key inside the range
    pub fn range<R>(&self, range: R) -> RoaringBitmap
    where
        R: RangeBounds<K>,
    {
        let mut result = RoaringBitmap::new();
        for (_, bitmap) in self.postings.range(range) {
            result |= bitmap;
        }
        result
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.postings.keys()
    }

    pub fn first_key(&self) -> Option<&K> {
        self.postings.keys().next()
    }

    pub fn last_key(&self) -> Option<&K> {
        self.postings.keys().next_back()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        let unique_keys = self.postings.len();
        let indexed_rows: u64 = self.postings.values().map(|bitmap| bitmap.len()).sum();
        let max_rows_per_key = self.postings.values().map(|bitmap| bitmap.len()).max().unwrap_or(0);
        IndexStats {
            unique_keys,
            total_rows: self.rows as u64,
            indexed_rows,
            max_rows_per_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub unique_keys: usize,
    pub total_rows: u64,
    pub indexed_rows: u64,
    pub max_rows_per_key: u64,
}

impl IndexStats {
    // Rows with no key (empty category, unparseable amount or date)
    pub fn unindexed_rows(&self) -> u64 {
        self.total_rows.saturating_sub(self.indexed_rows)
    }
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IndexStats {{ keys: {}, rows: {}/{}, max per key: {} }}",
            self.unique_keys,
            self.indexed_rows,
            self.total_rows,
            self.max_rows_per_key
        )
    }
}
