use super::{
    errors::IngestError,
    filter::{FilterSpec, Selector},
    index::{IndexStats, StoreIndexes},
    model::QueryResult,
    options::FilterOptions,
    record::{FilterField, Record},
    result::IngestResult,
};
use ordered_float::OrderedFloat;
use roaring::RoaringBitmap;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

pub const MAX_RECORDS: usize = u32::MAX as usize;

// RecordStore - immutable dataset with its indexes and option domain.
// A new upload builds a new store; nothing here is patched in place.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Arc<Vec<Arc<Record>>>,
    indexes: StoreIndexes,
    options: Arc<FilterOptions>,
}

impl RecordStore {
    // Constructors

    pub fn from_records(records: Vec<Record>) -> IngestResult<Self> {
        if records.len() > MAX_RECORDS {
            return Err(IngestError::TooManyRecords {
                rows: records.len(),
                max: MAX_RECORDS,
            });
        }
        let records: Vec<Arc<Record>> = records.into_iter().map(Arc::new).collect();
        let indexes = StoreIndexes::build(&records);
        let options = Arc::new(FilterOptions::from_indexes(&indexes));
        debug!(
            records = records.len(),
            amounts = %indexes.amounts().stats(),
            "record store built"
        );
        Ok(Self {
            records: Arc::new(records),
            indexes,
            options,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    // Access

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn records(&self) -> &[Arc<Record>] {
        &self.records
    }

    pub fn get(&self, row: usize) -> Option<&Arc<Record>> {
        self.records.get(row)
    }

    pub fn options(&self) -> &Arc<FilterOptions> {
        &self.options
    }

    pub fn category_stats(&self, field: FilterField) -> Option<IndexStats> {
        self.indexes.category(field).map(|index| index.stats())
    }

    pub fn amount_stats(&self) -> IndexStats {
        self.indexes.amounts().stats()
    }

    // Query

    // Indexed execution of the filter; yields the same rows as `filter::filter`
    pub fn query(&self, spec: &FilterSpec) -> QueryResult {
        let rows = self.matching_rows(spec);
        let records = rows
            .iter()
            .filter_map(|row| self.records.get(row as usize).cloned())
            .collect::<Vec<_>>();
        debug!(matched = records.len(), total = self.len(), "query executed");
        QueryResult::new(records, self.len())
    }

    pub fn count(&self, spec: &FilterSpec) -> u64 {
        self.matching_rows(spec).len()
    }

    fn matching_rows(&self, spec: &FilterSpec) -> RoaringBitmap {
        let mut bitmaps: SmallVec<[RoaringBitmap; 8]> = SmallVec::new();

        let amount = spec.amount();
        bitmaps.push(
            self.indexes
                .amounts()
                .range(OrderedFloat(amount.min())..=OrderedFloat(amount.max())),
        );

        if let Some(window) = spec.activity() {
            bitmaps.push(self.indexes.dates().range(window.start()..=window.end()));
        }

        for (field, selector) in spec.active_selectors() {
            let Some(index) = self.indexes.category(field) else {
                continue;
            };
            let bitmap = match selector {
                Selector::One(value) => index.get(value.as_str()).cloned().unwrap_or_default(),
                Selector::AnyOf(values) => index.union_of(values.iter().map(String::as_str)),
                Selector::Any => continue,
            };
            bitmaps.push(bitmap);
        }

        // Smallest first, so the running intersection shrinks fast
        bitmaps.sort_unstable_by_key(|bitmap| bitmap.len());
        let mut bitmaps = bitmaps.into_iter();
        let Some(mut acc) = bitmaps.next() else {
            return RoaringBitmap::new();
        };
        for bitmap in bitmaps {
            if acc.is_empty() {
                break;
            }
            acc &= bitmap;
        }
        acc
    }
}
