pub mod postings;

use super::record::{FilterField, Record};
use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use std::sync::Arc;

pub use postings::{IndexStats, PostingIndex};

pub(crate) const PARALLEL_BUILD_THRESHOLD: usize = 50_000;

pub type CategoryIndex = PostingIndex<Box<str>>;
pub type AmountIndex = PostingIndex<OrderedFloat<f64>>;
pub type DateIndex = PostingIndex<NaiveDate>;

// Indexes kept next to the records of a store. Built once, never patched.
#[derive(Debug, Clone, Default)]
pub struct StoreIndexes {
    categories: Vec<CategoryIndex>,
    amounts: AmountIndex,
    dates: DateIndex,
}

impl StoreIndexes {
    pub fn build(records: &[Arc<Record>]) -> Self {
        let categories = FilterField::ALL
            .iter()
            .map(|field| {
                CategoryIndex::build(records, |record| {
                    let value = record.value(*field);
                    (!value.is_empty()).then(|| Box::from(value))
                })
            })
            .collect();
        let amounts = AmountIndex::build(records, |record| record.amount().map(OrderedFloat));
        let dates = DateIndex::build(records, |record| record.purchase_date());
        Self {
            categories,
            amounts,
            dates,
        }
    }

    #[inline]
    pub fn category(&self, field: FilterField) -> Option<&CategoryIndex> {
        self.categories.get(field.slot())
    }

    #[inline]
    pub fn amounts(&self) -> &AmountIndex {
        &self.amounts
    }

    #[inline]
    pub fn dates(&self) -> &DateIndex {
        &self.dates
    }
}
