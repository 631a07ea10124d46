use super::{
    index::StoreIndexes,
    record::{FilterField, Record},
};
use serde::Serialize;
use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet},
};

// Selectable values per categorical field. Every field is present,
// possibly with an empty domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    domains: BTreeMap<FilterField, BTreeSet<String>>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            domains: FilterField::ALL
                .iter()
                .map(|field| (*field, BTreeSet::new()))
                .collect(),
        }
    }
}

impl FilterOptions {
    pub(crate) fn from_indexes(indexes: &StoreIndexes) -> Self {
        let mut options = Self::default();
        for field in FilterField::ALL {
            if let Some(index) = indexes.category(field) {
                options.insert_all(field, index.keys().map(|key| key.to_string()));
            }
        }
        options
    }

    fn insert_all<I>(&mut self, field: FilterField, values: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.domains
            .entry(field)
            .or_default()
            .extend(values.into_iter().filter(|value| !value.is_empty()));
    }

    pub fn values(&self, field: FilterField) -> impl Iterator<Item = &str> {
        self.domains
            .get(&field)
            .into_iter()
            .flat_map(|values| values.iter().map(String::as_str))
    }

    pub fn domain(&self, field: FilterField) -> Option<&BTreeSet<String>> {
        self.domains.get(&field)
    }

    pub fn contains(&self, field: FilterField, value: &str) -> bool {
        self.domains
            .get(&field)
            .is_some_and(|values| values.contains(value))
    }

    pub fn len(&self, field: FilterField) -> usize {
        self.domains.get(&field).map_or(0, BTreeSet::len)
    }

    // True when no field has a single selectable value
    pub fn is_empty(&self) -> bool {
        self.domains.values().all(BTreeSet::is_empty)
    }
}

// Distinct non-empty values per categorical field, straight from the records
pub fn derive_options<R>(records: &[R]) -> FilterOptions
where
    R: Borrow<Record>,
{
    let mut options = FilterOptions::default();
    for field in FilterField::ALL {
        let values = records
            .iter()
            .map(|record| <R as Borrow<Record>>::borrow(record).value(field))
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        options.insert_all(field, values);
    }
    options
}
