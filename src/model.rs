use super::record::Record;
use serde::Serialize;
use std::sync::Arc;

pub const ALL_SET: &str = "All";
pub const FILTERED_SET: &str = "Filtered";

// QueryResult - filtered rows in store order, plus the store size

#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    records: Vec<Arc<Record>>,
    total: usize,
}

impl QueryResult {
    pub fn new(records: Vec<Arc<Record>>, total: usize) -> Self {
        Self { records, total }
    }

    #[inline]
    pub fn records(&self) -> &[Arc<Record>] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn overlap(&self) -> OverlapStats {
        OverlapStats::new(self.total, self.records.len())
    }

    pub fn into_records(self) -> Vec<Arc<Record>> {
        self.records
    }
}

// OverlapStats
//
// The filtered set is a subset of the whole set, so the intersection is
// always the filtered size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverlapStats {
    pub total: usize,
    pub filtered: usize,
    pub intersection: usize,
}

impl OverlapStats {
    pub fn new(total: usize, filtered: usize) -> Self {
        let filtered = filtered.min(total);
        Self {
            total,
            filtered,
            intersection: filtered,
        }
    }

    // Records outside the filter
    pub fn excluded(&self) -> usize {
        self.total - self.filtered
    }

    pub fn filtered_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.filtered as f64 / self.total as f64
    }

    // Two-circle diagram input
    pub fn venn_areas(&self) -> Vec<VennArea> {
        vec![
            VennArea { sets: vec![ALL_SET], size: self.total },
            VennArea { sets: vec![FILTERED_SET], size: self.filtered },
            VennArea { sets: vec![ALL_SET, FILTERED_SET], size: self.intersection },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VennArea {
    pub sets: Vec<&'static str>,
    pub size: usize,
}
