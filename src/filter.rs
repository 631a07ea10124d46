use super::{
    errors::FilterError,
    record::{FilterField, Record},
    result::FilterResult,
};
use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

pub const DEFAULT_MIN_AMOUNT: f64 = 0.0;
pub const DEFAULT_MAX_AMOUNT: f64 = 1_000_000.0;
pub const LAKH: f64 = 100_000.0;
pub const ALL_TOKEN: &str = "All";

const PARALLEL_FILTER_THRESHOLD: usize = 100_000;

static ANY: Selector = Selector::Any;

// Selector
//
// JSON shape: "North" -> One, ["Male","Female"] -> AnyOf, null -> Any

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selector {
    One(String),
    AnyOf(BTreeSet<String>),
    #[default]
    Any,
}

impl Selector {
    // Unset, empty string and empty set all match every record
    pub fn is_active(&self) -> bool {
        match self {
            Self::Any => false,
            Self::One(value) => !value.is_empty(),
            Self::AnyOf(values) => !values.is_empty(),
        }
    }

    #[inline]
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::One(expected) => expected.is_empty() || expected == value,
            Self::AnyOf(values) => values.is_empty() || values.contains(value),
        }
    }

    fn normalized(self) -> Self {
        if self.is_active() { self } else { Self::Any }
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One(value) if !value.is_empty() => write!(f, "{value}"),
            Self::AnyOf(values) if !values.is_empty() => {
                let joined: Vec<&str> = values.iter().map(String::as_str).collect();
                write!(f, "{}", joined.join(", "))
            }
            _ => write!(f, "{ALL_TOKEN}"),
        }
    }
}

// AmountRange - inclusive purchase amount bounds

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAmountRange")]
pub struct AmountRange {
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct RawAmountRange {
    #[serde(default = "default_min_amount")]
    min: f64,
    #[serde(default = "default_max_amount")]
    max: f64,
}

fn default_min_amount() -> f64 {
    DEFAULT_MIN_AMOUNT
}

fn default_max_amount() -> f64 {
    DEFAULT_MAX_AMOUNT
}

impl TryFrom<RawAmountRange> for AmountRange {
    type Error = FilterError;

    fn try_from(raw: RawAmountRange) -> FilterResult<Self> {
        Self::new(raw.min, raw.max)
    }
}

impl Default for AmountRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_AMOUNT,
            max: DEFAULT_MAX_AMOUNT,
        }
    }
}

impl AmountRange {
    pub fn new(min: f64, max: f64) -> FilterResult<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(FilterError::InvalidAmountRange { min, max });
        }
        Ok(Self { min, max })
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[inline]
    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

// ActivityWindow - purchase date within the last `days` days of `as_of`

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawActivityWindow")]
pub struct ActivityWindow {
    days: u32,
    as_of: NaiveDate,
}

#[derive(Deserialize)]
struct RawActivityWindow {
    days: u32,
    as_of: NaiveDate,
}

impl TryFrom<RawActivityWindow> for ActivityWindow {
    type Error = FilterError;

    fn try_from(raw: RawActivityWindow) -> FilterResult<Self> {
        Self::new(raw.days, raw.as_of)
    }
}

impl ActivityWindow {
    pub fn new(days: u32, as_of: NaiveDate) -> FilterResult<Self> {
        if days == 0 {
            return Err(FilterError::EmptyActivityWindow);
        }
        Ok(Self { days, as_of })
    }

    pub fn last_week(as_of: NaiveDate) -> Self {
        Self { days: 7, as_of }
    }

    pub fn last_month(as_of: NaiveDate) -> Self {
        Self { days: 30, as_of }
    }

    pub fn last_quarter(as_of: NaiveDate) -> Self {
        Self { days: 90, as_of }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn start(&self) -> NaiveDate {
        self.as_of
            .checked_sub_days(Days::new(self.days as u64))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn end(&self) -> NaiveDate {
        self.as_of
    }

    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end()
    }

    pub fn label(&self) -> String {
        match self.days {
            7 => "Last Week".to_string(),
            30 => "Last Month".to_string(),
            90 => "Last 90 Days".to_string(),
            days => format!("Last {days} Days"),
        }
    }
}

// FilterSpec

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    selectors: BTreeMap<FilterField, Selector>,
    amount: AmountRange,
    activity: Option<ActivityWindow>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    // Builders

    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.select(field, value);
        self
    }

    pub fn with_any_of<I, V>(mut self, field: FilterField, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.set_any_of(field, values);
        self
    }

    pub fn with_amount_range(mut self, min: f64, max: f64) -> FilterResult<Self> {
        self.amount = AmountRange::new(min, max)?;
        Ok(self)
    }

    pub fn with_activity(mut self, window: ActivityWindow) -> Self {
        self.activity = Some(window);
        self
    }

    // Mutators

    // An empty value clears the selector
    pub fn select(&mut self, field: FilterField, value: impl Into<String>) -> &mut Self {
        self.set(field, Selector::One(value.into()))
    }

    pub fn set_any_of<I, V>(&mut self, field: FilterField, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values: BTreeSet<String> = values
            .into_iter()
            .map(Into::into)
            .filter(|value: &String| !value.is_empty())
            .collect();
        self.set(field, Selector::AnyOf(values))
    }

    // Checkbox behaviour: adds the value when missing, removes it when present
    pub fn toggle(&mut self, field: FilterField, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        if value.is_empty() {
            return self;
        }
        let mut values = match self.selectors.remove(&field) {
            Some(Selector::AnyOf(values)) => values,
            Some(Selector::One(current)) if !current.is_empty() => BTreeSet::from([current]),
            _ => BTreeSet::new(),
        };
        if !values.remove(&value) {
            values.insert(value);
        }
        self.set(field, Selector::AnyOf(values))
    }

    pub fn clear(&mut self, field: FilterField) -> &mut Self {
        self.selectors.remove(&field);
        self
    }

    pub fn set_amount_range(&mut self, range: AmountRange) -> &mut Self {
        self.amount = range;
        self
    }

    pub fn set_activity(&mut self, window: Option<ActivityWindow>) -> &mut Self {
        self.activity = window;
        self
    }

    fn set(&mut self, field: FilterField, selector: Selector) -> &mut Self {
        match selector.normalized() {
            Selector::Any => {
                self.selectors.remove(&field);
            }
            selector => {
                self.selectors.insert(field, selector);
            }
        }
        self
    }

    // Accessors

    pub fn selector(&self, field: FilterField) -> &Selector {
        self.selectors.get(&field).unwrap_or(&ANY)
    }

    pub fn active_selectors(&self) -> impl Iterator<Item = (FilterField, &Selector)> {
        self.selectors
            .iter()
            .filter(|(_, selector)| selector.is_active())
            .map(|(field, selector)| (*field, selector))
    }

    pub fn amount(&self) -> AmountRange {
        self.amount
    }

    pub fn activity(&self) -> Option<ActivityWindow> {
        self.activity
    }

    // Matching

    // Conjunction of every active predicate. A missing or unparseable amount
    // (or date, when an activity window is set) is a non-match.
    pub fn matches(&self, record: &Record) -> bool {
        let amount_ok = record
            .amount()
            .is_some_and(|amount| self.amount.contains(amount));
        if !amount_ok {
            return false;
        }
        if let Some(window) = &self.activity {
            if !record.purchase_date().is_some_and(|date| window.contains(date)) {
                return false;
            }
        }
        self.selectors
            .iter()
            .all(|(field, selector)| selector.accepts(record.value(*field)))
    }
}

// Pure query: every record matching `spec`, in input order
pub fn filter<R>(records: &[R], spec: &FilterSpec) -> Vec<R>
where
    R: Borrow<Record> + Clone + Send + Sync,
{
    let keep = |record: &R| spec.matches(<R as Borrow<Record>>::borrow(record));
    if records.len() >= PARALLEL_FILTER_THRESHOLD {
        records
            .par_iter()
            .filter(|record| keep(*record))
            .cloned()
            .collect()
    } else {
        records
            .iter()
            .filter(|record| keep(*record))
            .cloned()
            .collect()
    }
}

// QuerySummary - the text shown above the overlap diagram

pub struct QuerySummary<'a> {
    spec: &'a FilterSpec,
    matched: usize,
    total: usize,
}

impl<'a> QuerySummary<'a> {
    pub fn new(spec: &'a FilterSpec, matched: usize, total: usize) -> Self {
        Self { spec, matched, total }
    }
}

impl Display for QuerySummary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Showing data for:")?;
        for field in FilterField::ALL {
            writeln!(f, "{}: {},", field.label(), self.spec.selector(field))?;
        }
        match self.spec.activity() {
            Some(window) => writeln!(f, "Purchase Activity: {},", window.label())?,
            None => writeln!(f, "Purchase Activity: {ALL_TOKEN},")?,
        }
        let amount = self.spec.amount();
        writeln!(
            f,
            "Purchase Amount: Min: {:.2} Lakh / Max: {:.2} Lakh",
            amount.min() / LAKH,
            amount.max() / LAKH
        )?;
        write!(f, "Matched {} of {} records", self.matched, self.total)
    }
}
