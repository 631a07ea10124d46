use super::{
    errors::FilterError,
    result::FilterResult,
};
use chrono::NaiveDate;
use serde::{
    Deserialize,
    Serialize,
    ser::SerializeMap,
};
use std::{
    fmt::Display,
    str::FromStr,
};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

// RecordField - known CSV columns

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordField {
    ContactId,
    AgeGroup,
    Region,
    Gender,
    PreferredLanguage,
    ProductCategory,
    PurchaseAmount,
    PurchaseDate,
    PreferredChannel,
    SegmentId,
    Demography,
    FestivalSeason,
    FestivalBuyingPattern,
}

impl RecordField {
    pub const COUNT: usize = 13;

    pub const ALL: [RecordField; Self::COUNT] = [
        Self::ContactId,
        Self::AgeGroup,
        Self::Region,
        Self::Gender,
        Self::PreferredLanguage,
        Self::ProductCategory,
        Self::PurchaseAmount,
        Self::PurchaseDate,
        Self::PreferredChannel,
        Self::SegmentId,
        Self::Demography,
        Self::FestivalSeason,
        Self::FestivalBuyingPattern,
    ];

    // Canonical CSV header
    pub fn header(self) -> &'static str {
        match self {
            Self::ContactId => "ContactID",
            Self::AgeGroup => "AgeGroup",
            Self::Region => "Region",
            Self::Gender => "Gender",
            Self::PreferredLanguage => "PreferredLanguage",
            Self::ProductCategory => "ProductCategory",
            Self::PurchaseAmount => "PurchaseAmount",
            Self::PurchaseDate => "PurchaseDate",
            Self::PreferredChannel => "PreferredChannel",
            Self::SegmentId => "SegmentID",
            Self::Demography => "Demography",
            Self::FestivalSeason => "FestivalSeason",
            Self::FestivalBuyingPattern => "FestivalBuyingPattern",
        }
    }

    // Resolves a CSV header, canonical name or a known alias. Case-sensitive.
    pub fn from_header(header: &str) -> Option<Self> {
        let field = match header {
            "ContactID" | "CustomerID" | "ID" => Self::ContactId,
            "AgeGroup" | "Age Group" | "Age" => Self::AgeGroup,
            "Region" => Self::Region,
            "Gender" => Self::Gender,
            "PreferredLanguage" | "Language" => Self::PreferredLanguage,
            "ProductCategory" | "Category" | "PurchaseCategory" => Self::ProductCategory,
            "PurchaseAmount" | "Amount" => Self::PurchaseAmount,
            "PurchaseDate" => Self::PurchaseDate,
            "PreferredChannel" | "Channel" => Self::PreferredChannel,
            "SegmentID" | "SegmentId" | "SegmentName" | "Segment" => Self::SegmentId,
            "Demography" => Self::Demography,
            "FestivalSeason" | "Festival" | "PreferredFestival" => Self::FestivalSeason,
            "FestivalBuyingPattern" => Self::FestivalBuyingPattern,
            _ => return None,
        };
        Some(field)
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

impl Display for RecordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.header())
    }
}

// FilterField - categorical columns offered as selectors

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    AgeGroup,
    Region,
    Gender,
    Language,
    Category,
    Channel,
    Segment,
    Demography,
    FestivalSeason,
    FestivalBuyingPattern,
}

impl FilterField {
    pub const COUNT: usize = 10;

    pub const ALL: [FilterField; Self::COUNT] = [
        Self::AgeGroup,
        Self::Region,
        Self::Gender,
        Self::Language,
        Self::Category,
        Self::Channel,
        Self::Segment,
        Self::Demography,
        Self::FestivalSeason,
        Self::FestivalBuyingPattern,
    ];

    pub fn record_field(self) -> RecordField {
        match self {
            Self::AgeGroup => RecordField::AgeGroup,
            Self::Region => RecordField::Region,
            Self::Gender => RecordField::Gender,
            Self::Language => RecordField::PreferredLanguage,
            Self::Category => RecordField::ProductCategory,
            Self::Channel => RecordField::PreferredChannel,
            Self::Segment => RecordField::SegmentId,
            Self::Demography => RecordField::Demography,
            Self::FestivalSeason => RecordField::FestivalSeason,
            Self::FestivalBuyingPattern => RecordField::FestivalBuyingPattern,
        }
    }

    // Human label used in the summary text
    pub fn label(self) -> &'static str {
        match self {
            Self::AgeGroup => "Age Group",
            Self::Region => "Region",
            Self::Gender => "Gender",
            Self::Language => "Language",
            Self::Category => "Product Category",
            Self::Channel => "Channel",
            Self::Segment => "Segment",
            Self::Demography => "Demography",
            Self::FestivalSeason => "Festival Season",
            Self::FestivalBuyingPattern => "Festival Buying Pattern",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::AgeGroup => "age_group",
            Self::Region => "region",
            Self::Gender => "gender",
            Self::Language => "language",
            Self::Category => "category",
            Self::Channel => "channel",
            Self::Segment => "segment",
            Self::Demography => "demography",
            Self::FestivalSeason => "festival_season",
            Self::FestivalBuyingPattern => "festival_buying_pattern",
        }
    }

    // Gender is rendered as checkboxes, everything else as a dropdown
    pub fn is_multi_select(self) -> bool {
        matches!(self, Self::Gender)
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

impl Display for FilterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for FilterField {
    type Err = FilterError;

    // Accepts the snake_case key or any header that maps onto a filterable column
    fn from_str(name: &str) -> FilterResult<Self> {
        if let Some(field) = Self::ALL.iter().find(|field| field.key() == name) {
            return Ok(*field);
        }
        RecordField::from_header(name)
            .and_then(|record_field| {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|field| field.record_field() == record_field)
            })
            .ok_or_else(|| FilterError::UnknownField { name: name.to_string() })
    }
}

// Record

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: [Box<str>; RecordField::COUNT],
    present: u16,
    amount: Option<f64>,
    purchase_date: Option<NaiveDate>,
    extra: Vec<(Box<str>, Box<str>)>,
}

impl Record {
    // Builds a record from (header, value) pairs. Unknown headers land in the extra bag;
    // a second column mapping onto an already filled field is kept there as well.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::default();
        for (header, value) in pairs {
            record.push(header.as_ref(), value.into());
        }
        record.finish();
        record
    }

    pub(crate) fn push(&mut self, header: &str, value: String) {
        match RecordField::from_header(header) {
            Some(field) if !self.has(field) => {
                self.values[field.slot()] = value.into_boxed_str();
                self.present |= 1 << field.slot();
            }
            _ => self.extra.push((Box::from(header), value.into_boxed_str())),
        }
    }

    // Parses typed columns once, after every value is in place
    pub(crate) fn finish(&mut self) {
        self.amount = parse_amount(self.get(RecordField::PurchaseAmount));
        self.purchase_date = parse_date(self.get(RecordField::PurchaseDate));
    }

    // Absent fields read as ""
    #[inline]
    pub fn get(&self, field: RecordField) -> &str {
        &self.values[field.slot()]
    }

    #[inline]
    pub fn value(&self, field: FilterField) -> &str {
        self.get(field.record_field())
    }

    #[inline]
    pub fn has(&self, field: RecordField) -> bool {
        self.present & (1 << field.slot()) != 0
    }

    pub fn amount(&self) -> Option<f64> {
        self.amount
    }

    pub fn purchase_date(&self) -> Option<NaiveDate> {
        self.purchase_date
    }

    pub fn extra(&self) -> impl Iterator<Item = (&str, &str)> {
        self.extra.iter().map(|(name, value)| (&**name, &**value))
    }

    // Dynamic lookup by column name: known fields first, then the extra bag
    pub fn field(&self, name: &str) -> &str {
        if let Some(field) = RecordField::from_header(name) {
            if self.has(field) {
                return self.get(field);
            }
        }
        self.extra
            .iter()
            .find(|(header, _)| &**header == name)
            .map(|(_, value)| &**value)
            .unwrap_or("")
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let known = RecordField::ALL.iter().filter(|field| self.has(**field));
        let mut map = serializer.serialize_map(Some(self.present.count_ones() as usize + self.extra.len()))?;
        for field in known {
            map.serialize_entry(field.header(), self.get(*field))?;
        }
        for (name, value) in self.extra() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

pub(crate) fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}
