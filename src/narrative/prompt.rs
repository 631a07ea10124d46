use crate::{
    record::{Record, RecordField},
    result::NarrativeResult,
};
use serde::Serialize;
use std::{borrow::Borrow, fmt::Write};

pub const DEFAULT_SAMPLE_LIMIT: usize = 50;

// Columns sent to the narrative service; everything else stays local
pub const PROMPT_FIELDS: [RecordField; 9] = [
    RecordField::ContactId,
    RecordField::AgeGroup,
    RecordField::Gender,
    RecordField::Region,
    RecordField::PreferredLanguage,
    RecordField::ProductCategory,
    RecordField::PurchaseAmount,
    RecordField::PurchaseDate,
    RecordField::PreferredChannel,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub sample: usize,
    pub total: usize,
}

#[derive(Serialize)]
struct RecordProjection<'a> {
    #[serde(rename = "ContactID")]
    contact_id: &'a str,
    #[serde(rename = "AgeGroup")]
    age_group: &'a str,
    #[serde(rename = "Gender")]
    gender: &'a str,
    #[serde(rename = "Region")]
    region: &'a str,
    #[serde(rename = "PreferredLanguage")]
    preferred_language: &'a str,
    #[serde(rename = "ProductCategory")]
    product_category: &'a str,
    #[serde(rename = "PurchaseAmount")]
    purchase_amount: &'a str,
    #[serde(rename = "PurchaseDate")]
    purchase_date: &'a str,
    #[serde(rename = "PreferredChannel")]
    preferred_channel: &'a str,
}

impl<'a> From<&'a Record> for RecordProjection<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            contact_id: record.get(RecordField::ContactId),
            age_group: record.get(RecordField::AgeGroup),
            gender: record.get(RecordField::Gender),
            region: record.get(RecordField::Region),
            preferred_language: record.get(RecordField::PreferredLanguage),
            product_category: record.get(RecordField::ProductCategory),
            purchase_amount: record.get(RecordField::PurchaseAmount),
            purchase_date: record.get(RecordField::PurchaseDate),
            preferred_channel: record.get(RecordField::PreferredChannel),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBuilder {
    sample_limit: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }
}

impl PromptBuilder {
    // A zero limit is lifted to one so a non-empty set always sends data
    pub fn new(sample_limit: usize) -> Self {
        Self {
            sample_limit: sample_limit.max(1),
        }
    }

    pub fn sample_limit(&self) -> usize {
        self.sample_limit
    }

    // None for an empty filtered set: nothing is sent in that case
    pub fn build<R>(&self, filtered: &[R], question: &str) -> NarrativeResult<Option<Prompt>>
    where
        R: Borrow<Record>,
    {
        if filtered.is_empty() {
            return Ok(None);
        }
        let sample: Vec<RecordProjection<'_>> = filtered
            .iter()
            .take(self.sample_limit)
            .map(|record| RecordProjection::from(<R as Borrow<Record>>::borrow(record)))
            .collect();
        let data = serde_json::to_string_pretty(&sample)?;

        let mut text = String::with_capacity(data.len() + 512);
        text.push_str(
            "You are a CRM analyst. Answer using only the customer records supplied below. \
             Do not invent customers, values or trends that are not present in the data. \
             If the data can not answer the question, say so.\n\n",
        );
        let _ = writeln!(
            text,
            "The sample holds {} of {} records matching the current filters.",
            sample.len(),
            filtered.len()
        );
        let _ = writeln!(text, "Question: {}", question.trim());
        text.push_str(
            "\nFormat the answer as readable markdown with short headings and bullet points.\n\n",
        );
        let _ = writeln!(text, "Data:\n```json\n{data}\n```");

        Ok(Some(Prompt {
            text,
            sample: sample.len(),
            total: filtered.len(),
        }))
    }
}
