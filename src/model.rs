use chrono::{Duration, NaiveDate};

use crate::error::{LookupError, Result};

// one paper as returned by efetch, reduced to what a journal-club slide shows.

#[derive(Debug, Clone, PartialEq)]
pub struct PaperRecord {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub journal: String,
    pub publication_date: Option<NaiveDate>,
    pub abstract_text: String,
    pub doi: Option<String>,
    pub affiliations: Vec<String>
}

impl PaperRecord {
    pub fn new(
        id: String,
        title: String,
        authors: Vec<String>,
        journal: String,
        publication_date: Option<NaiveDate>,
        abstract_text: String
    ) -> Self {
        PaperRecord {
            id,
            title,
            authors,
            journal,
            publication_date,
            abstract_text,
            doi: None,
            affiliations: Vec::new()
        }
    }
}

pub const DEFAULT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(LookupError::date(format!(
                "start date {} is after end date {}",
                start.format("%Y/%m/%d"),
                end.format("%Y/%m/%d")
            )));
        }
        Ok(DateRange { start, end })
    }

    /// The week leading up to and including `today`.
    pub fn default_ending(today: NaiveDate) -> Self {
        DateRange {
            start: today - Duration::days(DEFAULT_WINDOW_DAYS),
            end: today
        }
    }
}

/// Parses the `YYYY/MM/DD` form used at the prompt and in Entrez queries.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y/%m/%d").map_err(|_| {
        LookupError::date(format!(
            "\"{}\" is not in YYYY/MM/DD format",
            input.trim()
        ))
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub journal: String,
    pub term: String
}
