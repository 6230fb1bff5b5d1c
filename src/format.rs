use std::collections::HashMap;

use chrono::NaiveDate;

use crate::model::PaperRecord;

pub const TITLE_WIDTH: usize = 75;
pub const ABSTRACT_WIDTH: usize = 115;
pub const AUTHORS_WIDTH: usize = 170;
pub const KEYWORDS_WIDTH: usize = 100;

// Formatter for the text that goes on slides.
pub struct Formatter;

impl Formatter {
    /// Breaks `text` into lines of at most `width` characters, preferring the
    /// last space before the limit and splitting mid-word only when there is none.
    pub fn wrap(text: &str, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest: Vec<char> = text.trim().chars().collect();
        while width > 0 && rest.len() > width {
            let split = rest[..width].iter()
                .rposition(|c| *c == ' ')
                .filter(|i| *i > 0)
                .unwrap_or(width);
            lines.push(rest[..split].iter().collect::<String>().trim_end().to_string());
            let skip = rest[split..].iter().take_while(|c| c.is_whitespace()).count();
            rest.drain(..split + skip);
        }
        if !rest.is_empty() || lines.is_empty() {
            lines.push(rest.into_iter().collect());
        }
        lines
    }

    pub fn wrapped(text: &str, width: usize) -> String {
        Self::wrap(text, width).join("\n")
    }

    /// Shortens to at most `max_chars` characters on a word boundary.
    pub fn excerpt(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        let cut: String = text.chars().take(max_chars).collect();
        let cut = match cut.rfind(' ') {
            Some(i) if i > 0 => &cut[..i],
            _ => cut.as_str()
        };
        format!("{}...", cut.trim_end_matches(|c: char| c.is_whitespace() || c == ',' || c == ';'))
    }

    pub fn authors_line(authors: &[String]) -> String {
        if authors.is_empty() {
            return String::from("Authors: Not available");
        }
        format!("Authors: {}", authors.join(", "))
    }

    pub fn journal_line(journal: &str) -> String {
        if journal.is_empty() {
            return String::from("Journal: Not available");
        }
        format!("Published in: {}", journal)
    }

    pub fn date_line(date: Option<NaiveDate>) -> String {
        match date {
            Some(date) => format!("Publication Date: {}", date.format("%Y/%m/%d")),
            None => String::from("Publication Date: not available")
        }
    }

    pub fn doi_line(doi: Option<&str>) -> String {
        match doi {
            Some(doi) => format!("DOI: {}", doi),
            None => String::from("DOI: not available")
        }
    }

    /// Most frequent affiliations, ties in order of first appearance.
    pub fn top_institutions(affiliations: &[String], n: usize) -> Vec<(String, usize)> {
        let mut ranked = count_in_order(affiliations.iter().map(String::as_str));
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    pub fn institutions_line(affiliations: &[String]) -> String {
        let top = Self::top_institutions(affiliations, 2);
        if top.is_empty() {
            return String::from("Institutions: not available");
        }
        let listed = top.iter()
            .map(|(name, count)| format!("{} ({})", name, count))
            .collect::<Vec<_>>()
            .join("; ");
        format!("Institutions: {}", listed)
    }

    /// Papers per journal, journals in order of first appearance.
    pub fn journal_counts(records: &[PaperRecord]) -> Vec<(String, usize)> {
        count_in_order(records.iter().map(|r| r.journal.as_str()))
    }
}

fn count_in_order<'a>(items: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for item in items {
        match index.get(item) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(item, order.len());
                order.push((item.to_string(), 1));
            }
        }
    }
    order
}
