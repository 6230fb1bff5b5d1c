use std::collections::HashSet;

use crate::{
    config::Config,
    format::{Formatter, ABSTRACT_WIDTH, AUTHORS_WIDTH, KEYWORDS_WIDTH, TITLE_WIDTH},
    model::{DateRange, PaperRecord}
};

pub const TOOL_NAME: &str = "Journal Lookup Tool";

/// A block of text set in one size. Embedded newlines become line breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub size_pt: u32,
    pub bold: bool
}

impl Paragraph {
    pub fn new(text: impl Into<String>, size_pt: u32) -> Self {
        Paragraph {
            text: text.into(),
            size_pt,
            bold: false
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn blank() -> Self {
        Self::new("", 12)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideKind {
    Title,
    Paper { id: String }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub kind: SlideKind,
    pub heading: Option<String>,
    pub paragraphs: Vec<Paragraph>
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlideDeck {
    pub slides: Vec<Slide>
}

impl SlideDeck {
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn paper_ids(&self) -> Vec<&str> {
        self.slides.iter()
            .filter_map(|slide| match &slide.kind {
                SlideKind::Paper { id } => Some(id.as_str()),
                SlideKind::Title => None
            })
            .collect()
    }
}

/// Keeps the first record seen for each id, in encounter order.
pub fn dedup_records(records: Vec<PaperRecord>) -> Vec<PaperRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    records.into_iter()
        .filter(|record| seen.insert(record.id.clone()))
        .collect()
}

pub struct SlideRenderer<'a> {
    config: &'a Config,
    range: DateRange,
    abstract_chars: usize
}

impl<'a> SlideRenderer<'a> {
    pub fn new(config: &'a Config, range: DateRange, abstract_chars: usize) -> Self {
        SlideRenderer {
            config,
            range,
            abstract_chars
        }
    }

    pub fn render(&self, records: Vec<PaperRecord>) -> SlideDeck {
        let records = dedup_records(records);
        let mut slides = Vec::with_capacity(records.len() + 1);
        slides.push(self.title_slide(&records));
        slides.extend(records.iter().map(|record| self.paper_slide(record)));
        SlideDeck { slides }
    }

    fn title_slide(&self, records: &[PaperRecord]) -> Slide {
        let mut paragraphs = vec![
            Paragraph::new(format!("Username: {}", self.config.email), 16),
            Paragraph::new(format!(
                "Query start date: {}\nQuery end date: {}",
                self.range.start.format("%Y/%m/%d"),
                self.range.end.format("%Y/%m/%d")
            ), 12),
            Paragraph::blank(),
            Paragraph::new("Query journals:", 16).bold(),
            Paragraph::new(self.config.journals.join("\n"), 12),
            Paragraph::blank(),
            Paragraph::new("Query keywords:", 16).bold(),
            Paragraph::new(Formatter::wrapped(&self.config.keywords.join(", "), KEYWORDS_WIDTH), 12),
            Paragraph::blank(),
            Paragraph::new("Journals found:", 16).bold(),
        ];

        let counts = Formatter::journal_counts(records);
        if counts.is_empty() {
            paragraphs.push(Paragraph::new("No papers were found for this query.", 12));
        } else {
            let lines = counts.iter()
                .map(|(journal, n)| format!("{}: {} article{}", journal, n, if *n == 1 { "" } else { "s" }))
                .collect::<Vec<_>>()
                .join("\n");
            paragraphs.push(Paragraph::new(lines, 12));
        }

        Slide {
            kind: SlideKind::Title,
            heading: Some(format!("{} v{}", TOOL_NAME, env!("CARGO_PKG_VERSION"))),
            paragraphs
        }
    }

    fn paper_slide(&self, record: &PaperRecord) -> Slide {
        let abstract_text = Formatter::excerpt(&record.abstract_text, self.abstract_chars);
        let paragraphs = vec![
            Paragraph::new(Formatter::wrapped(&record.title, TITLE_WIDTH), 20).bold(),
            Paragraph::blank(),
            Paragraph::new(Formatter::wrapped(&abstract_text, ABSTRACT_WIDTH), 14),
            Paragraph::blank(),
            Paragraph::new(format!(
                "{}\n{}",
                Formatter::journal_line(&record.journal),
                Formatter::date_line(record.publication_date)
            ), 12),
            Paragraph::new(Formatter::doi_line(record.doi.as_deref()), 10),
            Paragraph::new(Formatter::wrapped(&Formatter::authors_line(&record.authors), AUTHORS_WIDTH), 10),
            Paragraph::blank(),
            Paragraph::new(Formatter::wrapped(&Formatter::institutions_line(&record.affiliations), AUTHORS_WIDTH), 10),
        ];

        Slide {
            kind: SlideKind::Paper { id: record.id.clone() },
            heading: None,
            paragraphs
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn config() -> Config {
        Config::new("a@b.com", vec!["Nature".to_string()], vec!["autophagy".to_string()])
    }

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 7).unwrap()
        ).unwrap()
    }

    fn record(id: &str, title: &str) -> PaperRecord {
        PaperRecord::new(
            id.to_string(),
            title.to_string(),
            vec!["Smith J".to_string()],
            "Nature".to_string(),
            NaiveDate::from_ymd_opt(2023, 1, 3),
            "An abstract.".to_string()
        )
    }

    #[test]
    fn test_duplicate_ids_render_once() {
        let config = config();
        let deck = SlideRenderer::new(&config, range(), 1500)
            .render(vec![record("1", "Paper A"), record("1", "Paper A again")]);
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.paper_ids(), vec!["1"]);
        assert!(deck.slides[1].paragraphs[0].text.contains("Paper A"));
        assert!(!deck.slides[1].paragraphs[0].text.contains("again"));
    }

    #[test]
    fn test_empty_input_gives_title_only() {
        let config = config();
        let deck = SlideRenderer::new(&config, range(), 1500).render(Vec::new());
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.slides[0].kind, SlideKind::Title);
        assert!(deck.slides[0].paragraphs.iter().any(|p| p.text.contains("No papers were found")));
    }

    #[test]
    fn test_order_of_first_encounter() {
        let records = vec![record("3", "C"), record("1", "A"), record("3", "C"), record("2", "B")];
        let ids: Vec<String> = dedup_records(records).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_title_slide_lists_query() {
        let config = config();
        let deck = SlideRenderer::new(&config, range(), 1500).render(vec![record("1", "A"), record("2", "B")]);
        let text: Vec<&str> = deck.slides[0].paragraphs.iter().map(|p| p.text.as_str()).collect();
        assert!(text.contains(&"Username: a@b.com"));
        assert!(text.contains(&"Query start date: 2023/01/01\nQuery end date: 2023/01/07"));
        assert!(text.contains(&"Nature: 2 articles"));
        assert!(deck.slides[0].heading.as_deref().unwrap().starts_with(TOOL_NAME));
    }

    #[test]
    fn test_paper_slide_content() {
        let config = config();
        let mut paper = record("7", "Paper A");
        paper.doi = Some("10.1/xyz".to_string());
        paper.abstract_text = "word ".repeat(100);
        let deck = SlideRenderer::new(&config, range(), 40).render(vec![paper]);
        let slide = &deck.slides[1];
        assert_eq!(slide.paragraphs[0].size_pt, 20);
        assert!(slide.paragraphs[2].text.ends_with("..."));
        assert!(slide.paragraphs[2].text.chars().count() <= 43);
        assert_eq!(slide.paragraphs[4].text, "Published in: Nature\nPublication Date: 2023/01/03");
        assert_eq!(slide.paragraphs[5].text, "DOI: 10.1/xyz");
        assert_eq!(slide.paragraphs[6].text, "Authors: Smith J");
    }
}
