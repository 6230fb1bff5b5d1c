use std::path::Path;

use tracing::{info, warn};

use crate::{
    config::Config,
    error::{LookupWarning, Result},
    model::{DateRange, PaperRecord},
    parser::SearchClient,
    query::QueryBuilder,
    slides::{dedup_records, SlideDeck, SlideRenderer},
    storage::LocalSaver
};

/// What a run collected before rendering.
#[derive(Debug, Default)]
pub struct LookupReport {
    pub records: Vec<PaperRecord>,
    pub warnings: Vec<LookupWarning>
}

/// Runs every journal query in order. The first failing query aborts the
/// run; a query with no hits only adds a warning.
pub fn lookup<C: SearchClient>(client: &C, config: &Config, range: DateRange) -> Result<LookupReport> {
    let mut report = LookupReport::default();
    for query in QueryBuilder::new(config, range).build() {
        let mut found = client.search(&query)?;
        if found.is_empty() {
            let warning = LookupWarning::EmptyResult { journal: query.journal.clone() };
            warn!("{}", warning);
            report.warnings.push(warning);
            continue;
        }
        info!("{} papers retrieved from {}", found.len(), query.journal);
        report.records.append(&mut found);
    }
    let total = report.records.len();
    report.records = dedup_records(std::mem::take(&mut report.records));
    info!(total, unique = report.records.len(), "lookup finished");
    Ok(report)
}

/// Everything after the date range is known: search, render, write.
pub struct JournalClub<'a, C> {
    client: &'a C,
    config: &'a Config,
    abstract_chars: usize
}

impl<'a, C: SearchClient> JournalClub<'a, C> {
    pub fn new(client: &'a C, config: &'a Config, abstract_chars: usize) -> Self {
        JournalClub {
            client,
            config,
            abstract_chars
        }
    }

    pub fn build_deck(&self, range: DateRange) -> Result<(SlideDeck, LookupReport)> {
        let report = lookup(self.client, self.config, range)?;
        let deck = SlideRenderer::new(self.config, range, self.abstract_chars)
            .render(report.records.clone());
        Ok((deck, report))
    }

    /// The deck is only written once every query has come back.
    pub fn run(&self, range: DateRange, output: &Path, overwrite: bool) -> Result<LookupReport> {
        let (deck, report) = self.build_deck(range)?;
        LocalSaver::save_deck_as_pptx(output, &deck, overwrite)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::NaiveDate;

    use super::*;
    use crate::{error::LookupError, model::Query};

    struct StubClient {
        responses: Vec<(&'static str, Vec<PaperRecord>)>,
        seen: RefCell<Vec<Query>>
    }

    impl SearchClient for StubClient {
        fn search(&self, query: &Query) -> Result<Vec<PaperRecord>> {
            self.seen.borrow_mut().push(query.clone());
            if query.journal == "Broken" {
                return Err(LookupError::network("connection refused"));
            }
            Ok(self.responses.iter()
                .find(|(journal, _)| *journal == query.journal)
                .map(|(_, records)| records.clone())
                .unwrap_or_default())
        }
    }

    fn record(id: &str, journal: &str) -> PaperRecord {
        PaperRecord::new(
            id.to_string(),
            format!("Paper {}", id),
            Vec::new(),
            journal.to_string(),
            None,
            String::new()
        )
    }

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 7).unwrap()
        ).unwrap()
    }

    fn config(journals: &[&str]) -> Config {
        Config::new(
            "a@b.com",
            journals.iter().map(|j| j.to_string()).collect(),
            vec!["test".to_string()]
        )
    }

    #[test]
    fn test_dedups_across_journals_and_warns_on_empty() {
        let client = StubClient {
            responses: vec![
                ("Nature", vec![record("1", "Nature"), record("2", "Nature")]),
                ("Cell", vec![record("2", "Nature"), record("3", "Cell")]),
            ],
            seen: RefCell::new(Vec::new())
        };
        let report = lookup(&client, &config(&["Nature", "Empty", "Cell"]), range()).unwrap();
        let ids: Vec<&str> = report.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(report.warnings, vec![LookupWarning::EmptyResult { journal: "Empty".to_string() }]);
        assert_eq!(client.seen.borrow().len(), 3);
    }

    #[test]
    fn test_network_error_aborts() {
        let client = StubClient {
            responses: vec![("Nature", vec![record("1", "Nature")])],
            seen: RefCell::new(Vec::new())
        };
        let err = lookup(&client, &config(&["Broken", "Nature"]), range()).unwrap_err();
        assert!(matches!(err, LookupError::Network { .. }));
        assert_eq!(client.seen.borrow().len(), 1);
    }

    #[test]
    fn test_failed_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("publications.pptx");
        let client = StubClient { responses: Vec::new(), seen: RefCell::new(Vec::new()) };
        let config = config(&["Nature", "Broken"]);
        let result = JournalClub::new(&client, &config, 1500).run(range(), &output, false);
        assert!(result.is_err());
        assert!(!output.exists());
    }
}
