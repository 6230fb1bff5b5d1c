use tracing::debug;

use crate::{
    config::Config,
    model::{DateRange, Query}
};

// Entrez search expression: keywords, entry-date window, journal.
macro_rules! pubmed_term {
    () => { concat!(
        "({}) AND ",
        "(\"{}\"[Date - Entry] : \"{}\"[Date - Entry]) AND ",
        "\"{}\"[Journal]"
    ) }
}

pub struct QueryBuilder<'a> {
    config: &'a Config,
    range: DateRange
}

impl<'a> QueryBuilder<'a> {
    pub fn new(config: &'a Config, range: DateRange) -> Self {
        QueryBuilder {
            config,
            range
        }
    }

    /// One query per journal with all keywords OR'ed, so the number of
    /// searches grows with the journal list only.
    pub fn build(&self) -> Vec<Query> {
        let keywords = self.keyword_clause();
        let start = self.range.start.format("%Y/%m/%d").to_string();
        let end = self.range.end.format("%Y/%m/%d").to_string();

        self.config.journals.iter()
            .map(|journal| {
                let term = format!(pubmed_term!(), keywords, start, end, journal);
                debug!(%journal, %term, "built query");
                Query {
                    journal: journal.clone(),
                    term
                }
            })
            .collect()
    }

    fn keyword_clause(&self) -> String {
        self.config.keywords.iter()
            .map(|kw| {
                if kw.contains(char::is_whitespace) {
                    format!("({})", kw)
                } else {
                    kw.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}
