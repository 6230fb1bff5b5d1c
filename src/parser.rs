use std::{
    cell::Cell,
    sync::OnceLock,
    thread,
    time::Instant
};
use chrono::NaiveDate;
use quick_xml::de::from_str;
use regex::{Captures, Regex};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    config::ClientSettings,
    error::{LookupError, Result},
    model::{PaperRecord, Query}
};

const DATABASE: &str = "pubmed";
// ids per efetch call, keeps GET urls well under server limits.
const FETCH_BATCH: usize = 200;

/// Anything that can turn one query into paper records.
pub trait SearchClient {
    fn search(&self, query: &Query) -> Result<Vec<PaperRecord>>;
}

/// Entrez E-utilities client: esearch for PMIDs, then efetch for records.
#[derive(Debug)]
pub struct PubmedParser {
    settings: ClientSettings,
    email: String,
    client: Client,
    last_request: Cell<Option<Instant>>
}

impl PubmedParser {
    pub fn new(settings: ClientSettings, email: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(format!("{}/{}", settings.tool, env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(PubmedParser {
            settings,
            email: email.to_string(),
            client,
            last_request: Cell::new(None)
        })
    }

    pub fn search_ids(&self, term: &str) -> Result<SearchHits> {
        let retmax = self.settings.max_results.to_string();
        let xml = self.get_raw_xml("esearch.fcgi", &[("term", term), ("retmax", &retmax)])?;
        parse_search_ids(&xml)
    }

    pub fn fetch_records(&self, ids: &[String]) -> Result<Vec<PaperRecord>> {
        let mut records: Vec<PaperRecord> = Vec::with_capacity(ids.len());
        for batch in ids.chunks(FETCH_BATCH) {
            let joined = batch.join(",");
            let xml = self.get_raw_xml("efetch.fcgi", &[("id", &joined), ("retmode", "xml")])?;
            let mut batch_records = parse_articles(&xml)?;
            debug!(requested = batch.len(), parsed = batch_records.len(), "efetch batch");
            if batch_records.is_empty() {
                return Err(LookupError::network(format!(
                    "efetch returned no PubmedArticle for {} requested ids", batch.len()
                )));
            }
            records.append(&mut batch_records);
        }
        Ok(records)
    }

    // Entrez asks for at most 3 requests a second without an api key.
    fn throttle(&self) {
        if let Some(previous) = self.last_request.get() {
            let elapsed = previous.elapsed();
            if elapsed < self.settings.request_delay {
                thread::sleep(self.settings.request_delay - elapsed);
            }
        }
        self.last_request.set(Some(Instant::now()));
    }

    fn get_raw_xml(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String> {
        self.throttle();
        let url = format!("{}/{}", self.settings.base_url, endpoint);
        let mut request = self.client.get(&url)
            .query(&[("db", DATABASE)])
            .query(params)
            .query(&[("tool", self.settings.tool.as_str()), ("email", self.email.as_str())]);
        if let Some(key) = &self.settings.api_key {
            request = request.query(&[("api_key", key.as_str())]);
        }
        debug!(%url, "requesting");

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::network(format!("{} returned HTTP {}", endpoint, status)));
        }
        Ok(response.text()?)
    }
}

impl SearchClient for PubmedParser {
    fn search(&self, query: &Query) -> Result<Vec<PaperRecord>> {
        info!("Searching journal: {}", query.journal);
        debug!(term = %query.term, "esearch");
        let hits = self.search_ids(&query.term)?;
        if hits.ids.is_empty() {
            return Ok(Vec::new());
        }
        if hits.is_truncated() {
            warn!(
                "{} matched {} papers, only the first {} are kept (raise MAX_RESULTS to get more)",
                query.journal, hits.count, hits.ids.len()
            );
        }
        info!("{} PMIDs found in {}", hits.ids.len(), query.journal);
        self.fetch_records(&hits.ids)
    }
}

/// PMIDs returned by one esearch call, and how many the query matched in total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHits {
    pub count: usize,
    pub ids: Vec<String>
}

impl SearchHits {
    /// True when `retmax` cut the result list short.
    pub fn is_truncated(&self) -> bool {
        self.count > self.ids.len()
    }
}

pub fn parse_search_ids(xml: &str) -> Result<SearchHits> {
    let parsed: SearchDocument = from_str(xml)?;
    if let Some(error) = parsed.error {
        return Err(LookupError::network(format!("esearch error: {}", error.trim())));
    }
    // any other well-formed page (html error, proxy notice) has no Count
    let count = parsed.count
        .ok_or_else(|| LookupError::network("unexpected esearch response"))?;
    debug!(count, returned = parsed.id_list.ids.len(), "esearch result");
    Ok(SearchHits {
        count,
        ids: parsed.id_list.ids.into_iter().map(|id| id.trim().to_string()).collect()
    })
}

pub fn parse_articles(xml: &str) -> Result<Vec<PaperRecord>> {
    let flattened = flatten_inline_markup(xml);
    let parsed: ArticleSet = from_str(&flattened)?;
    if let Some(error) = parsed.error {
        return Err(LookupError::network(format!("efetch error: {}", error.trim())));
    }
    Ok(parsed.articles.into_iter()
        .map(|article| PaperRecord::from_article(article.citation))
        .filter(|record| {
            if record.id.is_empty() {
                warn!(title = %record.title, "skipping article without a PMID");
            }
            !record.id.is_empty()
        })
        .collect())
}

/// Drops formatting tags (`<i>`, `<sup>`, MathML, ...) nested inside titles
/// and abstract sections, leaving their text in place.
pub fn flatten_inline_markup(xml: &str) -> String {
    static MIXED: OnceLock<Regex> = OnceLock::new();
    static TAG: OnceLock<Regex> = OnceLock::new();
    let mixed = MIXED.get_or_init(|| Regex::new(concat!(
        r"(?s)<(?P<name>ArticleTitle|AbstractText|VernacularTitle)",
        r"(?P<attrs>\s[^>]*[^/>])?>(?P<body>.*?)</(?:ArticleTitle|AbstractText|VernacularTitle)>"
    )).expect("valid regex"));
    let tag = TAG.get_or_init(|| Regex::new(r"</?[A-Za-z][^>]*>").expect("valid regex"));

    mixed.replace_all(xml, |caps: &Captures| {
        let name = &caps["name"];
        let attrs = caps.name("attrs").map_or("", |m| m.as_str());
        let body = tag.replace_all(&caps["body"], "");
        format!("<{}{}>{}</{}>", name, attrs, body, name)
    }).into_owned()
}

// PubMed Data Model

impl PaperRecord {
    fn from_article(citation: MedlineCitation) -> Self {
        let article = citation.article;

        let title = clean_text(&article.title.value);
        let title = if title.is_empty() { String::from("No title available") } else { title };

        let abstract_text = article.abstract_field
            .map(|a| a.sections.into_iter()
                .filter(|s| !s.text.trim().is_empty())
                .map(|s| match s.label {
                    Some(label) if !label.trim().is_empty() => {
                        format!("{}: {}", label.trim(), clean_text(&s.text))
                    },
                    _ => clean_text(&s.text)
                })
                .collect::<Vec<_>>()
                .join(" "))
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| String::from("No abstract available"));

        let authors: Vec<String> = article.author_list.as_ref()
            .map(|list| list.authors.iter().filter_map(Author::display_name).collect())
            .unwrap_or_default();

        let affiliations: Vec<String> = article.author_list
            .map(|list| list.authors.into_iter()
                .flat_map(|author| author.affiliations)
                .map(|info| clean_text(&info.affiliation))
                .filter(|a| !a.is_empty())
                .collect())
            .unwrap_or_default();

        let publication_date = article.article_dates.iter()
            .find_map(DateField::to_date)
            .or_else(|| article.journal.issue.pub_date.to_date());

        let doi = article.locations.into_iter()
            .find(|loc| loc.id_type.eq_ignore_ascii_case("doi"))
            .map(|loc| loc.value.trim().to_string())
            .filter(|doi| !doi.is_empty());

        let mut record = Self::new(
            citation.pmid.value.trim().to_string(),
            title,
            authors,
            clean_text(&article.journal.title),
            publication_date,
            abstract_text
        );
        record.doi = doi;
        record.affiliations = affiliations;
        record
    }
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// end PubMed Data Model

// Entrez Raw XML Model

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct SearchDocument {
    #[serde(rename = "Count")]
    count: Option<usize>,
    #[serde(rename = "IdList")]
    id_list: IdList,
    #[serde(rename = "ERROR")]
    error: Option<String>
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct IdList {
    #[serde(rename = "Id")]
    ids: Vec<String>
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct ArticleSet {
    #[serde(rename = "PubmedArticle")]
    articles: Vec<PubmedArticle>,
    #[serde(rename = "ERROR")]
    error: Option<String>
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct PubmedArticle {
    #[serde(rename = "MedlineCitation")]
    citation: MedlineCitation
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct MedlineCitation {
    #[serde(rename = "PMID")]
    pmid: TextField,
    #[serde(rename = "Article")]
    article: Article
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct Article {
    #[serde(rename = "Journal")]
    journal: Journal,
    #[serde(rename = "ArticleTitle")]
    title: TextField,
    #[serde(rename = "ELocationID")]
    locations: Vec<LocationField>,
    #[serde(rename = "Abstract")]
    abstract_field: Option<AbstractField>,
    #[serde(rename = "AuthorList")]
    author_list: Option<AuthorList>,
    #[serde(rename = "ArticleDate")]
    article_dates: Vec<DateField>
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct TextField {
    #[serde(rename = "$text")]
    value: String
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct Journal {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "JournalIssue")]
    issue: JournalIssue
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct JournalIssue {
    #[serde(rename = "PubDate")]
    pub_date: DateField
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct DateField {
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Month")]
    month: Option<String>,
    #[serde(rename = "Day")]
    day: Option<String>,
    #[serde(rename = "MedlineDate")]
    medline_date: Option<String>
}

impl DateField {
    fn to_date(&self) -> Option<NaiveDate> {
        if let Some(year) = self.year.as_deref() {
            let year: i32 = year.trim().parse().ok()?;
            let month = self.month.as_deref().and_then(parse_month).unwrap_or(1);
            let day = self.day.as_deref()
                .and_then(|d| d.trim().parse().ok())
                .unwrap_or(1);
            return NaiveDate::from_ymd_opt(year, month, day);
        }
        // free-form, e.g. "2023 Jan-Feb" or "2022-2023"
        let medline = self.medline_date.as_deref()?;
        let year: i32 = medline.get(0..4)?.parse().ok()?;
        let month = medline.get(4..)
            .and_then(|rest| rest.split(|c: char| !c.is_alphanumeric())
                .find(|token| !token.is_empty()))
            .and_then(parse_month)
            .unwrap_or(1);
        NaiveDate::from_ymd_opt(year, month, 1)
    }
}

fn parse_month(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun",
        "jul", "aug", "sep", "oct", "nov", "dec"
    ];
    let prefix = raw.get(0..3)?.to_ascii_lowercase();
    MONTHS.iter().position(|m| *m == prefix).map(|i| i as u32 + 1)
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct LocationField {
    #[serde(rename = "@EIdType")]
    id_type: String,
    #[serde(rename = "$text")]
    value: String
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct AbstractField {
    #[serde(rename = "AbstractText")]
    sections: Vec<AbstractSection>
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct AbstractSection {
    #[serde(rename = "@Label")]
    label: Option<String>,
    #[serde(rename = "$text")]
    text: String
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct AuthorList {
    #[serde(rename = "Author")]
    authors: Vec<Author>
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct Author {
    #[serde(rename = "LastName")]
    last_name: Option<String>,
    #[serde(rename = "Initials")]
    initials: Option<String>,
    #[serde(rename = "CollectiveName")]
    collective_name: Option<String>,
    #[serde(rename = "AffiliationInfo")]
    affiliations: Vec<AffiliationInfo>
}

impl Author {
    fn display_name(&self) -> Option<String> {
        match (&self.last_name, &self.collective_name) {
            (Some(last), _) => Some(match &self.initials {
                Some(initials) => format!("{} {}", last.trim(), initials.trim()),
                None => last.trim().to_string()
            }),
            (None, Some(collective)) => Some(clean_text(collective)),
            (None, None) => None
        }
    }
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct AffiliationInfo {
    #[serde(rename = "Affiliation")]
    affiliation: String
}

// end Entrez Raw XML Model
