use std::{env, fs, path::Path, time::Duration};

use tracing::{debug, info};

use crate::error::{LookupError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "config.txt";
pub const ENV_FILE: &str = "journal-lookup.env";

pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const DEFAULT_TOOL: &str = "journal-lookup";
const DEFAULT_MAX_RESULTS: u32 = 200;
const DEFAULT_REQUEST_DELAY_MS: u64 = 350;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ABSTRACT_CHARS: usize = 1500;

/// The journal-club configuration: who is asking, which journals, which topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub email: String,
    pub journals: Vec<String>,
    pub keywords: Vec<String>,
}

impl Config {
    pub fn new(email: &str, journals: Vec<String>, keywords: Vec<String>) -> Self {
        Config {
            email: email.to_string(),
            journals,
            keywords
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            LookupError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&text)?;
        info!(
            email = %config.email,
            journals = config.journals.len(),
            keywords = config.keywords.len(),
            "loaded {}", path.display()
        );
        Ok(config)
    }

    /// Parses the three-paragraph layout: one email line, a blank line,
    /// journal names one per line, a blank line, keywords one per line.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        if lines.iter().all(|line| line.is_empty()) {
            return Err(LookupError::config("config file is empty"));
        }
        if lines[0].trim().is_empty() {
            return Err(LookupError::config(
                "email section: the first line must hold your email address"
            ));
        }

        let sections = split_sections(&lines);
        let email_section = &sections[0];
        if email_section.len() > 1 {
            return Err(LookupError::config(
                "email section: expected a single line followed by a blank line"
            ));
        }
        let email = email_section[0].trim();
        if email.matches('@').count() != 1 {
            return Err(LookupError::config(format!(
                "email section: \"{}\" is not a single email address", email
            )));
        }

        match sections.len() {
            1 => Err(LookupError::config(
                "journals section: missing blank line after the email line"
            )),
            2 => Err(LookupError::config(
                "journals/keywords sections: only one found after the email line, \
                either the journals section is empty or the blank line between journals and keywords is missing"
            )),
            3 => {
                let config = Config::new(
                    email,
                    to_owned_lines(&sections[1]),
                    to_owned_lines(&sections[2])
                );
                debug!(?config, "parsed config");
                Ok(config)
            },
            n => Err(LookupError::config(format!(
                "expected 3 sections (email, journals, keywords) but found {}", n
            )))
        }
    }
}

// groups non-blank lines; any run of blank lines is one separator.
fn split_sections<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut sections: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                sections.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        sections.push(current);
    }
    sections
}

fn to_owned_lines(section: &[&str]) -> Vec<String> {
    section.iter().map(|line| line.trim().to_string()).collect()
}

/// Knobs for talking to Entrez, overridable from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub tool: String,
    pub max_results: u32,
    pub request_delay: Duration,
    pub timeout: Duration,
    pub abstract_chars: usize
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            tool: DEFAULT_TOOL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            abstract_chars: DEFAULT_ABSTRACT_CHARS
        }
    }
}

impl ClientSettings {
    /// Reads `journal-lookup.env` if present, then the process environment.
    pub fn from_env() -> Result<Self> {
        if dotenvy::from_filename(ENV_FILE).is_ok() {
            debug!("loaded {}", ENV_FILE);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(ClientSettings {
            base_url: non_empty("PUBMED_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            api_key: non_empty("PUBMED_API_KEY"),
            tool: non_empty("PUBMED_TOOL").unwrap_or(defaults.tool),
            max_results: get_positive(&non_empty, "MAX_RESULTS")?
                .unwrap_or(defaults.max_results),
            request_delay: get_positive::<u64, _>(&non_empty, "REQUEST_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_delay),
            timeout: get_positive::<u64, _>(&non_empty, "REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            abstract_chars: get_positive(&non_empty, "ABSTRACT_CHARS")?
                .unwrap_or(defaults.abstract_chars)
        })
    }
}

fn get_positive<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr + PartialOrd + Default,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value: T = raw.trim().parse().map_err(|_| {
        LookupError::config(format!("{} must be a positive integer, got \"{}\"", key, raw))
    })?;
    if value <= T::default() {
        return Err(LookupError::config(format!("{} must be positive", key)));
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn message(err: LookupError) -> String {
        match err {
            LookupError::Config { message } => message,
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_three_sections() {
        let config = Config::parse("a@b.com\n\nNature\nCell\n\nautophagy\nmitophagy\n").unwrap();
        assert_eq!(config.email, "a@b.com");
        assert_eq!(config.journals, vec!["Nature", "Cell"]);
        assert_eq!(config.keywords, vec!["autophagy", "mitophagy"]);
    }

    #[test]
    fn test_parse_crlf_and_trailing_space() {
        let config = Config::parse("a@b.com  \r\n\r\nNature \r\n\r\nautophagy\r\n").unwrap();
        assert_eq!(config.journals, vec!["Nature"]);
        assert_eq!(config.keywords, vec!["autophagy"]);
    }

    #[test]
    fn test_missing_second_separator() {
        let err = Config::parse("a@b.com\n\nNature\nCell\nautophagy\n").unwrap_err();
        assert!(message(err).contains("blank line between journals and keywords is missing"));
    }

    #[test]
    fn test_empty_journals_section() {
        let err = Config::parse("a@b.com\n\n\nautophagy").unwrap_err();
        assert!(message(err).contains("journals section is empty"));
    }

    #[test]
    fn test_missing_first_separator() {
        let err = Config::parse("a@b.com\n").unwrap_err();
        assert!(message(err).starts_with("journals section"));

        let err = Config::parse("a@b.com\nNature\n\nautophagy").unwrap_err();
        assert!(message(err).starts_with("email section"));
    }

    #[test]
    fn test_empty_email() {
        let err = Config::parse("\nNature\n\nautophagy\n").unwrap_err();
        assert!(message(err).starts_with("email section"));

        let err = Config::parse("").unwrap_err();
        assert_eq!(message(err), "config file is empty");
    }

    #[test]
    fn test_email_needs_one_at_sign() {
        assert!(Config::parse("nobody\n\nNature\n\nautophagy").is_err());
        assert!(Config::parse("a@b.com c@d.com\n\nNature\n\nautophagy").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "a@b.com\n\nNature\n\nautophagy\n").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config, Config::new("a@b.com", vec!["Nature".into()], vec!["autophagy".into()]));

        let missing = Config::from_file("/definitely/not/here/config.txt");
        assert!(matches!(missing, Err(LookupError::Config { .. })));
    }

    #[test]
    fn test_settings_defaults_and_overrides() {
        let settings = ClientSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, ClientSettings::default());

        let env: HashMap<&str, &str> = HashMap::from([
            ("PUBMED_BASE_URL", "http://localhost:9999/"),
            ("PUBMED_API_KEY", "secret"),
            ("MAX_RESULTS", "25"),
            ("REQUEST_DELAY_MS", "1"),
        ]);
        let settings = ClientSettings::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(settings.base_url, "http://localhost:9999");
        assert_eq!(settings.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.max_results, 25);
        assert_eq!(settings.request_delay, Duration::from_millis(1));
        assert_eq!(settings.abstract_chars, DEFAULT_ABSTRACT_CHARS);
    }

    #[test]
    fn test_settings_reject_bad_numbers() {
        let bad = ClientSettings::from_lookup(|k| (k == "MAX_RESULTS").then(|| "lots".to_string()));
        assert!(matches!(bad, Err(LookupError::Config { .. })));
        let zero = ClientSettings::from_lookup(|k| (k == "ABSTRACT_CHARS").then(|| "0".to_string()));
        assert!(matches!(zero, Err(LookupError::Config { .. })));
    }
}
