use std::{fs::File, io::Read};

use chrono::NaiveDate;
use journal_lookup::{
    config::Config,
    model::{DateRange, PaperRecord, Query},
    parser::SearchClient,
    pipeline::JournalClub,
    Result
};
use tempfile::TempDir;

struct StubClient;

impl SearchClient for StubClient {
    fn search(&self, query: &Query) -> Result<Vec<PaperRecord>> {
        assert_eq!(query.journal, "TestJournal");
        assert!(query.term.contains("test"));
        Ok(vec![PaperRecord::new(
            "1".to_string(),
            "Paper A".to_string(),
            vec!["Author X".to_string()],
            "TestJournal".to_string(),
            NaiveDate::from_ymd_opt(2023, 1, 3),
            "Something was studied.".to_string()
        )])
    }
}

fn slide_parts(path: &std::path::Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names()
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .map(String::from)
        .collect();
    names.sort();
    names
}

#[test]
fn test_single_record_gives_two_slides() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("publications.pptx");

    let config = Config::new("a@b.com", vec!["TestJournal".to_string()], vec!["test".to_string()]);
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2023, 1, 7).unwrap()
    ).unwrap();

    let club = JournalClub::new(&StubClient, &config, 1500);
    let (deck, _) = club.build_deck(range).unwrap();
    assert_eq!(deck.len(), 2);

    let report = club.run(range, &output, false).unwrap();
    assert_eq!(report.records.len(), 1);
    assert!(report.warnings.is_empty());

    let slides = slide_parts(&output);
    assert_eq!(slides, vec!["ppt/slides/slide1.xml", "ppt/slides/slide2.xml"]);

    let mut archive = zip::ZipArchive::new(File::open(&output).unwrap()).unwrap();
    let mut title = String::new();
    archive.by_name("ppt/slides/slide1.xml").unwrap().read_to_string(&mut title).unwrap();
    assert!(title.contains("Username: a@b.com"));
    assert!(title.contains("TestJournal: 1 article"));

    let mut paper = String::new();
    archive.by_name("ppt/slides/slide2.xml").unwrap().read_to_string(&mut paper).unwrap();
    assert!(paper.contains("Paper A"));
    assert!(paper.contains("Published in: TestJournal"));
}

#[test]
fn test_config_file_to_deck() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.txt");
    std::fs::write(&config_path, "a@b.com\n\nTestJournal\n\ntest\n").unwrap();
    let output = temp_dir.path().join("deck.pptx");

    let config = Config::from_file(&config_path).unwrap();
    let range = DateRange::default_ending(NaiveDate::from_ymd_opt(2023, 1, 8).unwrap());
    JournalClub::new(&StubClient, &config, 1500).run(range, &output, false).unwrap();

    assert_eq!(slide_parts(&output).len(), 2);
}
