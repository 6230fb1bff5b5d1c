use std::{
    io,
    path::PathBuf,
    process::ExitCode
};
use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::Parser;
use journal_lookup::{
    config::{ClientSettings, Config, DEFAULT_CONFIG_FILE},
    logger,
    model::{parse_date, DateRange},
    parser::PubmedParser,
    pipeline::{JournalClub, LookupReport},
    prompt::{range_from_flags, DateRangePrompt},
    storage::DEFAULT_OUTPUT_FILE,
    LookupError
};

/// Look up recent PubMed papers for a journal club and write them to a slide deck.
#[derive(Parser, Debug)]
#[command(name = "journal-lookup", version)]
struct Cli {
    /// Email, journals and keywords, as three blank-line separated paragraphs
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// First day of the search window (YYYY/MM/DD); skips the prompt
    #[arg(long, value_parser = date_arg)]
    start: Option<NaiveDate>,

    /// Last day of the search window (YYYY/MM/DD), defaults to today
    #[arg(long, value_parser = date_arg)]
    end: Option<NaiveDate>,

    /// Search the last week without asking
    #[arg(short = 'y', long)]
    yes: bool,

    /// Replace the output file if it already exists
    #[arg(long)]
    force: bool,

    #[arg(short, long)]
    verbose: bool
}

fn date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);
    println!("Journal Lookup Tool v{}\n", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(report) => {
            if report.records.is_empty() {
                println!(
                    "No papers were found using the query information, {} holds only the title slide.",
                    cli.output.display()
                );
            } else {
                println!(
                    "Journal Lookup Tool has finished, {} paper(s) written to {}. Have a nice day!",
                    report.records.len(),
                    cli.output.display()
                );
            }
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<LookupReport> {
    let config = Config::from_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let settings = ClientSettings::from_env()?;

    if cli.output.exists() && !cli.force {
        bail!("{} already exists, rename or delete it (or pass --force)", cli.output.display());
    }

    let range = resolve_range(cli)?;
    println!(
        "Searching {} journal(s) from {} to {}...",
        config.journals.len(),
        range.start.format("%Y/%m/%d"),
        range.end.format("%Y/%m/%d")
    );

    let parser = PubmedParser::new(settings.clone(), &config.email)?;
    JournalClub::new(&parser, &config, settings.abstract_chars)
        .run(range, &cli.output, cli.force)
        .map_err(|e| match e {
            LookupError::Network { .. } => anyhow::Error::new(e)
                .context("a failed query stops the run, no slides were written"),
            other => other.into()
        })
}

fn resolve_range(cli: &Cli) -> anyhow::Result<DateRange> {
    let today = Local::now().date_naive();
    let range = match range_from_flags(cli.start, cli.end, cli.yes, today)? {
        Some(range) => range,
        None => DateRangePrompt::new(io::stdin().lock(), io::stdout(), today).ask()?
    };
    Ok(range)
}
