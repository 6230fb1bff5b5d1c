use std::io::{BufRead, Write};

use chrono::{Duration, NaiveDate};

use crate::{
    error::{LookupError, Result},
    model::{parse_date, DateRange, DEFAULT_WINDOW_DAYS}
};

pub const DEFAULT_MODE_QUESTION: &str =
    "Would you like to run in default mode? \
    Default mode is query from 1 week ago until today. (y)es/(n)o: ";
pub const START_QUESTION: &str =
    "Please enter the start date (YYYY/MM/DD), for example 2020/01/01: ";
pub const END_QUESTION: &str =
    "Please enter the end date (YYYY/MM/DD), leave empty for today: ";

/// Window from `--start`/`--end`/`--yes`, or `None` when the user should be asked.
/// `--end` alone means the default window ending then; `--start` alone runs until today.
pub fn range_from_flags(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    assume_default: bool,
    today: NaiveDate
) -> Result<Option<DateRange>> {
    let range = match (start, end) {
        (Some(start), end) => DateRange::new(start, end.unwrap_or(today))?,
        (None, Some(end)) => DateRange::new(end - Duration::days(DEFAULT_WINDOW_DAYS), end)?,
        (None, None) if assume_default => DateRange::default_ending(today),
        (None, None) => return Ok(None)
    };
    Ok(Some(range))
}

/// Asks for the search window on `output`, reading answers from `input`.
/// Any blank answer, or end of input, falls back to the default window.
pub struct DateRangePrompt<R, W> {
    input: R,
    output: W,
    today: NaiveDate
}

impl<R: BufRead, W: Write> DateRangePrompt<R, W> {
    pub fn new(input: R, output: W, today: NaiveDate) -> Self {
        DateRangePrompt {
            input,
            output,
            today
        }
    }

    pub fn ask(mut self) -> Result<DateRange> {
        let default = DateRange::default_ending(self.today);

        let answer = self.ask_line(DEFAULT_MODE_QUESTION)?;
        if matches!(answer.to_lowercase().as_str(), "" | "y" | "yes") {
            return Ok(default);
        }

        let start = self.ask_line(START_QUESTION)?;
        if start.is_empty() {
            return Ok(default);
        }
        let start = parse_date(&start)?;

        let end = self.ask_line(END_QUESTION)?;
        let end = if end.is_empty() { self.today } else { parse_date(&end)? };

        DateRange::new(start, end)
    }

    fn ask_line(&mut self, question: &str) -> Result<String> {
        let io_err = |e: std::io::Error| LookupError::date(format!("cannot read answer: {}", e));
        self.output.write_all(question.as_bytes()).map_err(io_err)?;
        self.output.flush().map_err(io_err)?;
        let mut line = String::new();
        self.input.read_line(&mut line).map_err(io_err)?;
        Ok(line.trim().to_string())
    }
}
