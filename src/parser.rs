use crate::caption::{Caption, TimePoint};
use crate::error::ConvertError;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::char;
use nom::combinator::{all_consuming, map_res, verify};
use nom::error::VerboseError;
use nom::multi::separated_list1;
use nom::IResult;
use regex::Regex;

/// How long the last caption stays on screen, since nothing follows it.
const TRAILING_DURATION_SECS: u32 = 5;
const SEGMENT_LIMIT: u32 = 60;
const SEGMENT_MAX_DIGITS: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderOpts {
    /// Carry the trailing duration into minutes and hours instead of
    /// only bumping the seconds field.
    pub carry_overflow: bool,
}

/// Finds `[hours:]minutes:seconds` timestamps inside a line of text.
pub struct TimestampParser {
    run: Regex,
}

impl TimestampParser {
    pub fn new() -> Result<Self> {
        let run = Regex::new(r"[0-9:]+").context("Invalid timestamp regex.")?;
        Ok(Self { run })
    }

    /// Only the first run of digits and colons in `line` is considered.
    /// Returns `None` when there is no run, or when it is not a valid
    /// two or three segment timestamp.
    pub fn parse(&self, line: &str) -> Option<TimePoint> {
        let run = self.run.find(line)?.as_str();
        let (_, segments) = segments(run).ok()?;
        match segments[..] {
            [minutes, seconds] => Some(TimePoint::new(0, minutes, seconds)),
            [hours, minutes, seconds] => Some(TimePoint::new(hours, minutes, seconds)),
            _ => None,
        }
    }
}

fn segments(input: &str) -> IResult<&str, Vec<u32>, VerboseError<&str>> {
    all_consuming(separated_list1(char(':'), segment))(input)
}

fn segment(input: &str) -> IResult<&str, u32, VerboseError<&str>> {
    verify(
        map_res(
            take_while_m_n(1, SEGMENT_MAX_DIGITS, |c: char| c.is_ascii_digit()),
            |s: &str| s.parse::<u32>(),
        ),
        |value: &u32| *value < SEGMENT_LIMIT,
    )(input)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    ExpectTime,
    ExpectText,
}

/// A caption whose end is not known until the next timestamp shows up.
struct OpenCaption {
    start: TimePoint,
    text: String,
}

/// Line-driven reader for YouTube transcripts: timestamp lines alternating
/// with caption text lines.
pub struct TranscriptReader {
    timestamps: TimestampParser,
    opts: ReaderOpts,
    state: ReadState,
    line_number: usize,
    captions: Vec<Caption>,
    open: Option<OpenCaption>,
}

impl TranscriptReader {
    pub fn new(opts: ReaderOpts) -> Result<Self> {
        Ok(Self {
            timestamps: TimestampParser::new()?,
            opts,
            state: ReadState::ExpectTime,
            line_number: 0,
            captions: Vec::new(),
            open: None,
        })
    }

    pub fn feed(&mut self, raw: &str) -> Result<(), ConvertError> {
        self.line_number += 1;
        let mut line = without_eols(raw);
        if self.line_number == 1 {
            if let Some(rest) = line.strip_prefix('\u{FEFF}') {
                line = rest.to_string();
            }
        }

        // Blank lines are only skipped until the first timestamp.
        if self.open.is_none() && line.trim().is_empty() {
            return Ok(());
        }

        match self.state {
            ReadState::ExpectTime => {
                let start = self.timestamps.parse(&line).ok_or_else(|| {
                    ConvertError::MalformedSource {
                        line: self.line_number,
                        content: line.clone(),
                    }
                })?;
                let next = OpenCaption {
                    start,
                    text: String::new(),
                };
                if let Some(prev) = self.open.replace(next) {
                    self.captions.push(Caption {
                        start: prev.start,
                        end: start,
                        text: prev.text,
                    });
                }
                self.state = ReadState::ExpectText;
            }
            ReadState::ExpectText => {
                if let Some(open) = self.open.as_mut() {
                    open.text = line;
                }
                self.state = ReadState::ExpectTime;
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Vec<Caption> {
        if let Some(last) = self.open.take() {
            let end = if self.opts.carry_overflow {
                last.start.plus_seconds_carried(TRAILING_DURATION_SECS)
            } else {
                last.start.plus_seconds(TRAILING_DURATION_SECS)
            };
            self.captions.push(Caption {
                start: last.start,
                end,
                text: last.text,
            });
        }
        self.captions
    }
}

fn without_eols(line: &str) -> String {
    line.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

pub struct Parser {
    opts: ReaderOpts,
}

impl Parser {
    pub fn new(opts: ReaderOpts) -> Self {
        Self { opts }
    }

    /// Reads a transcript file. A [`ConvertError::MalformedSource`] aborts
    /// the whole read and can be recovered with `downcast_ref`.
    ///
    /// `\n`, `\r\n` and a lone `\r` all end a line.
    pub fn read_transcript<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Caption>> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open transcript: '{}'", path.display()))?;
        let mut source = BufReader::new(file);
        let mut reader = TranscriptReader::new(self.opts)?;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = source
                .read_until(b'\n', &mut buf)
                .with_context(|| format!("Failed to read transcript: '{}'", path.display()))?;
            if read == 0 {
                break;
            }
            let chunk = std::str::from_utf8(&buf)
                .with_context(|| format!("Transcript is not valid UTF-8: '{}'", path.display()))?;
            for line in split_line_breaks(chunk) {
                reader.feed(line)?;
            }
        }
        Ok(reader.finish())
    }
}

/// Splits a chunk ending in at most one `\n` into lines, treating every
/// other `\r` as a line break of its own.
fn split_line_breaks(chunk: &str) -> impl Iterator<Item = &str> {
    let body = chunk.strip_suffix('\n').unwrap_or(chunk);
    let body = body.strip_suffix('\r').unwrap_or(body);
    body.split('\r')
}
