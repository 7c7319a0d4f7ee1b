use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum ConvertError {
    /// A line that should have been a timestamp was not one.
    MalformedSource { line: usize, content: String },
}

impl Error for ConvertError {}

impl fmt::Display for ConvertError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConvertError::MalformedSource { line, content } => write!(
                fmt,
                "Source subtitles file is of wrong format: expected a timestamp on line {}, found '{}'",
                line, content
            ),
        }
    }
}
