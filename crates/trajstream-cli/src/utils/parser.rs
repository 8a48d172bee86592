use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid frame range '{0}'. Expected 'START..END' (e.g., '2..4').")]
    InvalidRangeFormat(String),

    #[error("Invalid frame number '{value}' in range '{range}'.")]
    InvalidFrameNumber { value: String, range: String },

    #[error("Frame range '{0}' is reversed; START must not exceed END.")]
    ReversedRange(String),
}

/// Inclusive range of frame numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub start: u64,
    pub end: u64,
}

pub fn parse_range(input: &str) -> Result<FrameRange, ParseError> {
    let trimmed = input.trim();
    let (start, end) = trimmed
        .split_once("..")
        .ok_or_else(|| ParseError::InvalidRangeFormat(input.to_string()))?;

    let number = |value: &str| -> Result<u64, ParseError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ParseError::InvalidRangeFormat(input.to_string()));
        }
        value.parse().map_err(|_| ParseError::InvalidFrameNumber {
            value: value.to_string(),
            range: input.to_string(),
        })
    };

    let range = FrameRange {
        start: number(start)?,
        end: number(end.strip_prefix('=').unwrap_or(end))?,
    };
    if range.start > range.end {
        return Err(ParseError::ReversedRange(input.to_string()));
    }
    Ok(range)
}

/// Adapter for use as a clap `value_parser`.
pub fn parse_frame_range(input: &str) -> Result<FrameRange, String> {
    parse_range(input).map_err(|e| e.to_string())
}
