use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;

/// Destination id meaning "every station on the bus".
pub const BROADCAST_ID: u16 = 1024;

/// Longest payload the simulator will load from a payload file.
pub const MAX_PAYLOAD_LEN: usize = 1500;

/// One frame-send event: who sends, to whom, and what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub source_id: u16,
    pub destination_id: u16,
    pub payload: String,
}

impl Record {
    pub fn is_broadcast(&self) -> bool {
        self.destination_id == BROADCAST_ID
    }
}

/// Serializes as one payload-file line body: `src<TAB>dst<TAB>payload`.
/// The line terminator is written by the caller.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.source_id, self.destination_id, self.payload)
    }
}

#[derive(Debug, Error)]
pub enum RecordParseError {
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid {field} `{value}`: {source}")]
    BadId {
        field: &'static str,
        value: String,
        source: ParseIntError,
    },

    #[error("payload is {0} bytes long, limit is {max}", max = MAX_PAYLOAD_LEN)]
    PayloadTooLong(usize),
}

fn next_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    Some(s.split_once(char::is_whitespace).unwrap_or((s, "")))
}

fn parse_id(field: &'static str, value: &str) -> Result<u16, RecordParseError> {
    value.parse().map_err(|source| RecordParseError::BadId {
        field,
        value: value.to_string(),
        source,
    })
}

/// Reads a line the way the simulator's payload loader does: two
/// whitespace-delimited ids, then the remainder of the line with leading
/// whitespace dropped. The generator never reads records; this is the
/// consumer's view of the format, used to check that what we write is
/// what the simulator will load.
impl FromStr for Record {
    type Err = RecordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);

        let (src, rest) = next_field(line).ok_or(RecordParseError::MissingField("source id"))?;
        let (dst, rest) = next_field(rest).ok_or(RecordParseError::MissingField("destination id"))?;

        let payload = rest.trim_start();
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(RecordParseError::PayloadTooLong(payload.len()));
        }

        Ok(Self {
            source_id: parse_id("source id", src)?,
            destination_id: parse_id("destination id", dst)?,
            payload: payload.to_string(),
        })
    }
}
