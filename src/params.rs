use std::num::ParseIntError;

use thiserror::Error;

use crate::record::{BROADCAST_ID, MAX_PAYLOAD_LEN};

/// Stations share the id space with the broadcast sentinel, so the
/// sentinel itself is the first id we can never hand out.
pub const MAX_STATIONS_COUNT: i64 = BROADCAST_ID as i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorParams {
    pub station_count: u16,
    pub sample_count: u64,
    pub payload_size: usize,
}

/// What the positional arguments ask for.
#[derive(Debug, PartialEq, Eq)]
pub enum Invocation {
    /// Fewer than three positionals: print the usage line, generate nothing.
    Usage,
    Generate(GeneratorParams),
}

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("{name} `{value}` is not a decimal integer: {source}")]
    Malformed {
        name: &'static str,
        value: String,
        source: ParseIntError,
    },

    #[error("{name} must be in {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

pub fn usage(program: &str) -> String {
    format!("Usage: {} <stations count> <samples count> <data size>", program)
}

fn parse_bounded(name: &'static str, arg: &str, min: i64, max: i64) -> Result<i64, ParamError> {
    let value: i64 = arg.trim().parse().map_err(|source| ParamError::Malformed {
        name,
        value: arg.to_string(),
        source,
    })?;

    if !(min..=max).contains(&value) {
        return Err(ParamError::OutOfRange { name, value, min, max });
    }
    Ok(value)
}

/// Validates `<stations count> <samples count> <data size>`. Anything past
/// the third positional is ignored.
pub fn parse_invocation(positionals: &[String]) -> Result<Invocation, ParamError> {
    let [stations, samples, data_size, ..] = positionals else {
        return Ok(Invocation::Usage);
    };

    let station_count = parse_bounded("stations count", stations, 1, MAX_STATIONS_COUNT)?;
    let sample_count = parse_bounded("samples count", samples, 0, i64::MAX)?;
    let payload_size = parse_bounded("data size", data_size, 0, MAX_PAYLOAD_LEN as i64)?;

    // All three were range-checked above, so the narrowing casts are lossless.
    Ok(Invocation::Generate(GeneratorParams {
        station_count: station_count as u16,
        sample_count: sample_count as u64,
        payload_size: payload_size as usize,
    }))
}
