use std::io::{self, Write};

use rand::Rng;
use tracing::{debug, info};

use crate::params::GeneratorParams;
use crate::record::{BROADCAST_ID, Record};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Chance that a frame is addressed to every station.
pub const BROADCAST_PROBABILITY: f64 = 0.1;

/// Lazily samples `sample_count` independent records. Every draw comes
/// from the generator handed to [`PayloadSampler::new`].
pub struct PayloadSampler<R> {
    params: GeneratorParams,
    rng: R,
    remaining: u64,
}

impl<R: Rng> PayloadSampler<R> {
    pub fn new(params: GeneratorParams, rng: R) -> Self {
        Self {
            params,
            rng,
            remaining: params.sample_count,
        }
    }

    fn random_station(&mut self) -> u16 {
        self.rng.gen_range(0..self.params.station_count)
    }

    fn random_payload(&mut self) -> String {
        (0..self.params.payload_size)
            .map(|_| ALPHABET[self.rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    /// Draws one record. Source and destination are independent, so a
    /// station may address itself.
    pub fn sample_record(&mut self) -> Record {
        let source_id = self.random_station();
        let destination_id = if self.rng.gen_bool(BROADCAST_PROBABILITY) {
            BROADCAST_ID
        } else {
            self.random_station()
        };

        Record {
            source_id,
            destination_id,
            payload: self.random_payload(),
        }
    }
}

impl<R: Rng> Iterator for PayloadSampler<R> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.sample_record())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

/// Writes each record as soon as it is drawn, one line per record, and
/// returns how many lines were written.
pub fn write_records<R: Rng, W: Write>(sampler: PayloadSampler<R>, writer: &mut W) -> io::Result<u64> {
    let mut written = 0u64;
    let mut broadcasts = 0u64;

    for record in sampler {
        writeln!(writer, "{}", record)?;
        written += 1;
        if record.is_broadcast() {
            broadcasts += 1;
        }

        if written % 100_000 == 0 {
            info!("Generated {} records", written);
        }
    }

    writer.flush()?;
    debug!("{} of {} records are broadcasts", broadcasts, written);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn params(station_count: u16, sample_count: u64, payload_size: usize) -> GeneratorParams {
        GeneratorParams {
            station_count,
            sample_count,
            payload_size,
        }
    }

    fn sampler(p: GeneratorParams, seed: u64) -> PayloadSampler<StdRng> {
        PayloadSampler::new(p, StdRng::seed_from_u64(seed))
    }

    #[test]
    fn yields_exactly_sample_count_records() {
        for n in [0, 1, 17, 1000] {
            let s = sampler(params(8, n, 4), n);
            assert_eq!(s.size_hint(), (n as usize, Some(n as usize)));
            assert_eq!(s.count() as u64, n);
        }
    }

    #[test]
    fn ids_stay_in_range() {
        for record in sampler(params(5, 10_000, 0), 1) {
            assert!(record.source_id < 5);
            assert!(record.destination_id < 5 || record.destination_id == BROADCAST_ID);
        }
    }

    #[test]
    fn payload_has_requested_length_and_only_letters() {
        for record in sampler(params(3, 500, 64), 2) {
            assert_eq!(record.payload.len(), 64);
            assert!(record.payload.bytes().all(|b| b.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn zero_payload_size_gives_empty_payload() {
        for record in sampler(params(3, 50, 0), 3) {
            assert!(record.payload.is_empty());
        }
    }

    #[test]
    fn draws_cover_whole_alphabet_and_station_range() {
        let mut letters = HashSet::new();
        let mut sources = HashSet::new();
        let mut destinations = HashSet::new();
        for record in sampler(params(6, 2_000, 32), 4) {
            letters.extend(record.payload.bytes());
            sources.insert(record.source_id);
            destinations.insert(record.destination_id);
        }
        assert_eq!(letters.len(), ALPHABET.len());
        assert_eq!(sources, (0..6).collect::<HashSet<u16>>());
        assert_eq!(destinations, (0..6).chain([BROADCAST_ID]).collect::<HashSet<u16>>());
    }

    #[test]
    fn single_station_only_addresses_itself_or_broadcast() {
        for record in sampler(params(1, 1_000, 1), 5) {
            assert_eq!(record.source_id, 0);
            assert!(record.destination_id == 0 || record.is_broadcast());
        }
    }

    #[test]
    fn broadcast_share_is_about_ten_percent() {
        let n = 100_000;
        let broadcasts = sampler(params(16, n, 0), 6)
            .filter(Record::is_broadcast)
            .count();
        let share = broadcasts as f64 / n as f64;
        assert!(
            (share - BROADCAST_PROBABILITY).abs() < 0.01,
            "broadcast share {share}"
        );
    }

    #[test]
    fn same_seed_same_records() {
        let a: Vec<_> = sampler(params(10, 100, 12), 42).collect();
        let b: Vec<_> = sampler(params(10, 100, 12), 42).collect();
        let c: Vec<_> = sampler(params(10, 100, 12), 43).collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn write_records_emits_one_line_per_record() {
        let mut out = Vec::new();
        let written = write_records(sampler(params(4, 3, 5), 7), &mut out).unwrap();
        assert_eq!(written, 3);

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);

        for line in lines {
            let fields: Vec<&str> = line.split('\t').collect();
            assert_eq!(fields.len(), 3, "line {line:?}");

            let src: u16 = fields[0].parse().unwrap();
            let dst: u16 = fields[1].parse().unwrap();
            assert!(src < 4);
            assert!(dst < 4 || dst == BROADCAST_ID);
            assert_eq!(fields[2].len(), 5);
            assert!(fields[2].bytes().all(|b| b.is_ascii_alphabetic()));

            let record: Record = line.parse().unwrap();
            assert_eq!(record.to_string(), line);
        }
    }

    #[test]
    fn write_records_with_zero_samples_writes_nothing() {
        let mut out = Vec::new();
        let written = write_records(sampler(params(4, 0, 5), 8), &mut out).unwrap();
        assert_eq!(written, 0);
        assert!(out.is_empty());
    }
}
