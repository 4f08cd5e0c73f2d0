use std::io;
use std::str::FromStr;

use itertools::Itertools;

use crate::storage::RecordsStore;

/// Capacity of each ranked list
pub const BOARD_SIZE: usize = 3;
/// "no record yet" sentinel for reaction times
pub const TIME_SENTINEL_MS: u64 = 9999;

pub const SCORES_KEY: &str = "top_scores";
pub const TIMES_KEY: &str = "top_times";

const DEFAULT_SCORES: &str = "0,0,0";
const DEFAULT_TIMES: &str = "9999,9999,9999";

/// Two independent bounded rankings: best session scores (descending)
/// and fastest reactions in milliseconds (ascending).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaderboard {
    top_scores: [u32; BOARD_SIZE],
    best_times_ms: [u64; BOARD_SIZE],
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self {
            top_scores: [0; BOARD_SIZE],
            best_times_ms: [TIME_SENTINEL_MS; BOARD_SIZE],
        }
    }
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top_scores(&self) -> [u32; BOARD_SIZE] {
        self.top_scores
    }

    pub fn best_times_ms(&self) -> [u64; BOARD_SIZE] {
        self.best_times_ms
    }

    /// Offer a score and a reaction time to both rankings. Each list is
    /// checked independently; a single event can improve both. Returns
    /// true when either list changed, in which case the caller persists
    /// and refreshes the records display.
    pub fn check_and_update(&mut self, new_score: u32, new_time_ms: u64) -> bool {
        let score_changed = insert_ranked(&mut self.top_scores, new_score, |new, old| new > old);
        let time_changed = insert_ranked(&mut self.best_times_ms, new_time_ms, |new, old| new < old);
        score_changed || time_changed
    }

    /// Read both lists from the store, falling back to defaults for any
    /// list whose stored representation does not parse.
    pub fn load(store: &dyn RecordsStore) -> Self {
        let raw_scores = store.read_string(SCORES_KEY, DEFAULT_SCORES);
        let raw_times = store.read_string(TIMES_KEY, DEFAULT_TIMES);

        let top_scores = match parse_triple(&raw_scores) {
            Some(scores) => scores,
            None => {
                log::warn!("malformed stored scores {raw_scores:?}; resetting to defaults");
                [0; BOARD_SIZE]
            }
        };
        let best_times_ms = match parse_triple(&raw_times) {
            Some(times) => times,
            None => {
                log::warn!("malformed stored times {raw_times:?}; resetting to defaults");
                [TIME_SENTINEL_MS; BOARD_SIZE]
            }
        };

        Self {
            top_scores,
            best_times_ms,
        }
    }

    /// Write both lists back as comma-joined triples, overwriting prior
    /// values.
    pub fn persist(&self, store: &mut dyn RecordsStore) -> io::Result<()> {
        store.write_string(SCORES_KEY, &self.top_scores.iter().join(","))?;
        store.write_string(TIMES_KEY, &self.best_times_ms.iter().join(","))
    }
}

/// Bounded ranked insertion: the candidate lands at the first position it
/// strictly beats, everything from there shifts right and the last entry
/// falls off. Ties never displace an existing entry.
fn insert_ranked<T: Copy>(
    list: &mut [T; BOARD_SIZE],
    value: T,
    beats: impl Fn(T, T) -> bool,
) -> bool {
    match list.iter().position(|&entry| beats(value, entry)) {
        Some(pos) => {
            list.copy_within(pos..BOARD_SIZE - 1, pos + 1);
            list[pos] = value;
            true
        }
        None => false,
    }
}

fn parse_triple<T: FromStr + Copy + Default>(raw: &str) -> Option<[T; BOARD_SIZE]> {
    let mut out = [T::default(); BOARD_SIZE];
    let mut parts = raw.split(',');

    for slot in out.iter_mut() {
        *slot = parts.next()?.trim().parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}
