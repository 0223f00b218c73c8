use std::collections::{hash_map::Entry, HashMap};

use tracing::debug;

use super::types::{Mode, Segment, Segmentation};
use crate::common::error::{QRError, QRResult};

// Character classes
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum CharClass {
    Digit,
    // Alphanumeric alphabet minus the digits
    Alpha,
    // Anything else, encoded as UTF-8 bytes
    Other,
}

impl CharClass {
    fn of(ch: char) -> Self {
        if Mode::Numeric.contains(ch) {
            Self::Digit
        } else if Mode::Alphanumeric.contains(ch) {
            Self::Alpha
        } else {
            Self::Other
        }
    }

    fn flag(self) -> u8 {
        match self {
            Self::Digit => 0b100,
            Self::Alpha => 0b010,
            Self::Other => 0b001,
        }
    }

    fn native_mode(self) -> Mode {
        match self {
            Self::Digit => Mode::Numeric,
            Self::Alpha => Mode::Alphanumeric,
            Self::Other => Mode::Byte,
        }
    }

    // Digits fold into alphanumeric runs
    fn merged_mode(self) -> Mode {
        match self {
            Self::Digit | Self::Alpha => Mode::Alphanumeric,
            Self::Other => Mode::Byte,
        }
    }
}

// Planner
//------------------------------------------------------------------------------

/// Candidate segmentations for `msg`, best guess first and whole-message byte
/// mode last whenever more than one class is present.
pub fn plan(msg: &str) -> QRResult<Vec<Segmentation>> {
    if msg.is_empty() {
        return Err(QRError::InvalidMessage);
    }

    let flags = msg.chars().fold(0, |f, ch| f | CharClass::of(ch).flag());
    let plans = match flags.count_ones() {
        1 => vec![maximal_runs(msg, CharClass::native_mode)],
        2 => vec![maximal_runs(msg, CharClass::native_mode), whole(msg, Mode::Byte)],
        _ => vec![
            maximal_runs(msg, CharClass::native_mode),
            maximal_runs(msg, CharClass::merged_mode),
            whole(msg, Mode::Byte),
        ],
    };

    debug!("Planned {} segmentation(s) for class flags {flags:03b}", plans.len());
    Ok(plans)
}

fn whole(msg: &str, mode: Mode) -> Segmentation {
    vec![Segment::new(mode, 0, msg.len())]
}

// Greedy leftmost-longest runs of chars sharing a mode
fn maximal_runs(msg: &str, mode_of: fn(CharClass) -> Mode) -> Segmentation {
    let mut segs: Segmentation = Vec::new();
    for (i, ch) in msg.char_indices() {
        let mode = mode_of(CharClass::of(ch));
        match segs.last_mut() {
            Some(last) if last.mode == mode => last.len += ch.len_utf8(),
            _ => segs.push(Segment::new(mode, i, ch.len_utf8())),
        }
    }
    segs
}


// Segment cache
//------------------------------------------------------------------------------

/// Memoizes [`plan`] per exact message text. Owned by the caller, so sharing it
/// across threads needs external synchronization.
#[derive(Debug, Default, Clone)]
pub struct SegmentCache {
    entries: HashMap<String, Vec<Segmentation>>,
}

impl SegmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&mut self, msg: &str) -> QRResult<&[Segmentation]> {
        match self.entries.entry(msg.to_owned()) {
            Entry::Occupied(e) => Ok(e.into_mut().as_slice()),
            Entry::Vacant(e) => Ok(e.insert(plan(msg)?).as_slice()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
