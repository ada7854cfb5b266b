//! Firmware/hardware revision gates.
//!
//! Revisions are decimal-like values: version 2, revision 8 is `2.008`. Values are
//! compared after quantising to thousandths, which absorbs float noise while
//! keeping the ordering total and transitive.

use crate::prelude::*;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Firmware SP5.
pub const SP5: f32 = 2.000;
/// Firmware SP5.1, first release carrying HAN metering multiplier/divisor.
pub const SP5_1: f32 = 2.008;
/// Firmware 3.12 (Lithium).
pub const LITHIUM: f32 = 3.012;
/// Hardware 3.6 radio board.
pub const HW_3_6: f32 = 3.060;

fn quantise(value: f32) -> i64 {
    (f64::from(value) * 1000.0).round() as i64
}

pub fn compare(a: f32, b: f32) -> Ordering {
    quantise(a).cmp(&quantise(b))
}

/// True when `installed` is at or above `threshold`.
pub fn meets(installed: f32, threshold: f32) -> bool {
    compare(installed, threshold) != Ordering::Less
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize)]
pub struct Revision {
    pub version: u8,
    pub revision: u8,
}

impl Revision {
    pub const fn new(version: u8, revision: u8) -> Self {
        Self { version, revision }
    }

    pub fn value(&self) -> f32 {
        f32::from(self.version) + f32::from(self.revision) / 1000.0
    }

    pub fn from_value(value: f32) -> Self {
        let q = quantise(value).clamp(0, 255_999);
        Self {
            version: (q / 1000) as u8,
            revision: (q % 1000).min(255) as u8,
        }
    }

    pub fn meets(&self, threshold: f32) -> bool {
        meets(self.value(), threshold)
    }
}

impl PartialOrd for Revision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Revision {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self.value(), other.value())
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.version, self.revision)
    }
}

impl FromStr for Revision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidValue {
            field: "revision",
            value: s.to_string(),
        };
        let (version, revision) = s.trim().split_once('.').unwrap_or((s.trim(), "0"));
        let version = version.parse::<u8>().map_err(|_| invalid())?;
        let revision = revision.parse::<u8>().map_err(|_| invalid())?;
        Ok(Self { version, revision })
    }
}

/// Installed firmware and hardware revisions of a meter.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize)]
pub struct VersionTag {
    pub firmware: Revision,
    pub hardware: Revision,
}

impl VersionTag {
    pub const fn new(firmware: Revision, hardware: Revision) -> Self {
        Self { firmware, hardware }
    }

    pub fn meets(&self, threshold: Threshold) -> bool {
        self.firmware.meets(threshold.firmware) && self.hardware.meets(threshold.hardware)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fw {} hw {}", self.firmware, self.hardware)
    }
}

/// A firmware/hardware pair that an installed `VersionTag` must meet or exceed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Threshold {
    pub firmware: f32,
    pub hardware: f32,
}

impl Threshold {
    pub const NONE: Threshold = Threshold::firmware(0.0);

    pub const fn firmware(firmware: f32) -> Self {
        Self { firmware, hardware: 0.0 }
    }

    pub const fn both(firmware: f32, hardware: f32) -> Self {
        Self { firmware, hardware }
    }
}

/// Picks the value of the highest threshold `tag` meets.
///
/// `formulas` is ordered lowest threshold first; the first entry is the
/// fallback and is returned when nothing higher is met.
pub fn select_by_version<T: Copy>(tag: &VersionTag, formulas: &[(Threshold, T)]) -> Option<T> {
    formulas
        .iter()
        .rev()
        .find(|(threshold, _)| tag.meets(*threshold))
        .or_else(|| formulas.first())
        .map(|(_, value)| *value)
}
