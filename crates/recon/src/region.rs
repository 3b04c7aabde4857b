use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Belgian administrative regions, identified by postal-code ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Brussels,
    Flanders,
    Wallonia,
}

impl Region {
    /// Classification precedence: the first region whose ranges contain the
    /// zip code wins. The ranges are disjoint, so order only matters if they
    /// are ever edited.
    pub const ALL: [Region; 3] = [Region::Brussels, Region::Flanders, Region::Wallonia];

    /// Inclusive postal-code ranges assigned to the region.
    pub fn zip_ranges(self) -> &'static [RangeInclusive<u32>] {
        match self {
            Self::Brussels => &[1000..=1299],
            Self::Flanders => &[1500..=3999, 8000..=9999],
            Self::Wallonia => &[1300..=1499, 4000..=7999],
        }
    }

    pub fn contains(self, zip_code: u32) -> bool {
        self.zip_ranges().iter().any(|r| r.contains(&zip_code))
    }

    /// Region of a zip code, or `None` when it falls outside every range.
    pub fn classify(zip_code: u32) -> Option<Region> {
        Self::ALL.into_iter().find(|r| r.contains(zip_code))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Brussels => "Brussels",
            Self::Flanders => "Flanders",
            Self::Wallonia => "Wallonia",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
