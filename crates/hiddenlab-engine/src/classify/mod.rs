pub mod hidden;

use std::fmt;
use std::str::FromStr;

use hiddenlab_core::record::RecordList;
use hiddenlab_core::types::{Gesture, Mark};
use serde::{Deserialize, Serialize};

pub use hidden::is_validated_hidden;

/// Instance filter shared by counting, listing, and export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterRule {
    /// [`is_validated_hidden`].
    #[default]
    ValidatedHidden,
    /// Every record's decision is `o`; the stricter rule earlier exports
    /// applied. Empty lists and lists holding element or frame records never
    /// match.
    AllMarkedYes,
}

impl FilterRule {
    pub fn matches(self, gesture: Gesture, records: &RecordList) -> bool {
        match self {
            FilterRule::ValidatedHidden => is_validated_hidden(gesture, records),
            FilterRule::AllMarkedYes => {
                !records.is_empty() && records.iter().all(|r| r.as_mark() == Some(Mark::Yes))
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterRule::ValidatedHidden => "validated-hidden",
            FilterRule::AllMarkedYes => "all-marked-yes",
        }
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validated-hidden" => Ok(FilterRule::ValidatedHidden),
            "all-marked-yes" => Ok(FilterRule::AllMarkedYes),
            other => Err(format!(
                "unknown rule '{other}' (use: validated-hidden, all-marked-yes)"
            )),
        }
    }
}
