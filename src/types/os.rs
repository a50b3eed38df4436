use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating system class a visitor is routed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Os {
    #[serde(rename = "iOS")]
    Ios,
    Android,
    Desktop,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Os::Ios => write!(f, "iOS"),
            Os::Android => write!(f, "Android"),
            Os::Desktop => write!(f, "Desktop"),
        }
    }
}
