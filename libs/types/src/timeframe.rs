//! Timeframe enumeration — spec §2 glossary: "Fixed period size (1m, 5m,
//! 15m, 1h, 4h, 1d). All candle timestamps are aligned to the start of the
//! enclosing period."

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// A fixed candle period. Ordering follows period length, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 6] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    /// Higher timeframes synthesised from the 5-minute source stream
    /// (spec §4.6: "Higher timeframes in use: 15m, 1h, 4h, 1d").
    pub const AGGREGATED: [Timeframe; 4] =
        [Timeframe::M15, Timeframe::H1, Timeframe::H4, Timeframe::D1];

    pub const SOURCE: Timeframe = Timeframe::M5;

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    /// Period length in milliseconds.
    pub fn to_ms(self) -> i64 {
        match self {
            Timeframe::M1 => 60_000,
            Timeframe::M5 => 5 * 60_000,
            Timeframe::M15 => 15 * 60_000,
            Timeframe::H1 => 60 * 60_000,
            Timeframe::H4 => 4 * 60 * 60_000,
            Timeframe::D1 => 24 * 60 * 60_000,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = DomainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            other => Err(DomainError::InvalidTimeframe(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for tf in Timeframe::ALL {
            assert_eq!(Timeframe::from_str(tf.as_str()).unwrap(), tf);
        }
    }

    #[test]
    fn rejects_unknown_timeframe() {
        assert!(Timeframe::from_str("3m").is_err());
    }

    #[test]
    fn ms_values_match_spec() {
        assert_eq!(Timeframe::M5.to_ms(), 300_000);
        assert_eq!(Timeframe::H1.to_ms(), 3_600_000);
        assert_eq!(Timeframe::D1.to_ms(), 86_400_000);
    }
}
