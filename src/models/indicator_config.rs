use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Indicator families that can be toggled on a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndicatorKind {
    /// 5-day simple moving average
    Ma5,
    /// 20-day simple moving average
    Ma20,
    /// Rolling volume weighted average price
    Vwap,
    /// Relative strength index
    Rsi,
    /// Bollinger bands
    Boll,
    /// MACD line, signal and histogram
    Macd,
}

impl IndicatorKind {
    /// Display name, also accepted by the parser
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Ma5 => "MA5",
            IndicatorKind::Ma20 => "MA20",
            IndicatorKind::Vwap => "VWAP",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Boll => "BOLL",
            IndicatorKind::Macd => "MACD",
        }
    }

    /// Get all indicator kinds
    pub fn all() -> Vec<IndicatorKind> {
        vec![
            IndicatorKind::Ma5,
            IndicatorKind::Ma20,
            IndicatorKind::Vwap,
            IndicatorKind::Rsi,
            IndicatorKind::Boll,
            IndicatorKind::Macd,
        ]
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IndicatorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MA5" => Ok(IndicatorKind::Ma5),
            "MA20" => Ok(IndicatorKind::Ma20),
            "VWAP" => Ok(IndicatorKind::Vwap),
            "RSI" => Ok(IndicatorKind::Rsi),
            "BOLL" | "BB" => Ok(IndicatorKind::Boll),
            "MACD" => Ok(IndicatorKind::Macd),
            other => Err(Error::InvalidInput(format!("Unknown indicator: {}", other))),
        }
    }
}

/// Which indicators are computed and drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    enabled: BTreeMap<IndicatorKind, bool>,
}

impl IndicatorConfig {
    /// Config with every indicator disabled
    pub fn none() -> Self {
        Self {
            enabled: IndicatorKind::all().into_iter().map(|k| (k, false)).collect(),
        }
    }

    /// Config with every indicator enabled
    pub fn all() -> Self {
        Self {
            enabled: IndicatorKind::all().into_iter().map(|k| (k, true)).collect(),
        }
    }

    /// Enable exactly the indicators in a comma separated list (`MA5,RSI,MACD`)
    pub fn parse_list(list: &str) -> Result<Self> {
        let mut config = Self::none();
        for name in list.split(',').filter(|s| !s.trim().is_empty()) {
            config.set(name.parse()?, true);
        }
        Ok(config)
    }

    pub fn is_enabled(&self, kind: IndicatorKind) -> bool {
        self.enabled.get(&kind).copied().unwrap_or(false)
    }

    pub fn set(&mut self, kind: IndicatorKind, enabled: bool) {
        self.enabled.insert(kind, enabled);
    }

    /// Builder-style toggle
    pub fn with(mut self, kind: IndicatorKind, enabled: bool) -> Self {
        self.set(kind, enabled);
        self
    }

    /// Enabled indicators in declaration order
    pub fn enabled_kinds(&self) -> Vec<IndicatorKind> {
        self.enabled
            .iter()
            .filter(|(_, on)| **on)
            .map(|(kind, _)| *kind)
            .collect()
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self::none()
            .with(IndicatorKind::Ma5, true)
            .with(IndicatorKind::Ma20, true)
            .with(IndicatorKind::Vwap, true)
            .with(IndicatorKind::Macd, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let config = IndicatorConfig::default();
        assert!(config.is_enabled(IndicatorKind::Ma5));
        assert!(config.is_enabled(IndicatorKind::Ma20));
        assert!(config.is_enabled(IndicatorKind::Vwap));
        assert!(!config.is_enabled(IndicatorKind::Rsi));
        assert!(!config.is_enabled(IndicatorKind::Boll));
        assert!(config.is_enabled(IndicatorKind::Macd));
    }

    #[test]
    fn test_parse_list() {
        let config = IndicatorConfig::parse_list("ma5, rsi,MACD").unwrap();
        assert_eq!(
            config.enabled_kinds(),
            vec![IndicatorKind::Ma5, IndicatorKind::Rsi, IndicatorKind::Macd]
        );

        assert!(IndicatorConfig::parse_list("").unwrap().enabled_kinds().is_empty());
        assert!(matches!(
            IndicatorConfig::parse_list("MA5,KDJ"),
            Err(Error::InvalidInput(_))
        ));
    }
}
