//! Egress-facing binding records and drain classification.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Drain;

/// Routing classification of a drain, derived from its URL query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrainType {
    #[default]
    Log,
    Metric,
    All,
    Aggregate,
}

impl DrainType {
    /// Classify a drain URL.
    ///
    /// Any value of `include-metrics-deprecated` wins and marks the drain as
    /// an aggregate destination; otherwise `drain-type` selects between logs
    /// (the default, including unknown values), metrics, and all.
    pub fn for_url(url: &Url) -> Self {
        let mut drain_type = None;
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "include-metrics-deprecated" if !value.is_empty() => {
                    return DrainType::Aggregate;
                },
                "drain-type" => {
                    drain_type = Some(match value.as_ref() {
                        "metrics" => DrainType::Metric,
                        "all" => DrainType::All,
                        _ => DrainType::Log,
                    });
                },
                _ => {},
            }
        }
        drain_type.unwrap_or_default()
    }
}

/// One (application, drain) pair ready for the egress subsystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyslogBinding {
    pub app_id: String,
    #[serde(default)]
    pub hostname: String,
    pub drain: Drain,
    #[serde(default)]
    pub drain_type: DrainType,
}
