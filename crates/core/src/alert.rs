//! Security alert taxonomy and detector thresholds.

use serde::Serialize;

/// Categories of correlated security alerts produced by the periodic
/// detector sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    MultipleIdentities,
    ImpossibleTravel,
    DeviceHopping,
    FrequentGeneration,
    HighRiskScan,
    TokenReuse,
}

impl AlertType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MultipleIdentities => "multiple_identities",
            Self::ImpossibleTravel => "impossible_travel",
            Self::DeviceHopping => "device_hopping",
            Self::FrequentGeneration => "frequent_generation",
            Self::HighRiskScan => "high_risk_scan",
            Self::TokenReuse => "token_reuse",
        }
    }
}

/// Alert severity, ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Sessions updated within this many minutes count toward the
/// multi-identity device pass.
pub const MULTI_IDENTITY_WINDOW_MINS: i64 = 15;

/// How far back the cross-activity impossible-travel pass looks.
pub const CROSS_ACTIVITY_WINDOW_MINS: i64 = 60;

/// Distance between consecutive redemptions that, within the window,
/// flags cross-activity impossible travel.
pub const CROSS_ACTIVITY_DISTANCE_KM: f64 = 500.0;

/// Minimum persisted risk score for the high-risk-scan pass.
pub const HIGH_RISK_SCORE_FLOOR: i32 = 70;

/// Severity of a multi-identity device alert scales with how many
/// distinct identities shared the fingerprint.
pub fn severity_for_identity_count(count: usize) -> AlertSeverity {
    if count >= 5 {
        AlertSeverity::Critical
    } else if count >= 3 {
        AlertSeverity::High
    } else {
        AlertSeverity::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_count_severity_scales() {
        assert_eq!(severity_for_identity_count(2), AlertSeverity::Medium);
        assert_eq!(severity_for_identity_count(3), AlertSeverity::High);
        assert_eq!(severity_for_identity_count(4), AlertSeverity::High);
        assert_eq!(severity_for_identity_count(5), AlertSeverity::Critical);
        assert_eq!(severity_for_identity_count(9), AlertSeverity::Critical);
    }

    #[test]
    fn severity_is_ordered() {
        assert!(AlertSeverity::Critical > AlertSeverity::High);
        assert!(AlertSeverity::High > AlertSeverity::Medium);
        assert!(AlertSeverity::Medium > AlertSeverity::Low);
    }

    #[test]
    fn type_strings_are_stable() {
        assert_eq!(AlertType::MultipleIdentities.as_str(), "multiple_identities");
        assert_eq!(AlertType::HighRiskScan.as_str(), "high_risk_scan");
    }
}
