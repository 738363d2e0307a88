//! Rule-based anomaly detection and deterministic risk scoring.
//!
//! Each detector is independent; the redemption engine evaluates all of
//! them and unions the results. The external scoring oracle is
//! authoritative when it answers, but this module's fallback score must
//! be fully deterministic so that oracle unavailability never makes a
//! redemption outcome flaky.

use serde::{Deserialize, Serialize};

use crate::geo;
use crate::types::Timestamp;

/// Implied speed above which travel between two scans is considered
/// physically impossible (km/h). Models the fastest common transport.
pub const IMPOSSIBLE_SPEED_KMH: f64 = 300.0;

/// Travel checks only apply within this window; beyond it, any distance
/// is plausibly coverable.
pub const TRAVEL_WINDOW_MINS: f64 = 60.0;

/// When coordinates cannot be parsed, differing location strings within
/// this window are flagged as suspicious (lower confidence).
pub const SUSPICIOUS_WINDOW_MINS: f64 = 10.0;

/// Score weights for the deterministic fallback.
const WEIGHT_DEVICE_HOPPING: i32 = 50;
const WEIGHT_IMPOSSIBLE_TRAVEL: i32 = 30;
/// Suspicious travel carries half the weight of a confirmed impossible
/// hop: the locations differ but no distance could be computed.
const WEIGHT_SUSPICIOUS_TRAVEL: i32 = 15;
const WEIGHT_FREQUENT_GENERATION: i32 = 20;
const WEIGHT_TOKEN_REUSE: i32 = 40;

/// Risk classification attached to every redeemed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Map a 0-100 score onto a level: Low < 20, Medium < 50, High >= 50.
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s < 20 => Self::Low,
            s if s < 50 => Self::Medium,
            _ => Self::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Parse a stored level string, defaulting unknown values to `Low`.
    pub fn parse(s: &str) -> Self {
        match s {
            "High" => Self::High,
            "Medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the travel check between token issuance and scan.
#[derive(Debug, Clone, PartialEq)]
pub enum TravelAnomaly {
    /// Coordinates parsed on both sides and the implied speed is beyond
    /// any common transport.
    Impossible {
        distance_km: f64,
        elapsed_mins: f64,
        speed_kmh: f64,
    },
    /// Locations differ but no distance could be computed; only flagged
    /// when the elapsed time is very short.
    Suspicious { elapsed_mins: f64 },
}

/// The boolean anomaly signals fed to the scoring oracle and to the
/// deterministic fallback.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyFlags {
    pub device_hopping: bool,
    pub impossible_travel: bool,
    pub suspicious_travel: bool,
    pub frequent_generation: bool,
    pub token_reuse: bool,
}

impl AnomalyFlags {
    /// Names of the raised flags, in fixed order. Surfaced to scanning
    /// services and recorded on rejected activities.
    pub fn active(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.device_hopping {
            names.push("device_hopping");
        }
        if self.impossible_travel {
            names.push("impossible_travel");
        }
        if self.suspicious_travel {
            names.push("suspicious_travel");
        }
        if self.frequent_generation {
            names.push("frequent_generation");
        }
        if self.token_reuse {
            names.push("token_reuse");
        }
        names
    }
}

/// Device-hopping detector: the token was bound to an issuing device and
/// the scan either omits a fingerprint or presents a different one.
pub fn is_device_hop(issuing_fingerprint: Option<&str>, scan_fingerprint: Option<&str>) -> bool {
    match issuing_fingerprint {
        None => false,
        Some(issued) => scan_fingerprint != Some(issued),
    }
}

/// Travel detector between the issuance location and the scan location.
///
/// With coordinates on both sides: flag `Impossible` when the implied
/// speed exceeds [`IMPOSSIBLE_SPEED_KMH`] within [`TRAVEL_WINDOW_MINS`].
/// Without coordinates: flag `Suspicious` when the strings differ and
/// the elapsed time is under [`SUSPICIOUS_WINDOW_MINS`]. The two signals
/// stay distinct because they carry different confidence.
pub fn check_travel(
    issued_location: &str,
    scan_location: &str,
    issued_at: Timestamp,
    scanned_at: Timestamp,
) -> Option<TravelAnomaly> {
    if issued_location.is_empty() || scan_location.is_empty() {
        return None;
    }
    if issued_location == scan_location {
        return None;
    }

    let elapsed_mins = (scanned_at - issued_at).num_milliseconds() as f64 / 60_000.0;
    if elapsed_mins <= 0.0 {
        return None;
    }

    match geo::distance_km(issued_location, scan_location) {
        Some(distance_km) if distance_km > 0.0 => {
            let speed_kmh = distance_km / elapsed_mins * 60.0;
            if speed_kmh > IMPOSSIBLE_SPEED_KMH && elapsed_mins < TRAVEL_WINDOW_MINS {
                Some(TravelAnomaly::Impossible {
                    distance_km,
                    elapsed_mins,
                    speed_kmh,
                })
            } else {
                None
            }
        }
        Some(_) => None,
        None => {
            if elapsed_mins < SUSPICIOUS_WINDOW_MINS {
                Some(TravelAnomaly::Suspicious { elapsed_mins })
            } else {
                None
            }
        }
    }
}

/// Deterministic fallback score: fixed weights, capped at 100.
///
/// Identical inputs always produce identical output -- no randomness, no
/// clock reads.
pub fn rule_based_score(flags: &AnomalyFlags) -> i32 {
    let mut score = 0;
    if flags.device_hopping {
        score += WEIGHT_DEVICE_HOPPING;
    }
    if flags.impossible_travel {
        score += WEIGHT_IMPOSSIBLE_TRAVEL;
    }
    if flags.suspicious_travel {
        score += WEIGHT_SUSPICIOUS_TRAVEL;
    }
    if flags.frequent_generation {
        score += WEIGHT_FREQUENT_GENERATION;
    }
    if flags.token_reuse {
        score += WEIGHT_TOKEN_REUSE;
    }
    score.min(100)
}
