use serde::{Deserialize, Serialize};

/// Upper bound of the battery percentage scale
pub const MAX_PERCENTAGE: u8 = 100;

/// One battery reading decoded from a `+BATCG=` status record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// State of charge, 0-100
    pub percentage: u8,
    /// True while the device reports an active charge state
    pub charging: bool,
    /// Raw charge-state token the `charging` flag was derived from
    pub charge_code: String,
}

impl TelemetryFrame {
    /// Build a frame, clamping the percentage into 0-100.
    pub fn new(percentage: u32, charge_code: impl Into<String>) -> Self {
        let charge_code = charge_code.into();
        if percentage > MAX_PERCENTAGE as u32 {
            log::warn!("Device reported {}% battery, clamping to {}%", percentage, MAX_PERCENTAGE);
        }
        Self {
            percentage: percentage.min(MAX_PERCENTAGE as u32) as u8,
            charging: is_charging(&charge_code),
            charge_code,
        }
    }

    /// Status-bar title text, e.g. `85%`
    pub fn title(&self) -> String {
        format!("{}%", self.percentage)
    }
}

/// The device reports its charge state as a short token; anything ordering
/// after `"0"` (string comparison, not numeric) counts as charging.
pub fn is_charging(charge_code: &str) -> bool {
    charge_code > "0"
}
