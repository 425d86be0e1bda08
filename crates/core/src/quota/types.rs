//! Quota accounting types.

/// Length of the rolling request window, in seconds.
pub const REQUEST_WINDOW_SECS: i64 = 24 * 3600;

/// Where an API call entered from, for request accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestOrigin {
    /// A call from the public internet. Checked and counted.
    #[default]
    External,
    /// A call from a trusted first-party surface. Checked against the
    /// window but not counted into it.
    Trusted,
}

/// Result of a conditional storage charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeOutcome {
    /// Whether the charge was applied.
    pub accepted: bool,
    /// Usage after the charge when accepted, current usage otherwise.
    pub used_bytes: i64,
}

/// Result of advancing the request window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountOutcome {
    /// Whether the request fits the window allowance.
    pub accepted: bool,
    /// Window count after any increment, current count on rejection.
    pub count: i64,
}
