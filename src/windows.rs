//! Analysis window and forward price column layout

use chrono::Duration;

/// Lookback window in days, clamped to the supported range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    days: u32,
}

impl AnalysisWindow {
    pub const MIN_DAYS: i64 = 1;
    pub const MAX_DAYS: i64 = 7;

    /// Clamp a requested window length into [1, 7] days
    pub fn clamped(requested_days: i64) -> Self {
        let days = requested_days.clamp(Self::MIN_DAYS, Self::MAX_DAYS) as u32;
        Self { days }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn kind(&self) -> WindowKind {
        if self.days <= 1 {
            WindowKind::Short
        } else {
            WindowKind::Long
        }
    }
}

/// Short windows track minute-scale forward columns, long windows
/// hour-scale ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Short,
    Long,
}

impl WindowKind {
    /// Minimum post age before the forward price columns are meaningful.
    /// Younger posts are dropped from the analysis entirely.
    pub fn maturity_threshold(&self) -> Duration {
        match self {
            WindowKind::Short => Duration::minutes(15),
            WindowKind::Long => Duration::hours(3),
        }
    }

    /// Offsets of the three forward-looking price columns
    pub fn forward_offsets(&self) -> [Duration; 3] {
        match self {
            WindowKind::Short => [
                Duration::minutes(5),
                Duration::minutes(10),
                Duration::minutes(15),
            ],
            WindowKind::Long => [Duration::hours(1), Duration::hours(2), Duration::hours(3)],
        }
    }

    /// CSV header labels matching `forward_offsets`
    pub fn forward_labels(&self) -> [&'static str; 3] {
        match self {
            WindowKind::Short => ["Price @5m", "Price @10m", "Price @15m"],
            WindowKind::Long => ["Price @1h", "Price @2h", "Price @3h"],
        }
    }
}
