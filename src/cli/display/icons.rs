//! Status icons for CLI output

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    pub const SUCCESS: &'static str = "✓";

    pub const WARNING: &'static str = "⚠";

    pub const ERROR: &'static str = "✗";

    pub const PENDING: &'static str = "⏳";

    pub const UNKNOWN: &'static str = "?";

    /// Icon for a claim phase
    pub fn get_phase_icon(phase: &str) -> &'static str {
        match phase {
            "Bound" => Self::SUCCESS,
            "Pending" => Self::PENDING,
            "Lost" => Self::ERROR,
            _ => Self::UNKNOWN,
        }
    }

    /// Icon for a provisioning pass: clean, partial or failed
    pub fn get_report_icon(succeeded: usize, failed: usize) -> &'static str {
        if failed == 0 {
            Self::SUCCESS
        } else if succeeded > 0 {
            Self::WARNING
        } else {
            Self::ERROR
        }
    }
}
