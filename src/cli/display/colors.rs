//! Color theme for CLI output

use comfy_table::Color as TableColor;

/// Color theme for terminal output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    /// Color for a claim phase as reported by the API server
    pub fn get_phase_color(&self, phase: &str) -> TableColor {
        match phase {
            "Bound" => self.success,
            "Pending" => self.warning,
            "Lost" => self.error,
            _ => self.muted,
        }
    }

    /// Color for the number of claims sharing one identity
    pub fn get_claim_count_color(&self, count: usize) -> TableColor {
        match count {
            0 => self.muted,
            1 => self.info,
            _ => self.error,
        }
    }
}
