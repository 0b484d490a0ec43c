//! # Config State
//!
//! Display settings used by the command layer.
//!
//! ## Example Usage
//! ```rust,ignore
//! let config = ConfigState::new(catalog_config.display.clone());
//! config.format_list_usd(28.4932);   // "$28.49"
//! config.format_cell(21.917808);     // "21.9178"
//! ```

use vitrina_core::pricing::{format_amount, format_usd};
use vitrina_sync::DisplaySettings;

/// Read-only display configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigState {
    display: DisplaySettings,
}

impl ConfigState {
    pub fn new(display: DisplaySettings) -> Self {
        ConfigState { display }
    }

    pub fn display(&self) -> &DisplaySettings {
        &self.display
    }

    /// Formats a USD amount for the product list.
    pub fn format_list_usd(&self, value: f64) -> String {
        format_usd(value, self.display.list_decimals, self.display.locale)
    }

    /// Formats a number for an editable cell.
    pub fn format_cell(&self, value: f64) -> String {
        format_amount(value, self.display.cell_decimals, self.display.locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrina_core::pricing::NumberLocale;

    #[test]
    fn test_format_defaults() {
        let config = ConfigState::default();
        assert_eq!(config.format_list_usd(28.4932), "$28.49");
        assert_eq!(config.format_cell(21.917808), "21.9178");
    }

    #[test]
    fn test_format_es_ve() {
        let config = ConfigState::new(DisplaySettings {
            locale: NumberLocale::EsVe,
            ..DisplaySettings::default()
        });
        assert_eq!(config.format_list_usd(1234.5), "$1.234,50");
    }
}
