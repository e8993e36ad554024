//! Conversion settings.

/// Settings controlling a single conversion.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    /// Typeset in display style. Several environments (`align`, `gather`,
    /// `equation`, `multline`, `CD`) require this.
    pub display_mode: bool,
    /// Place equation numbers on the left instead of the right.
    pub leqno: bool,
    /// Treat recoverable problems as errors instead of warnings.
    pub strict: bool,
    /// Upper bound on macro expansions, to catch macro loops.
    pub max_expand: usize,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            display_mode: false,
            leqno: false,
            strict: false,
            max_expand: 1000,
        }
    }
}
