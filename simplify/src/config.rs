//! Simplifier configuration.
//!
//! Typed configuration with a bon builder and environment variable fallbacks.

use bon::bon;

/// Switches controlling which rewrites the simplifier may perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplifierConfig {
    /// Compare layouts when checking shape equality; enables bitcast and
    /// convolution rewrites, disables reshape sinking.
    pub layout_sensitive: bool,
    /// Allow dot strength reduction (zero-element dots, transposed operands, vector dots).
    pub enable_dot_strength_reduction: bool,
    /// Allow convolution to dot rewriting (layout-sensitive mode only).
    pub enable_conv_to_dot: bool,
    /// Sweep cap for [`Fixpoint`](crate::Fixpoint).
    pub max_fixpoint_iterations: usize,
}

impl Default for SimplifierConfig {
    fn default() -> Self {
        Self {
            layout_sensitive: false,
            enable_dot_strength_reduction: true,
            enable_conv_to_dot: true,
            max_fixpoint_iterations: 32,
        }
    }
}

#[bon]
impl SimplifierConfig {
    /// Create a simplifier configuration with builder pattern.
    #[builder]
    pub fn builder(
        #[builder(default = false)] layout_sensitive: bool,
        #[builder(default = true)] enable_dot_strength_reduction: bool,
        #[builder(default = true)] enable_conv_to_dot: bool,
        #[builder(default = 32)] max_fixpoint_iterations: usize,
    ) -> Self {
        Self { layout_sensitive, enable_dot_strength_reduction, enable_conv_to_dot, max_fixpoint_iterations }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `TESSEL_LAYOUT_SENSITIVE` - Run in layout-sensitive mode if set
    /// * `TESSEL_NO_DOT_SIMPLIFY` - Disable dot strength reduction if set
    /// * `TESSEL_NO_CONV_TO_DOT` - Disable convolution to dot rewriting if set
    /// * `TESSEL_SIMPLIFY_MAX_ITERS` - Fixpoint sweep cap (default: 32)
    pub fn from_env() -> Self {
        let layout_sensitive = std::env::var("TESSEL_LAYOUT_SENSITIVE").is_ok();
        let enable_dot_strength_reduction = std::env::var("TESSEL_NO_DOT_SIMPLIFY").is_err();
        let enable_conv_to_dot = std::env::var("TESSEL_NO_CONV_TO_DOT").is_err();
        let max_fixpoint_iterations =
            std::env::var("TESSEL_SIMPLIFY_MAX_ITERS").ok().and_then(|s| s.parse().ok()).unwrap_or(32);

        Self { layout_sensitive, enable_dot_strength_reduction, enable_conv_to_dot, max_fixpoint_iterations }
    }

    /// Same configuration with layout sensitivity switched.
    pub fn with_layout_sensitive(mut self, layout_sensitive: bool) -> Self {
        self.layout_sensitive = layout_sensitive;
        self
    }
}
