use std::fmt;

use serde::{Deserialize, Serialize};

use crate::OptionsError;

/// Default nesting limit shared by the diff engine, renderer and parser.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Largest starting indentation accepted by [`RenderConfig`].
pub const MAX_INDENT: usize = 1024;

/// Selects how hard the diff engine works to shrink its output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffMode {
    /// Sequence alignment for arrays and a size comparison against a
    /// wholesale replacement at every level (default).
    #[default]
    Minimal,
    /// Commonality heuristic that never aligns arrays.
    Fast,
}

impl DiffMode {
    /// Returns `true` for [`DiffMode::Minimal`].
    #[must_use]
    pub fn is_minimal(self) -> bool {
        matches!(self, Self::Minimal)
    }
}

impl fmt::Display for DiffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffMode::Minimal => f.write_str("minimal"),
            DiffMode::Fast => f.write_str("fast"),
        }
    }
}

/// Configuration knobs passed to the diff engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiffOptions {
    mode: DiffMode,
    max_depth: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self { mode: DiffMode::Minimal, max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl DiffOptions {
    /// Shorthand for the default options switched to [`DiffMode::Fast`].
    ///
    /// ```
    /// # use json_delta_core::{DiffMode, DiffOptions};
    /// assert_eq!(DiffOptions::fast().mode(), DiffMode::Fast);
    /// ```
    #[must_use]
    pub fn fast() -> Self {
        Self { mode: DiffMode::Fast, ..Self::default() }
    }

    /// Fast mode with a depth limit that has already been validated.
    pub(crate) fn fast_with_depth(max_depth: usize) -> Self {
        Self { mode: DiffMode::Fast, max_depth }
    }

    /// Returns the configured diff mode.
    #[must_use]
    pub fn mode(&self) -> DiffMode {
        self.mode
    }

    /// Returns the nesting limit.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Sets the diff mode.
    ///
    /// ```
    /// # use json_delta_core::{DiffMode, DiffOptions};
    /// let opts = DiffOptions::default().with_mode(DiffMode::Fast).expect("fast mode");
    /// assert_eq!(opts.mode(), DiffMode::Fast);
    /// ```
    pub fn with_mode(mut self, mode: DiffMode) -> Result<Self, OptionsError> {
        self.mode = mode;
        self.validate()?;
        Ok(self)
    }

    /// Sets the nesting limit.
    ///
    /// ```
    /// # use json_delta_core::{DiffOptions, OptionsError};
    /// let opts = DiffOptions::default().with_max_depth(8).expect("depth");
    /// assert_eq!(opts.max_depth(), 8);
    /// assert_eq!(DiffOptions::default().with_max_depth(0).unwrap_err(), OptionsError::ZeroDepth);
    /// ```
    pub fn with_max_depth(mut self, max_depth: usize) -> Result<Self, OptionsError> {
        self.max_depth = max_depth;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), OptionsError> {
        validate_depth(self.max_depth)
    }
}

/// Configuration toggles for udiff rendering.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RenderConfig {
    max_depth: usize,
    indent: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH, indent: 0 }
    }
}

impl RenderConfig {
    /// Constructs a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the nesting limit.
    #[must_use]
    pub fn max_depth(self) -> usize {
        self.max_depth
    }

    /// Returns the indentation of the outermost lines.
    #[must_use]
    pub fn indent(self) -> usize {
        self.indent
    }

    /// Sets the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Result<Self, OptionsError> {
        self.max_depth = max_depth;
        self.validate()?;
        Ok(self)
    }

    /// Sets the indentation of the outermost lines.
    ///
    /// ```
    /// # use json_delta_core::RenderConfig;
    /// let config = RenderConfig::new().with_indent(2).expect("indent");
    /// assert_eq!(config.indent(), 2);
    /// ```
    pub fn with_indent(mut self, indent: usize) -> Result<Self, OptionsError> {
        self.indent = indent;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), OptionsError> {
        validate_depth(self.max_depth)?;
        if self.indent > MAX_INDENT {
            return Err(OptionsError::IndentTooLarge { indent: self.indent, max: MAX_INDENT });
        }
        Ok(())
    }
}

/// Configuration for the udiff parser.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ParseConfig {
    reverse: bool,
    max_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self { reverse: false, max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl ParseConfig {
    /// Constructs a configuration with default settings (forward parsing).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indicates whether `+` and `-` swap meaning.
    #[must_use]
    pub fn reverse(self) -> bool {
        self.reverse
    }

    /// Returns the nesting limit for the keypath tracker.
    #[must_use]
    pub fn max_depth(self) -> usize {
        self.max_depth
    }

    /// Swaps the meaning of `+` and `-`, yielding the inverse delta.
    ///
    /// ```
    /// # use json_delta_core::ParseConfig;
    /// assert!(ParseConfig::new().with_reverse(true).reverse());
    /// ```
    #[must_use]
    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Sets the nesting limit for the keypath tracker.
    pub fn with_max_depth(mut self, max_depth: usize) -> Result<Self, OptionsError> {
        self.max_depth = max_depth;
        validate_depth(self.max_depth)?;
        Ok(self)
    }
}

fn validate_depth(max_depth: usize) -> Result<(), OptionsError> {
    if max_depth == 0 {
        return Err(OptionsError::ZeroDepth);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_shared_depth_limit() {
        assert_eq!(DiffOptions::default().max_depth(), DEFAULT_MAX_DEPTH);
        assert_eq!(RenderConfig::default().max_depth(), DEFAULT_MAX_DEPTH);
        assert_eq!(ParseConfig::default().max_depth(), DEFAULT_MAX_DEPTH);
        assert_eq!(DiffOptions::default().mode(), DiffMode::Minimal);
    }

    #[test]
    fn zero_depth_is_rejected_everywhere() {
        assert_eq!(DiffOptions::default().with_max_depth(0).unwrap_err(), OptionsError::ZeroDepth);
        assert_eq!(RenderConfig::new().with_max_depth(0).unwrap_err(), OptionsError::ZeroDepth);
        assert_eq!(ParseConfig::new().with_max_depth(0).unwrap_err(), OptionsError::ZeroDepth);
    }

    #[test]
    fn oversized_indent_is_rejected() {
        let err = RenderConfig::new().with_indent(MAX_INDENT + 1).unwrap_err();
        assert_eq!(err, OptionsError::IndentTooLarge { indent: MAX_INDENT + 1, max: MAX_INDENT });
    }

    #[test]
    fn mode_display_is_lowercase() {
        assert_eq!(DiffMode::Fast.to_string(), "fast");
        assert_eq!(DiffMode::Minimal.to_string(), "minimal");
    }
}
