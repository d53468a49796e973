//! Inference options.
use std::str::FromStr;

pub const DEFAULT_ROOT_NAME: &str = "RootObject";
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Which TypeScript declaration form to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclarationStyle {
    #[default]
    Interface,
    Class,
}

/// What to do with an explicit reference whose target never gets declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferencePolicy {
    /// Ignore the annotation and keep the inferred field type (logged as a warning).
    #[default]
    Drop,
    /// Emit the target name anyway, even though nothing declares it.
    Keep,
    /// Fail with `Error::UnresolvableExplicitReference`.
    Error,
}

impl FromStr for ReferencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "keep" => Ok(Self::Keep),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown reference policy `{other}` (expected drop, keep or error)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Name bound to the root shape.
    pub root_name: String,
    pub style: DeclarationStyle,
    /// Classify RFC 3339 timestamps and `YYYY-MM-DD` strings as `Date`.
    pub detect_dates: bool,
    /// Maximum nesting depth accepted before inference bails out.
    pub max_depth: usize,
    pub references: ReferencePolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            style: DeclarationStyle::Interface,
            detect_dates: false,
            max_depth: DEFAULT_MAX_DEPTH,
            references: ReferencePolicy::Drop,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: DeclarationStyle) -> Self {
        self.style = style;
        self
    }

    /// Shorthand for the `useInterface` switch.
    #[must_use]
    pub fn with_interfaces(self, use_interface: bool) -> Self {
        self.with_style(if use_interface { DeclarationStyle::Interface } else { DeclarationStyle::Class })
    }

    #[must_use]
    pub fn with_date_detection(mut self, enabled: bool) -> Self {
        self.detect_dates = enabled;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    #[must_use]
    pub fn with_reference_policy(mut self, policy: ReferencePolicy) -> Self {
        self.references = policy;
        self
    }
}
