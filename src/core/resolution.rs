//! Outcome of a fail-open stage: resolved directly, or through a fallback.
//!
//! Fatal failures are never a `Resolution`; they travel as `Err` values.

/// A stage value tagged with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// The stage succeeded on its primary path.
    Direct(T),
    /// The stage substituted a fallback; `warning` says why.
    Recovered { value: T, warning: String },
}

impl<T> Resolution<T> {
    pub fn recovered(value: T, warning: impl Into<String>) -> Self {
        Self::Recovered {
            value,
            warning: warning.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Direct(value) | Self::Recovered { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Direct(value) | Self::Recovered { value, .. } => value,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::Recovered { .. })
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Direct(_) => None,
            Self::Recovered { warning, .. } => Some(warning),
        }
    }

    /// Split into the value and the warning, if any.
    pub fn into_parts(self) -> (T, Option<String>) {
        match self {
            Self::Direct(value) => (value, None),
            Self::Recovered { value, warning } => (value, Some(warning)),
        }
    }

    /// Rewrite the warning of a recovered value; direct values pass through.
    pub fn map_warning(self, f: impl FnOnce(String) -> String) -> Self {
        match self {
            Self::Direct(value) => Self::Direct(value),
            Self::Recovered { value, warning } => Self::Recovered {
                value,
                warning: f(warning),
            },
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Self::Direct(value) => Resolution::Direct(f(value)),
            Self::Recovered { value, warning } => Resolution::Recovered {
                value: f(value),
                warning,
            },
        }
    }
}
