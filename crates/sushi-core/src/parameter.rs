//! Parameter descriptors and the normalized ↔ domain value pipeline.
//!
//! Automatable parameters are stored and transmitted in a normalized `[0,1]`
//! form. A [`ParameterPreprocessor`] declares how that normalized value maps
//! to the processor's physical ("domain") range.
//!
//! ```
//! use sushi_core::parameter::{ParameterPreprocessor, ParameterDescriptor, ParameterType};
//!
//! let gain = ParameterDescriptor::new(
//!     0, "gain", "Gain", "dB", ParameterType::Float,
//!     -24.0, 24.0, true, ParameterPreprocessor::Linear,
//! );
//! let domain = gain.preprocessor.to_domain(0.5, gain.min_domain, gain.max_domain);
//! assert!((domain - 0.0).abs() < 1e-6);
//! ```

use std::fmt;

/// How a normalized `[0,1]` value maps onto a parameter's domain range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParameterPreprocessor {
    /// `domain = min + normalized * (max - min)`
    #[default]
    Linear,
    /// A cubic warp giving more resolution near the center of the range:
    /// `domain = min + (3n^2 - 2n^3) * (max - min)` where `n` is normalized.
    CubicWarp,
    /// Logarithmic (decibel-to-linear-gain) mapping. Requires `min_domain > 0`
    /// when used for a linear-gain parameter, or treats `min_domain`/`max_domain`
    /// as dB bounds and returns a linear gain factor.
    DbToLinear,
}

impl ParameterPreprocessor {
    /// Convert a normalized `[0,1]` value to its domain representation.
    pub fn to_domain(&self, normalized: f32, min_domain: f32, max_domain: f32) -> f32 {
        let normalized = normalized.clamp(0.0, 1.0);
        match self {
            ParameterPreprocessor::Linear => min_domain + normalized * (max_domain - min_domain),
            ParameterPreprocessor::CubicWarp => {
                let warped = 3.0 * normalized * normalized - 2.0 * normalized * normalized * normalized;
                min_domain + warped * (max_domain - min_domain)
            }
            ParameterPreprocessor::DbToLinear => {
                let db = min_domain + normalized * (max_domain - min_domain);
                10f32.powf(db / 20.0)
            }
        }
    }

    /// Convert a domain value back to its normalized `[0,1]` representation.
    pub fn to_normalized(&self, domain: f32, min_domain: f32, max_domain: f32) -> f32 {
        let span = max_domain - min_domain;
        if span.abs() < f32::EPSILON {
            return 0.0;
        }
        let normalized = match self {
            ParameterPreprocessor::Linear => (domain - min_domain) / span,
            ParameterPreprocessor::CubicWarp => {
                // Invert the cubic smoothstep by bisection; monotonic on [0,1].
                let target = (domain - min_domain) / span;
                let mut lo = 0.0f32;
                let mut hi = 1.0f32;
                for _ in 0..24 {
                    let mid = (lo + hi) / 2.0;
                    let warped = 3.0 * mid * mid - 2.0 * mid * mid * mid;
                    if warped < target {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                }
                (lo + hi) / 2.0
            }
            ParameterPreprocessor::DbToLinear => {
                let db = 20.0 * domain.max(1e-9).log10();
                (db - min_domain) / span
            }
        };
        normalized.clamp(0.0, 1.0)
    }
}

/// The kind of value a parameter holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    Bool,
    Int,
    Float,
    StringProperty,
    DataProperty,
}

impl ParameterType {
    /// String/data properties are not automatable numeric values.
    pub fn is_property(&self) -> bool {
        matches!(self, ParameterType::StringProperty | ParameterType::DataProperty)
    }
}

/// Immutable descriptor for a parameter, fixed at processor creation.
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    pub id: u32,
    pub name: String,
    pub label: String,
    pub unit: String,
    pub parameter_type: ParameterType,
    pub min_domain: f32,
    pub max_domain: f32,
    pub automatable: bool,
    pub preprocessor: ParameterPreprocessor,
}

impl ParameterDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        name: impl Into<String>,
        label: impl Into<String>,
        unit: impl Into<String>,
        parameter_type: ParameterType,
        min_domain: f32,
        max_domain: f32,
        automatable: bool,
        preprocessor: ParameterPreprocessor,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            label: label.into(),
            unit: unit.into(),
            parameter_type,
            min_domain,
            max_domain,
            automatable,
            preprocessor,
        }
    }

    /// Format a domain value the way a UI would display it, e.g. "-3.00 dB".
    pub fn format_domain_value(&self, domain_value: f32) -> String {
        if self.unit.is_empty() {
            format!("{domain_value:.2}")
        } else {
            format!("{domain_value:.2} {}", self.unit)
        }
    }
}

/// A property value: either a string or opaque binary data.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Data(Vec<u8>),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{s}"),
            PropertyValue::Data(d) => write!(f, "<{} bytes>", d.len()),
        }
    }
}

/// The live value held by a parameter inside its owning processor.
#[derive(Debug, Clone)]
pub enum ParameterValue {
    /// Always stored normalized `[0,1]`; bool/int parameters additionally
    /// round-trip through the descriptor's domain range (e.g. int steps).
    Numeric(f32),
    Property(PropertyValue),
}

impl ParameterValue {
    pub fn as_normalized(&self) -> Option<f32> {
        match self {
            ParameterValue::Numeric(v) => Some(*v),
            ParameterValue::Property(_) => None,
        }
    }
}
