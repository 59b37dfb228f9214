//! Encoded values - named, bit-packed per-edge attributes
//!
//! Every edge owns a fixed number of `u32` words ("flags"). The [`Registry`] assigns
//! each declared attribute a bit range inside those words; an [`EvHandle`] carries that
//! range plus the codec, so reading or writing an attribute is a shift and a mask with
//! no name lookup.
//!
//! Layout rules:
//! - a bit range never straddles a word boundary (width 1..=32)
//! - ranges are placed first-fit, in declaration order, so the same declaration
//!   sequence always produces the same layout (stored graphs depend on it)
//! - directional values get two ranges: forward first, then backward

pub mod access;
pub mod classes;
pub mod registry;
pub mod standard;
pub mod store;

pub use access::EvValue;
pub use classes::{RoadAccess, RoadClass, RouteNetwork, Surface, Toll};
pub use registry::{BitRange, Codec, EvHandle, Registry};
pub use standard::{ModeValues, RelationValues, StandardValues};
pub use store::EdgeFlagsStore;

use thiserror::Error;

/// Number of bits in one flags word
pub const WORD_BITS: u32 = 32;

/// Traversal direction of an edge relative to its stored orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Forward, Direction::Backward];

    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    pub fn is_backward(self) -> bool {
        matches!(self, Direction::Backward)
    }
}

/// Kind of an encoded value and its kind-specific parameters
#[derive(Debug, Clone, PartialEq)]
pub enum EvKind {
    Bool,
    /// Unsigned integer, `0..2^bits`
    Int { bits: u32 },
    /// Decimal stored as `round(value / factor)`
    ///
    /// `signed` shifts the stored range so it is centered on zero. With
    /// `max_is_infinity` the largest raw value decodes to `+inf`.
    Decimal {
        bits: u32,
        factor: f64,
        signed: bool,
        max_is_infinity: bool,
    },
    /// One of an ordered set of names; index 0 is the default
    Enum { values: Vec<String> },
}

impl EvKind {
    /// Width of one bit range for this kind
    pub fn bits(&self) -> u32 {
        match self {
            EvKind::Bool => 1,
            EvKind::Int { bits } | EvKind::Decimal { bits, .. } => *bits,
            EvKind::Enum { values } => {
                let n = values.len().max(2) as u32;
                WORD_BITS - (n - 1).leading_zeros()
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EvKind::Bool => "boolean",
            EvKind::Int { .. } => "integer",
            EvKind::Decimal { .. } => "decimal",
            EvKind::Enum { .. } => "enum",
        }
    }
}

/// Declaration of one encoded value
#[derive(Debug, Clone, PartialEq)]
pub struct EvDescriptor {
    pub name: String,
    pub kind: EvKind,
    pub directional: bool,
}

impl EvDescriptor {
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, EvKind::Bool)
    }

    pub fn int(name: impl Into<String>, bits: u32) -> Self {
        Self::new(name, EvKind::Int { bits })
    }

    pub fn decimal(name: impl Into<String>, bits: u32, factor: f64) -> Self {
        Self::new(
            name,
            EvKind::Decimal {
                bits,
                factor,
                signed: false,
                max_is_infinity: false,
            },
        )
    }

    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            EvKind::Enum {
                values: values.into_iter().map(Into::into).collect(),
            },
        )
    }

    fn new(name: impl Into<String>, kind: EvKind) -> Self {
        Self {
            name: name.into(),
            kind,
            directional: false,
        }
    }

    /// Store separate forward and backward values
    pub fn directional(mut self) -> Self {
        self.directional = true;
        self
    }

    /// Decimal only: allow negative values
    pub fn signed(mut self) -> Self {
        if let EvKind::Decimal { signed, .. } = &mut self.kind {
            *signed = true;
        }
        self
    }

    /// Decimal only: reserve the largest raw value for `+inf`
    pub fn max_is_infinity(mut self) -> Self {
        if let EvKind::Decimal {
            max_is_infinity, ..
        } = &mut self.kind
        {
            *max_is_infinity = true;
        }
        self
    }

    /// Total bits this declaration occupies (both directions)
    pub fn total_bits(&self) -> u32 {
        self.kind.bits() * if self.directional { 2 } else { 1 }
    }
}

/// Encoded value errors
///
/// Layout and naming errors are fatal at graph build time. `Range` is returned by the
/// accessors; parsers turn it into a diagnostic instead of propagating it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvError {
    #[error("layout error: '{name}' needs {bits} bits but none of the {words} flag words has room")]
    Layout { name: String, bits: u32, words: usize },

    #[error("invalid declaration for '{name}': {reason}")]
    InvalidDeclaration { name: String, reason: String },

    #[error("encoded value '{0}' is already declared")]
    DuplicateName(String),

    #[error("unknown encoded value '{name}'{}", suggestion_suffix(.suggestion))]
    UnknownAttribute {
        name: String,
        suggestion: Option<String>,
    },

    #[error("registry is finalized, cannot declare '{0}'")]
    RegistryClosed(String),

    #[error("value {value} is not representable by encoded value #{id} (allowed {min}..={max})")]
    Range {
        id: u16,
        value: String,
        min: String,
        max: String,
    },

    #[error("encoded value #{id} is {actual}, cannot store a {expected}")]
    KindMismatch {
        id: u16,
        expected: &'static str,
        actual: &'static str,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(", did you mean '{s}'?"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_bits() {
        let two = EvDescriptor::enumeration("e", ["A", "B"]);
        assert_eq!(two.kind.bits(), 1);
        let three = EvDescriptor::enumeration("e", ["A", "B", "C"]);
        assert_eq!(three.kind.bits(), 2);
        let eight = EvDescriptor::enumeration("e", ["A", "B", "C", "D", "E", "F", "G", "H"]);
        assert_eq!(eight.kind.bits(), 3);
        let nine = EvDescriptor::enumeration("e", ["A", "B", "C", "D", "E", "F", "G", "H", "I"]);
        assert_eq!(nine.kind.bits(), 4);
        let one = EvDescriptor::enumeration("e", ["ONLY"]);
        assert_eq!(one.kind.bits(), 1);
    }

    #[test]
    fn test_directional_doubles_width() {
        let d = EvDescriptor::decimal("speed", 5, 5.0).directional();
        assert_eq!(d.total_bits(), 10);
    }

    #[test]
    fn test_unknown_attribute_message() {
        let err = EvError::UnknownAttribute {
            name: "road_clas".into(),
            suggestion: Some("road_class".into()),
        };
        assert_eq!(
            err.to_string(),
            "unknown encoded value 'road_clas', did you mean 'road_class'?"
        );
        let err = EvError::UnknownAttribute {
            name: "weather".into(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "unknown encoded value 'weather'");
    }

    #[test]
    fn test_direction_reversed() {
        assert_eq!(Direction::Forward.reversed(), Direction::Backward);
        assert!(Direction::Forward.reversed().is_backward());
    }
}
