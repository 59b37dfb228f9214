//! Edge attribute accessors
//!
//! Pure shift/mask transforms over a caller-owned flags slice. The slice must be at
//! least `Registry::words_per_edge()` long; nothing here allocates or resizes it.
//!
//! Non-directional values ignore the `Direction` argument.

use super::registry::{BitRange, Codec, EvHandle};
use super::{Direction, EvError};

/// A decoded encoded value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvValue {
    Bool(bool),
    Int(u32),
    Decimal(f64),
    /// Index into the enum's declared value set
    Enum(u16),
}

#[inline]
fn read(range: BitRange, flags: &[u32]) -> u32 {
    (flags[range.word as usize] >> range.shift) & range.mask()
}

#[inline]
fn write(range: BitRange, flags: &mut [u32], raw: u32) {
    let mask = range.mask() << range.shift;
    let word = &mut flags[range.word as usize];
    *word = (*word & !mask) | ((raw << range.shift) & mask);
}

impl EvHandle {
    #[inline]
    fn range(&self, direction: Direction) -> BitRange {
        match (direction, self.bwd) {
            (Direction::Backward, Some(bwd)) => bwd,
            _ => self.fwd,
        }
    }

    /// Raw stored bits
    #[inline]
    pub fn get_raw(&self, flags: &[u32], direction: Direction) -> u32 {
        read(self.range(direction), flags)
    }

    fn kind_mismatch(&self, expected: &'static str) -> EvError {
        EvError::KindMismatch {
            id: self.id,
            expected,
            actual: self.codec.kind_name(),
        }
    }

    #[inline]
    pub fn get_bool(&self, flags: &[u32], direction: Direction) -> bool {
        self.get_raw(flags, direction) != 0
    }

    pub fn set_bool(&self, flags: &mut [u32], direction: Direction, value: bool) -> Result<(), EvError> {
        if !matches!(self.codec, Codec::Bool) {
            return Err(self.kind_mismatch("boolean"));
        }
        write(self.range(direction), flags, value as u32);
        Ok(())
    }

    #[inline]
    pub fn get_int(&self, flags: &[u32], direction: Direction) -> u32 {
        self.get_raw(flags, direction)
    }

    pub fn set_int(&self, flags: &mut [u32], direction: Direction, value: u32) -> Result<(), EvError> {
        let Codec::Int { max } = self.codec else {
            return Err(self.kind_mismatch("integer"));
        };
        if value > max {
            return Err(EvError::Range {
                id: self.id,
                value: value.to_string(),
                min: "0".into(),
                max: max.to_string(),
            });
        }
        write(self.range(direction), flags, value);
        Ok(())
    }

    /// Decoded decimal; `+inf` for the reserved maximum when enabled
    #[inline]
    pub fn get_decimal(&self, flags: &[u32], direction: Direction) -> f64 {
        let raw = self.get_raw(flags, direction);
        match self.codec {
            Codec::Decimal {
                factor,
                offset,
                max_raw,
                max_is_infinity,
            } => {
                if max_is_infinity && raw == max_raw {
                    f64::INFINITY
                } else {
                    (raw as i64 - offset) as f64 * factor
                }
            }
            _ => raw as f64,
        }
    }

    pub fn set_decimal(&self, flags: &mut [u32], direction: Direction, value: f64) -> Result<(), EvError> {
        let Codec::Decimal {
            factor,
            offset,
            max_raw,
            max_is_infinity,
        } = self.codec
        else {
            return Err(self.kind_mismatch("decimal"));
        };

        if max_is_infinity && value == f64::INFINITY {
            write(self.range(direction), flags, max_raw);
            return Ok(());
        }

        let highest = if max_is_infinity { max_raw - 1 } else { max_raw };
        let raw = if value.is_finite() {
            (value / factor).round() + offset as f64
        } else {
            f64::NAN
        };
        if !(raw >= 0.0 && raw <= highest as f64) {
            return Err(EvError::Range {
                id: self.id,
                value: value.to_string(),
                min: ((-offset) as f64 * factor).to_string(),
                max: ((highest as i64 - offset) as f64 * factor).to_string(),
            });
        }
        write(self.range(direction), flags, raw as u32);
        Ok(())
    }

    /// Smallest decimal this value can store; zero for every other kind
    pub fn min_decimal(&self) -> f64 {
        match self.codec {
            Codec::Decimal { factor, offset, .. } => (-offset) as f64 * factor,
            _ => 0.0,
        }
    }

    /// Largest finite decimal this value can store
    pub fn max_decimal(&self) -> f64 {
        match self.codec {
            Codec::Decimal {
                factor,
                offset,
                max_raw,
                max_is_infinity,
            } => {
                let highest = if max_is_infinity { max_raw - 1 } else { max_raw };
                (highest as i64 - offset) as f64 * factor
            }
            Codec::Int { max } => max as f64,
            Codec::Enum { len } => len.saturating_sub(1) as f64,
            Codec::Bool => 1.0,
        }
    }

    /// Enum index (0 = default value)
    #[inline]
    pub fn get_enum(&self, flags: &[u32], direction: Direction) -> u16 {
        self.get_raw(flags, direction) as u16
    }

    pub fn set_enum(&self, flags: &mut [u32], direction: Direction, index: u16) -> Result<(), EvError> {
        let Codec::Enum { len } = self.codec else {
            return Err(self.kind_mismatch("enum"));
        };
        if index >= len {
            return Err(EvError::Range {
                id: self.id,
                value: index.to_string(),
                min: "0".into(),
                max: (len - 1).to_string(),
            });
        }
        write(self.range(direction), flags, index as u32);
        Ok(())
    }

    /// Any kind as a number: booleans are 0/1, enums their index
    #[inline]
    pub fn get_f64(&self, flags: &[u32], direction: Direction) -> f64 {
        match self.codec {
            Codec::Decimal { .. } => self.get_decimal(flags, direction),
            _ => self.get_raw(flags, direction) as f64,
        }
    }

    pub fn get(&self, flags: &[u32], direction: Direction) -> EvValue {
        match self.codec {
            Codec::Bool => EvValue::Bool(self.get_bool(flags, direction)),
            Codec::Int { .. } => EvValue::Int(self.get_int(flags, direction)),
            Codec::Decimal { .. } => EvValue::Decimal(self.get_decimal(flags, direction)),
            Codec::Enum { .. } => EvValue::Enum(self.get_enum(flags, direction)),
        }
    }

    pub fn set(&self, flags: &mut [u32], direction: Direction, value: EvValue) -> Result<(), EvError> {
        match value {
            EvValue::Bool(v) => self.set_bool(flags, direction, v),
            EvValue::Int(v) => self.set_int(flags, direction, v),
            EvValue::Decimal(v) => self.set_decimal(flags, direction, v),
            EvValue::Enum(v) => self.set_enum(flags, direction, v),
        }
    }

    /// Write the same value in both directions
    pub fn set_both(&self, flags: &mut [u32], value: EvValue) -> Result<(), EvError> {
        for direction in Direction::BOTH {
            self.set(flags, direction, value)?;
        }
        Ok(())
    }
}
