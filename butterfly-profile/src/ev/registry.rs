//! Encoded value registry - bit layout assignment
//!
//! Mutable only while the graph is being built. After [`Registry::finalize`] it is
//! read-only and can be shared (`Arc<Registry>`) by any number of parsers and
//! evaluators.

use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};

use super::{EvDescriptor, EvError, EvKind, WORD_BITS};

/// A contiguous bit range inside one flags word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitRange {
    pub word: u32,
    pub shift: u8,
    pub bits: u8,
}

impl BitRange {
    /// Absolute bit offset within the edge's flags
    pub fn offset(&self) -> u32 {
        self.word * WORD_BITS + self.shift as u32
    }

    pub fn mask(&self) -> u32 {
        if self.bits as u32 >= WORD_BITS {
            u32::MAX
        } else {
            (1u32 << self.bits) - 1
        }
    }

    /// True if the two ranges share at least one bit
    pub fn overlaps(&self, other: &BitRange) -> bool {
        let (a0, b0) = (self.offset(), other.offset());
        let (a1, b1) = (a0 + self.bits as u32, b0 + other.bits as u32);
        a0 < b1 && b0 < a1
    }
}

/// How raw bits map to a value; copied into every handle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Codec {
    Bool,
    Int {
        max: u32,
    },
    Decimal {
        factor: f64,
        /// Raw value that decodes to zero
        offset: i64,
        max_raw: u32,
        max_is_infinity: bool,
    },
    Enum {
        len: u16,
    },
}

impl Codec {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Codec::Bool => "boolean",
            Codec::Int { .. } => "integer",
            Codec::Decimal { .. } => "decimal",
            Codec::Enum { .. } => "enum",
        }
    }
}

/// Self-contained reference to one encoded value
///
/// Copy-able and lookup-free: compiled custom models store these directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvHandle {
    pub(crate) id: u16,
    pub(crate) fwd: BitRange,
    pub(crate) bwd: Option<BitRange>,
    pub(crate) codec: Codec,
}

impl EvHandle {
    /// Declaration index inside the registry
    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn is_directional(&self) -> bool {
        self.bwd.is_some()
    }

    pub fn forward_range(&self) -> BitRange {
        self.fwd
    }

    pub fn backward_range(&self) -> Option<BitRange> {
        self.bwd
    }

    /// All bit ranges owned by this value
    pub fn ranges(&self) -> impl Iterator<Item = BitRange> {
        std::iter::once(self.fwd).chain(self.bwd)
    }

    /// True if `flags` is long enough to hold this value
    pub fn fits(&self, flags: &[u32]) -> bool {
        self.ranges().all(|r| (r.word as usize) < flags.len())
    }
}

#[derive(Debug, Clone)]
struct Entry {
    descriptor: EvDescriptor,
    handle: EvHandle,
}

/// Assigns every encoded value a bit range in the per-edge flags
#[derive(Debug, Clone)]
pub struct Registry {
    words: usize,
    /// Bits already taken at the low end of each word
    used: Vec<u32>,
    entries: Vec<Entry>,
    by_name: FxHashMap<String, usize>,
    finalized: bool,
}

impl Registry {
    /// Create an empty registry for `words` flags words per edge
    pub fn new(words: usize) -> Self {
        Self {
            words,
            used: vec![0; words],
            entries: Vec::new(),
            by_name: FxHashMap::default(),
            finalized: false,
        }
    }

    /// Number of `u32` words each edge needs
    pub fn words_per_edge(&self) -> usize {
        self.words
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Declare an encoded value and assign its bits
    ///
    /// Placement is first-fit: each range goes to the lowest-indexed word with enough
    /// free bits left.
    pub fn declare(&mut self, descriptor: EvDescriptor) -> Result<EvHandle, EvError> {
        if self.finalized {
            return Err(EvError::RegistryClosed(descriptor.name));
        }
        if self.by_name.contains_key(&descriptor.name) {
            return Err(EvError::DuplicateName(descriptor.name));
        }
        let codec = validate(&descriptor)?;
        let bits = descriptor.kind.bits();

        // Reserve on a scratch copy so a failed backward range leaves no trace.
        let mut used = self.used.clone();
        let fwd = place(&mut used, bits).ok_or_else(|| self.layout_error(&descriptor))?;
        let bwd = if descriptor.directional {
            Some(place(&mut used, bits).ok_or_else(|| self.layout_error(&descriptor))?)
        } else {
            None
        };
        self.used = used;

        let id = self.entries.len() as u16;
        let handle = EvHandle {
            id,
            fwd,
            bwd,
            codec,
        };

        tracing::debug!(
            name = descriptor.name.as_str(),
            offset = fwd.offset(),
            bits,
            directional = descriptor.directional,
            "declared encoded value"
        );

        self.by_name.insert(descriptor.name.clone(), self.entries.len());
        self.entries.push(Entry { descriptor, handle });
        Ok(handle)
    }

    fn layout_error(&self, descriptor: &EvDescriptor) -> EvError {
        EvError::Layout {
            name: descriptor.name.clone(),
            bits: descriptor.kind.bits(),
            words: self.words,
        }
    }

    /// Close the registry; further declarations fail with `RegistryClosed`
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    /// Look up a handle by name
    pub fn resolve(&self, name: &str) -> Result<EvHandle, EvError> {
        match self.by_name.get(name) {
            Some(&i) => Ok(self.entries[i].handle),
            None => Err(EvError::UnknownAttribute {
                name: name.to_string(),
                suggestion: butterfly_common::suggest_correction(name, self.names()),
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn descriptor(&self, handle: &EvHandle) -> &EvDescriptor {
        &self.entries[handle.id as usize].descriptor
    }

    pub fn name_of(&self, handle: &EvHandle) -> &str {
        &self.descriptor(handle).name
    }

    /// Declared names of an enum value, in index order
    pub fn enum_values(&self, handle: &EvHandle) -> Option<&[String]> {
        match &self.descriptor(handle).kind {
            EvKind::Enum { values } => Some(values),
            _ => None,
        }
    }

    /// Index of an enum name (ASCII case-insensitive)
    pub fn enum_index(&self, handle: &EvHandle, value: &str) -> Option<u16> {
        self.enum_values(handle)?
            .iter()
            .position(|v| v.eq_ignore_ascii_case(value))
            .map(|i| i as u16)
    }

    /// Names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.descriptor.name.as_str())
    }

    /// Handles in declaration order
    pub fn handles(&self) -> impl Iterator<Item = EvHandle> + '_ {
        self.entries.iter().map(|e| e.handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bits assigned so far
    pub fn used_bits(&self) -> u32 {
        self.used.iter().sum()
    }

    /// Hash of the complete layout (names, kinds, ranges)
    ///
    /// Compiled models remember the fingerprint of the registry they were compiled
    /// against; two registries with equal fingerprints are layout-compatible.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.words.hash(&mut hasher);
        for entry in &self.entries {
            entry.descriptor.name.hash(&mut hasher);
            entry.descriptor.kind.name().hash(&mut hasher);
            if let EvKind::Enum { values } = &entry.descriptor.kind {
                values.hash(&mut hasher);
            }
            for range in entry.handle.ranges() {
                range.hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

fn place(used: &mut [u32], bits: u32) -> Option<BitRange> {
    let (word, taken) = used
        .iter_mut()
        .enumerate()
        .find(|(_, taken)| WORD_BITS - **taken >= bits)?;
    let range = BitRange {
        word: word as u32,
        shift: *taken as u8,
        bits: bits as u8,
    };
    *taken += bits;
    Some(range)
}

fn validate(descriptor: &EvDescriptor) -> Result<Codec, EvError> {
    let invalid = |reason: &str| EvError::InvalidDeclaration {
        name: descriptor.name.clone(),
        reason: reason.to_string(),
    };
    if descriptor.name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    let bits = descriptor.kind.bits();
    if bits == 0 || bits > WORD_BITS {
        return Err(invalid("width must be between 1 and 32 bits"));
    }
    let max_raw = if bits == WORD_BITS {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    };

    Ok(match &descriptor.kind {
        EvKind::Bool => Codec::Bool,
        EvKind::Int { .. } => Codec::Int { max: max_raw },
        EvKind::Decimal {
            factor,
            signed,
            max_is_infinity,
            ..
        } => {
            if !factor.is_finite() || *factor <= 0.0 {
                return Err(invalid("decimal factor must be a positive number"));
            }
            Codec::Decimal {
                factor: *factor,
                offset: if *signed { 1i64 << (bits - 1) } else { 0 },
                max_raw,
                max_is_infinity: *max_is_infinity,
            }
        }
        EvKind::Enum { values } => {
            if values.is_empty() {
                return Err(invalid("enum needs at least one value"));
            }
            if values.len() > u16::MAX as usize {
                return Err(invalid("enum has too many values"));
            }
            Codec::Enum {
                len: values.len() as u16,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(registry: &mut Registry) -> Vec<EvHandle> {
        vec![
            registry
                .declare(EvDescriptor::enumeration("road_class", ["OTHER", "MOTORWAY", "TRACK"]))
                .unwrap(),
            registry.declare(EvDescriptor::boolean("road_class_link")).unwrap(),
            registry
                .declare(EvDescriptor::decimal("max_speed", 7, 2.0).directional().max_is_infinity())
                .unwrap(),
            registry.declare(EvDescriptor::int("hike_rating", 3)).unwrap(),
            registry
                .declare(EvDescriptor::decimal("car_average_speed", 5, 5.0).directional())
                .unwrap(),
        ]
    }

    #[test]
    fn test_first_fit_offsets() {
        let mut registry = Registry::new(2);
        let h = sample(&mut registry);
        assert_eq!(h[0].forward_range().offset(), 0);
        assert_eq!(h[1].forward_range().offset(), 2);
        assert_eq!(h[2].forward_range().offset(), 3);
        assert_eq!(h[2].backward_range().map(|r| r.offset()), Some(10));
        assert_eq!(h[3].forward_range().offset(), 17);
        // 20 bits used in word 0, 5 + 5 still fit
        assert_eq!(h[4].forward_range().offset(), 20);
        assert_eq!(h[4].backward_range().map(|r| r.offset()), Some(25));
        assert_eq!(registry.used_bits(), 30);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let mut a = Registry::new(2);
        let mut b = Registry::new(2);
        assert_eq!(sample(&mut a), sample(&mut b));
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_value_never_straddles_words() {
        let mut registry = Registry::new(2);
        registry.declare(EvDescriptor::int("a", 30)).unwrap();
        let b = registry.declare(EvDescriptor::int("b", 4)).unwrap();
        assert_eq!(b.forward_range().word, 1);
        assert_eq!(b.forward_range().shift, 0);
        // first fit goes back to word 0 for a 2-bit value
        let c = registry.declare(EvDescriptor::int("c", 2)).unwrap();
        assert_eq!(c.forward_range().word, 0);
        assert_eq!(c.forward_range().shift, 30);
    }

    #[test]
    fn test_layout_overflow() {
        let mut registry = Registry::new(1);
        registry.declare(EvDescriptor::int("a", 20)).unwrap();
        let err = registry.declare(EvDescriptor::int("b", 13)).unwrap_err();
        assert!(matches!(err, EvError::Layout { bits: 13, .. }));
        // a failed declaration does not consume space
        registry.declare(EvDescriptor::int("c", 12)).unwrap();
        assert_eq!(registry.used_bits(), 32);
    }

    #[test]
    fn test_directional_overflow_leaves_no_trace() {
        let mut registry = Registry::new(1);
        registry.declare(EvDescriptor::int("a", 20)).unwrap();
        let err = registry
            .declare(EvDescriptor::decimal("speed", 8, 1.0).directional())
            .unwrap_err();
        assert!(matches!(err, EvError::Layout { .. }));
        assert_eq!(registry.used_bits(), 20);
        assert!(!registry.contains("speed"));
    }

    #[test]
    fn test_duplicate_and_closed() {
        let mut registry = Registry::new(1);
        registry.declare(EvDescriptor::boolean("toll")).unwrap();
        assert_eq!(
            registry.declare(EvDescriptor::boolean("toll")).unwrap_err(),
            EvError::DuplicateName("toll".into())
        );
        registry.finalize();
        assert_eq!(
            registry.declare(EvDescriptor::boolean("ferry")).unwrap_err(),
            EvError::RegistryClosed("ferry".into())
        );
    }

    #[test]
    fn test_invalid_declarations() {
        let mut registry = Registry::new(2);
        assert!(matches!(
            registry.declare(EvDescriptor::int("wide", 33)),
            Err(EvError::InvalidDeclaration { .. })
        ));
        assert!(matches!(
            registry.declare(EvDescriptor::decimal("zero", 4, 0.0)),
            Err(EvError::InvalidDeclaration { .. })
        ));
        assert!(matches!(
            registry.declare(EvDescriptor::enumeration("empty", Vec::<String>::new())),
            Err(EvError::InvalidDeclaration { .. })
        ));
        let full = registry.declare(EvDescriptor::int("full", 32)).unwrap();
        assert_eq!(full.forward_range().mask(), u32::MAX);
    }

    #[test]
    fn test_resolve_suggests() {
        let mut registry = Registry::new(2);
        sample(&mut registry);
        let h = registry.resolve("hike_rating").unwrap();
        assert_eq!(registry.name_of(&h), "hike_rating");
        match registry.resolve("road_clas").unwrap_err() {
            EvError::UnknownAttribute { name, suggestion } => {
                assert_eq!(name, "road_clas");
                assert_eq!(suggestion.as_deref(), Some("road_class"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_no_overlap_between_handles() {
        let mut registry = Registry::new(2);
        sample(&mut registry);
        let ranges: Vec<BitRange> = registry.handles().flat_map(|h| h.ranges()).collect();
        for (i, a) in ranges.iter().enumerate() {
            for b in &ranges[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_enum_index_case_insensitive() {
        let mut registry = Registry::new(1);
        let h = registry
            .declare(EvDescriptor::enumeration("road_class", ["OTHER", "MOTORWAY", "TRACK"]))
            .unwrap();
        assert_eq!(registry.enum_index(&h, "TRACK"), Some(2));
        assert_eq!(registry.enum_index(&h, "track"), Some(2));
        assert_eq!(registry.enum_index(&h, "FERRY"), None);
    }
}
