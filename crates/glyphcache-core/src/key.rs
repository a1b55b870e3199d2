//! Face identity: family name, fixed-point size and style flags

use std::borrow::Cow;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::fixed::Fixed;
use crate::style::StyleFlags;
use crate::table::TableKey;

/// Odd multiplier that spreads the fractional bits of the size
const SIZE_SCALE: u64 = 0x0000_0100_0000_01B3;

/// Identifies one Face: a font family at one size and style
///
/// Lookups build a key that borrows the family name; the cache stores an
/// owned clone (`FaceKey<'static>`) as the map key on insertion.
///
/// Equality, ordering and hashing are structural. An absent name sorts
/// before any present name; names compare by content, then sizes, then
/// flag bits.
#[derive(Debug, Clone)]
pub struct FaceKey<'a> {
    name: Option<Cow<'a, str>>,
    size: Fixed,
    flags: StyleFlags,
}

impl<'a> FaceKey<'a> {
    pub fn new(name: impl Into<Cow<'a, str>>, size: Fixed, flags: StyleFlags) -> Self {
        Self {
            name: Some(name.into()),
            size,
            flags,
        }
    }

    /// A key without a family name; resolves to the registry's default font
    pub fn unnamed(size: Fixed, flags: StyleFlags) -> Self {
        Self {
            name: None,
            size,
            flags,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn size(&self) -> Fixed {
        self.size
    }

    pub fn flags(&self) -> StyleFlags {
        self.flags
    }

    /// Same family and size, different style flags
    pub fn with_flags(&self, flags: StyleFlags) -> FaceKey<'a> {
        Self {
            name: self.name.clone(),
            size: self.size,
            flags,
        }
    }

    pub fn into_owned(self) -> FaceKey<'static> {
        FaceKey {
            name: self.name.map(|n| Cow::Owned(n.into_owned())),
            size: self.size,
            flags: self.flags,
        }
    }

    pub fn to_owned_key(&self) -> FaceKey<'static> {
        self.clone().into_owned()
    }

    /// Deterministic hash, stable across runs and platforms
    ///
    /// The name hash is rotated and mixed with the flag bits, then the
    /// scaled size is XORed in so that fractional sizes still differ.
    pub fn hash_value(&self) -> u64 {
        let name_hash = self.name.as_deref().map(string_hash).unwrap_or(0);
        let mut hash = name_hash.rotate_left(5) ^ u64::from(self.flags.bits());
        hash = hash.rotate_left(7);
        hash ^ (self.size.to_bits() as u32 as u64).wrapping_mul(SIZE_SCALE)
    }

    /// Total order: name (absent first), size, flags
    pub fn compare(&self, other: &FaceKey<'_>) -> Ordering {
        self.name
            .as_deref()
            .cmp(&other.name.as_deref())
            .then(self.size.cmp(&other.size))
            .then(self.flags.cmp(&other.flags))
    }
}

/// FNV-1a over the UTF-8 bytes
fn string_hash(s: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    s.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

impl PartialEq for FaceKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for FaceKey<'_> {}

impl PartialOrd for FaceKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FaceKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Hash for FaceKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_value());
    }
}

impl TableKey for FaceKey<'_> {
    fn table_hash(&self) -> u64 {
        self.hash_value()
    }

    fn table_cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}
