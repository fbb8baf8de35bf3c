// ── Bitmask flag sets ──
//
// Remote bitmasks become sets of named flags. Bits with no name yet are
// kept in `unknown` so a FlagSet always converts back to the exact raw
// value it came from.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// A named bit in a remote bitmask.
pub trait Flag: Copy + Eq + fmt::Debug + 'static {
    const ALL: &'static [Self];

    fn bit(self) -> u32;
}

/// Named flags plus the raw bits nobody has named yet.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct FlagSet<F: Flag> {
    known: u32,
    unknown: u32,
    #[serde(skip)]
    _flag: PhantomData<F>,
}

impl<F: Flag> FlagSet<F> {
    pub const fn empty() -> Self {
        Self {
            known: 0,
            unknown: 0,
            _flag: PhantomData,
        }
    }

    pub fn from_bits(raw: u32) -> Self {
        let known_mask = F::ALL.iter().fold(0, |acc, f| acc | f.bit());
        Self {
            known: raw & known_mask,
            unknown: raw & !known_mask,
            _flag: PhantomData,
        }
    }

    /// The exact raw value, unknown bits included.
    pub fn bits(&self) -> u32 {
        self.known | self.unknown
    }

    /// Bits with no named flag.
    pub fn unknown_bits(&self) -> u32 {
        self.unknown
    }

    pub fn contains(&self, flag: F) -> bool {
        self.known & flag.bit() != 0
    }

    pub fn insert(&mut self, flag: F) {
        self.known |= flag.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.bits() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = F> + '_ {
        F::ALL.iter().copied().filter(|f| self.contains(*f))
    }
}

impl<F: Flag> Default for FlagSet<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: Flag> fmt::Debug for FlagSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        list.entries(self.iter());
        if self.unknown != 0 {
            list.entry(&format_args!("{:#x}", self.unknown));
        }
        list.finish()
    }
}

impl<F: Flag> FromIterator<F> for FlagSet<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        let mut set = Self::empty();
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}

/// Declare a flag enum and its bit assignments.
macro_rules! bit_flags {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident = $bit:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::model::flags::Flag for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn bit(self) -> u32 {
                match self {
                    $(Self::$variant => $bit),+
                }
            }
        }
    };
}

/// Declare a remote numeric enumeration with its wire codes.
///
/// Generates `from_code` (unrecognized codes yield `None`) and `code`.
macro_rules! coded_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident = $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
            ::strum::Display,
        )]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn code(self) -> u32 {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }
    };
}

pub(crate) use bit_flags;
pub(crate) use coded_enum;

#[cfg(test)]
mod tests {
    use super::*;

    bit_flags! {
        enum Sample {
            A = 0x1,
            B = 0x4,
        }
    }

    #[test]
    fn unknown_bits_pass_through() {
        let set = FlagSet::<Sample>::from_bits(0x1 | 0x4 | 0x100);
        assert!(set.contains(Sample::A));
        assert!(set.contains(Sample::B));
        assert_eq!(set.unknown_bits(), 0x100);
        assert_eq!(set.bits(), 0x105);
    }

    #[test]
    fn iter_yields_named_flags_only() {
        let set = FlagSet::<Sample>::from_bits(0x4 | 0x8);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Sample::B]);
    }

    #[test]
    fn collect_builds_known_bits() {
        let set: FlagSet<Sample> = [Sample::A, Sample::B].into_iter().collect();
        assert_eq!(set.bits(), 0x5);
        assert_eq!(set.unknown_bits(), 0);
    }

    #[test]
    fn empty_set() {
        assert!(FlagSet::<Sample>::from_bits(0).is_empty());
        assert!(!FlagSet::<Sample>::from_bits(0x200).is_empty());
    }
}
