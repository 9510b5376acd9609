// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::fmt;

macro_rules! table_handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u16);

        impl $name {
            pub const INVALID: Self = Self(u16::MAX);

            pub(crate) fn from_index(index: usize) -> Self {
                match u16::try_from(index) {
                    Ok(index) if index != u16::MAX => Self(index),
                    _ => Self::INVALID,
                }
            }

            pub(crate) fn index(self) -> Option<usize> {
                self.is_valid().then_some(usize::from(self.0))
            }

            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!($label, "#{}"), self.0)
                } else {
                    f.write_str(concat!($label, "#invalid"))
                }
            }
        }
    };
}

table_handle!(
    /// Index into the engine's source table.
    SourceHandle,
    "source"
);

table_handle!(
    /// Index into the engine's fixed voice pool.
    VoiceHandle,
    "voice"
);

/// Returned by callback receiver registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverHandle(pub(crate) usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles() {
        let handle = SourceHandle::from_index(3);
        assert!(handle.is_valid());
        assert_eq!(handle.index(), Some(3));
        assert_eq!(handle.to_string(), "source#3");

        assert!(!SourceHandle::default().is_valid());
        assert_eq!(SourceHandle::INVALID.index(), None);
        assert_eq!(SourceHandle::from_index(usize::from(u16::MAX)), SourceHandle::INVALID);
        assert_eq!(VoiceHandle::from_index(1 << 20), VoiceHandle::INVALID);
        assert_eq!(VoiceHandle::INVALID.to_string(), "voice#invalid");
    }
}
