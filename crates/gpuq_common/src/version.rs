//! Packed API version decoding.

use std::fmt;

/// API version decoded from the packed 32-bit form
/// `variant:3 | major:7 | minor:10 | patch:12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApiVersion {
    pub variant: u32,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ApiVersion {
    pub fn decode(raw: u32) -> Self {
        Self {
            variant: raw >> 29,
            major: (raw >> 22) & 0x7F,
            minor: (raw >> 12) & 0x3FF,
            patch: raw & 0xFFF,
        }
    }

    pub fn encode(&self) -> u32 {
        ((self.variant & 0x7) << 29) | ((self.major & 0x7F) << 22) | ((self.minor & 0x3FF) << 12) | (self.patch & 0xFFF)
    }

    /// Compare `(major, minor, patch)` against a floor; the variant is not considered.
    pub fn at_least(&self, major: u32, minor: u32, patch: u32) -> bool {
        (self.major, self.minor, self.patch) >= (major, minor, patch)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variant != 0 {
            write!(f, "{}:", self.variant)?;
        }
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
