//! Integrity checks over a byte stream. The check type is a 3-bit ID, so there
//! are eight slots. Some of them are reserved for future algorithms, and the
//! others may be compiled out with cargo features. The dispatch logic is the
//! same in every configuration; only the capability table changes.

use sha2_support::*;

use crate::error::Error;

#[cfg(feature = "check-crc64")]
pub mod crc64;

/// The largest valid check ID.
pub const CHECK_ID_MAX: u32 = 7;

/// Size of the digest of each check type in bytes, indexed by check ID.
/// The sizes of the reserved slots are part of the container format, so they
/// are listed even though no algorithm uses them yet.
pub const CHECK_SIZES: [u32; 8] = [0, 4, 4, 8, 16, 32, 32, 64];

/// Which check types were compiled in, indexed by check ID.
pub const AVAILABLE_CHECKS: [bool; 8] = [
    true,
    cfg!(feature = "check-crc32"),
    false,
    cfg!(feature = "check-crc64"),
    false,
    cfg!(feature = "check-sha256"),
    false,
    false,
];

/// The check types. The discriminant is the ID that is stored in the stream.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckType {
    None = 0,
    Crc32 = 1,
    Reserved2 = 2,
    Crc64 = 3,
    Reserved4 = 4,
    Sha256 = 5,
    Reserved6 = 6,
    Reserved7 = 7,
}

impl CheckType {
    /// All of the slots, in ID order.
    pub const ALL: [CheckType; 8] = [
        CheckType::None,
        CheckType::Crc32,
        CheckType::Reserved2,
        CheckType::Crc64,
        CheckType::Reserved4,
        CheckType::Sha256,
        CheckType::Reserved6,
        CheckType::Reserved7,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for CheckType {
    type Error = Error;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match CheckType::ALL.get(id as usize) {
            Some(kind) if id <= CHECK_ID_MAX => Ok(*kind),
            _ => Err(Error::Program("check ID out of range")),
        }
    }
}

/// Returns the digest size in bytes of the check type 'kind'. Defined for all
/// eight slots regardless of which algorithms were compiled in.
pub fn digest_size(kind: CheckType) -> u32 {
    CHECK_SIZES[kind as usize]
}

/// Returns true if 'kind' was compiled in and can be used with
/// [`Check::new`].
pub fn is_available(kind: CheckType) -> bool {
    AVAILABLE_CHECKS[kind as usize]
}

/// Returns the list of check types that were compiled in.
pub fn available_checks() -> Vec<CheckType> {
    CheckType::ALL
        .into_iter()
        .filter(|kind| is_available(*kind))
        .collect()
}

#[cfg(feature = "check-sha256")]
mod sha2_support {
    pub use sha2::{Digest, Sha256};

    /// A SHA-256 computation, or its result once it was finished.
    #[derive(Clone)]
    pub enum Sha256State {
        Running(Sha256),
        Finished([u8; 32]),
    }

    /// Pad, run the last compression and return the hash.
    pub fn finalize(hasher: Sha256) -> [u8; 32] {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        digest
    }
}

#[cfg(not(feature = "check-sha256"))]
mod sha2_support {}

/// The running state of an integrity check. Each variant carries the state of
/// its own algorithm, so the state always matches the check type.
#[derive(Clone)]
pub enum Check {
    None,
    /// The CRC of the bytes so far.
    #[cfg(feature = "check-crc32")]
    Crc32(u32),
    /// The CRC of the bytes so far.
    #[cfg(feature = "check-crc64")]
    Crc64(u64),
    #[cfg(feature = "check-sha256")]
    Sha256(Sha256State),
}

impl Check {
    /// Start a new check of type 'kind'.
    pub fn new(kind: CheckType) -> Result<Self, Error> {
        match kind {
            CheckType::None => Ok(Check::None),
            #[cfg(feature = "check-crc32")]
            CheckType::Crc32 => Ok(Check::Crc32(0)),
            #[cfg(feature = "check-crc64")]
            CheckType::Crc64 => Ok(Check::Crc64(0)),
            #[cfg(feature = "check-sha256")]
            CheckType::Sha256 => {
                Ok(Check::Sha256(Sha256State::Running(Sha256::new())))
            }
            _ => {
                log::debug!("Check {:?} is not supported", kind);
                Err(Error::UnsupportedCheck)
            }
        }
    }

    /// Start a new check from the raw ID that is stored in the stream.
    pub fn from_id(id: u32) -> Result<Self, Error> {
        Self::new(CheckType::try_from(id)?)
    }

    /// The type of this check.
    pub fn kind(&self) -> CheckType {
        match self {
            Check::None => CheckType::None,
            #[cfg(feature = "check-crc32")]
            Check::Crc32(_) => CheckType::Crc32,
            #[cfg(feature = "check-crc64")]
            Check::Crc64(_) => CheckType::Crc64,
            #[cfg(feature = "check-sha256")]
            Check::Sha256(_) => CheckType::Sha256,
        }
    }

    /// Add 'buf' to the checked data. The result does not depend on how the
    /// data is split between calls.
    pub fn update(&mut self, buf: &[u8]) {
        match self {
            Check::None => {}
            #[cfg(feature = "check-crc32")]
            Check::Crc32(crc) => {
                let mut hasher = crc32fast::Hasher::new_with_initial(*crc);
                hasher.update(buf);
                *crc = hasher.finalize();
            }
            #[cfg(feature = "check-crc64")]
            Check::Crc64(crc) => *crc = crc64::crc64(buf, *crc),
            #[cfg(feature = "check-sha256")]
            Check::Sha256(Sha256State::Running(hasher)) => {
                Digest::update(hasher, buf)
            }
            #[cfg(feature = "check-sha256")]
            Check::Sha256(Sha256State::Finished(_)) => {
                log::warn!("Ignoring update of a finished SHA-256 check");
            }
        }
    }

    /// Finish the computation. Only SHA-256 has a finishing step; the CRCs
    /// are complete after every update. Calling this twice is harmless.
    pub fn finish(&mut self) {
        #[cfg(feature = "check-sha256")]
        {
            if let Check::Sha256(state) = self {
                let empty = Sha256State::Finished([0; 32]);
                *state = match std::mem::replace(state, empty) {
                    Sha256State::Running(hasher) => {
                        Sha256State::Finished(finalize(hasher))
                    }
                    finished => finished,
                };
            }
        }
    }

    /// Returns the digest. CRCs are stored little endian, as they appear in
    /// the container. A SHA-256 digest that was not finished yet is computed
    /// from a copy of the state, which is left untouched.
    pub fn digest(&self) -> Vec<u8> {
        match self {
            Check::None => Vec::new(),
            #[cfg(feature = "check-crc32")]
            Check::Crc32(crc) => crc.to_le_bytes().to_vec(),
            #[cfg(feature = "check-crc64")]
            Check::Crc64(crc) => crc.to_le_bytes().to_vec(),
            #[cfg(feature = "check-sha256")]
            Check::Sha256(Sha256State::Running(hasher)) => {
                finalize(hasher.clone()).to_vec()
            }
            #[cfg(feature = "check-sha256")]
            Check::Sha256(Sha256State::Finished(digest)) => digest.to_vec(),
        }
    }

    /// Returns true if the digest matches 'expected'.
    pub fn verify(&self, expected: &[u8]) -> bool {
        self.digest() == expected
    }

    #[cfg(feature = "check-crc32")]
    pub fn crc32(&self) -> Option<u32> {
        match self {
            Check::Crc32(crc) => Some(*crc),
            _ => None,
        }
    }

    #[cfg(feature = "check-crc64")]
    pub fn crc64(&self) -> Option<u64> {
        match self {
            Check::Crc64(crc) => Some(*crc),
            _ => None,
        }
    }
}

/// Compute the digest of 'buf' in one go.
pub fn checksum(kind: CheckType, buf: &[u8]) -> Result<Vec<u8>, Error> {
    let mut check = Check::new(kind)?;
    check.update(buf);
    check.finish();
    Ok(check.digest())
}
