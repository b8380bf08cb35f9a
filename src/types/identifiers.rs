//! Identifier types for the TPMS telemetry simulator
//!
//! This module contains the vehicle identification number type, tenant name
//! generation, and the UUID-based run identifier used to correlate log output.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Characters allowed in a VIN (I, O and Q are excluded)
const VIN_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPRSTUVWXYZ0123456789";
const VIN_LETTERS: &[u8] = b"ABCDEFGHJKLMNPRSTUVWXYZ";
const VIN_YEAR_CODES: &[u8] = b"ABCDEFGHJKLMNPRSTVWXY123456789";
const VIN_CHECK_DIGITS: &[u8] = b"0123456789X";

/// Length of a valid VIN
pub const VIN_LENGTH: usize = 17;

/// A 17-character vehicle identification number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Vin(String);

impl Vin {
    /// Generate a VIN-shaped identifier from the given random stream
    ///
    /// Layout: manufacturer identifier (3), descriptor section (5), check
    /// digit (1), model year (1), plant code (1), sequential number (6).
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut vin = String::with_capacity(VIN_LENGTH);
        vin.push(rng.gen_range(b'1'..=b'9') as char);
        for _ in 0..2 {
            vin.push(pick(rng, VIN_LETTERS));
        }
        for _ in 0..5 {
            vin.push(pick(rng, VIN_ALPHABET));
        }
        vin.push(pick(rng, VIN_CHECK_DIGITS));
        vin.push(pick(rng, VIN_YEAR_CODES));
        vin.push(pick(rng, VIN_ALPHABET));
        for _ in 0..6 {
            vin.push(rng.gen_range(b'0'..=b'9') as char);
        }
        Self(vin)
    }

    /// Check whether a string is a well-formed VIN
    pub fn is_valid(candidate: &str) -> bool {
        candidate.len() == VIN_LENGTH && candidate.bytes().all(|b| VIN_ALPHABET.contains(&b))
    }

    /// Borrow the VIN as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8]) -> char {
    // Alphabets are non-empty constants
    *alphabet.choose(rng).unwrap_or(&b'0') as char
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Vin {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Vin {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if Vin::is_valid(&s) {
            Ok(Vin(s))
        } else {
            Err(serde::de::Error::custom(format!("invalid VIN: {}", s)))
        }
    }
}

/// Generate a tenant name of the form `test<10 digits>`
pub fn generate_tenant<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("test{}", rng.gen_range(1_000_000_000u64..=9_999_999_999u64))
}

/// Unique identifier for a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RUN_{}", self.0.simple())
    }
}
