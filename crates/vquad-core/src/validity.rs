//! Per-quad validity bit-vectors.
//!
//! Bit `i` records whether the quad held at version `i`. Vectors only ever
//! grow, one bit per commit, and every vector in a store has the same length
//! (the store width). The `'0'`/`'1'` string form, version 0 first, is the
//! persisted and display projection.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

const WORD_BITS: usize = u64::BITS as usize;

/// A growable bit-vector packed into 64-bit words.
///
/// Bits at positions `>= len` are always zero so that derived equality is
/// exact bit-for-bit equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Validity {
  words: Vec<u64>,
  len:   usize,
}

impl Validity {
  pub fn new() -> Self { Self::default() }

  /// An all-zero history of `len` versions.
  pub fn zeros(len: usize) -> Self {
    Self { words: vec![0; len.div_ceil(WORD_BITS)], len }
  }

  pub fn len(&self) -> usize { self.len }

  pub fn is_empty(&self) -> bool { self.len == 0 }

  pub fn get(&self, index: usize) -> Option<bool> {
    (index < self.len)
      .then(|| (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1)
  }

  /// The bit of the newest version, if any.
  pub fn last(&self) -> Option<bool> {
    self.len.checked_sub(1).and_then(|i| self.get(i))
  }

  /// # Panics
  ///
  /// Panics if `index >= self.len()`.
  pub fn set(&mut self, index: usize, bit: bool) {
    assert!(index < self.len, "bit {index} out of range for {}", self.len);
    let mask = 1u64 << (index % WORD_BITS);
    let word = &mut self.words[index / WORD_BITS];
    if bit {
      *word |= mask;
    } else {
      *word &= !mask;
    }
  }

  pub fn push(&mut self, bit: bool) {
    if self.len % WORD_BITS == 0 {
      self.words.push(0);
    }
    self.len += 1;
    self.set(self.len - 1, bit);
  }

  /// Record `bit` for `version`. The vector must hold either exactly
  /// `version` bits (it grows by one) or `version + 1` bits (the newest bit
  /// is overwritten, as when a batch touches the same quad twice).
  ///
  /// # Panics
  ///
  /// Panics if the vector length is neither `version` nor `version + 1`.
  pub fn record(&mut self, version: usize, bit: bool) {
    if self.len == version {
      self.push(bit);
    } else {
      assert_eq!(self.len, version + 1, "validity out of step with commit");
      self.set(version, bit);
    }
  }

  /// Extend by one bit equal to the newest one. An empty vector grows by a
  /// zero bit.
  pub fn carry_forward(&mut self) {
    let bit = self.last().unwrap_or(false);
    self.push(bit);
  }

  pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
    (0..self.len).map(|i| (self.words[i / WORD_BITS] >> (i % WORD_BITS)) & 1 == 1)
  }
}

impl fmt::Display for Validity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for bit in self.iter() {
      f.write_str(if bit { "1" } else { "0" })?;
    }
    Ok(())
  }
}

impl FromStr for Validity {
  type Err = Error;

  /// Parse a `'0'`/`'1'` string. Any other character is rejected with
  /// [`Error::InvalidPattern`]; length is checked by the caller against the
  /// store width.
  fn from_str(s: &str) -> Result<Self> {
    let mut validity = Self::new();
    for (i, c) in s.chars().enumerate() {
      match c {
        '0' => validity.push(false),
        '1' => validity.push(true),
        other => {
          return Err(Error::InvalidPattern(format!(
            "character {other:?} at position {i} is not 0 or 1"
          )));
        }
      }
    }
    Ok(validity)
  }
}

impl Serialize for Validity {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Validity {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let s = String::deserialize(d)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn push_and_get_across_word_boundary() {
    let mut v = Validity::new();
    for i in 0..130 {
      v.push(i % 3 == 0);
    }
    assert_eq!(v.len(), 130);
    assert_eq!(v.get(0), Some(true));
    assert_eq!(v.get(64), Some(false));
    assert_eq!(v.get(129), Some(true));
    assert_eq!(v.get(130), None);
  }

  #[test]
  fn parse_and_display() {
    let v: Validity = "1011".parse().unwrap();
    assert_eq!(v.len(), 4);
    assert_eq!(v.get(1), Some(false));
    assert_eq!(v.to_string(), "1011");
    assert!("".parse::<Validity>().unwrap().is_empty());
  }

  #[test]
  fn rejects_non_binary_characters() {
    let err = "10x1".parse::<Validity>().unwrap_err();
    assert!(matches!(err, Error::InvalidPattern(_)));
  }

  #[test]
  fn equality_is_exact() {
    let a: Validity = "101".parse().unwrap();
    let b: Validity = "1010".parse().unwrap();
    let mut c: Validity = "1011".parse().unwrap();
    assert_ne!(a, b);
    c.set(3, false);
    assert_eq!(b, c);
  }

  #[test]
  fn record_grows_then_overwrites() {
    let mut v: Validity = "1".parse().unwrap();
    v.record(1, false);
    assert_eq!(v.to_string(), "10");
    v.record(1, true);
    assert_eq!(v.to_string(), "11");
  }

  #[test]
  fn carry_forward_repeats_last_bit() {
    let mut v: Validity = "10".parse().unwrap();
    v.carry_forward();
    assert_eq!(v.to_string(), "100");
    let mut w = Validity::zeros(2);
    w.set(1, true);
    w.carry_forward();
    assert_eq!(w.to_string(), "011");
  }

  #[test]
  fn serde_uses_bit_string() {
    let v: Validity = "0110".parse().unwrap();
    let json = serde_json::to_string(&v).unwrap();
    assert_eq!(json, "\"0110\"");
    let back: Validity = serde_json::from_str(&json).unwrap();
    assert_eq!(back, v);
  }
}
