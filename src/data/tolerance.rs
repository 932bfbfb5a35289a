use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::Channel;

/// Smallest accepted tolerance on any channel.
pub const MIN_TOLERANCE: f64 = 0.01;
/// Largest accepted tolerance on any channel.
pub const MAX_TOLERANCE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ValidationError {
    #[error("Δ{channel} tolerance must be a finite number, got {value}")]
    NonFinite { channel: Channel, value: f64 },

    #[error("Δ{channel} tolerance {value} is outside [{}, {}]", MIN_TOLERANCE, MAX_TOLERANCE)]
    OutOfRange { channel: Channel, value: f64 },
}

fn check(channel: Channel, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite { channel, value });
    }
    if !(MIN_TOLERANCE..=MAX_TOLERANCE).contains(&value) {
        return Err(ValidationError::OutOfRange { channel, value });
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// ToleranceSet
// ---------------------------------------------------------------------------

/// Maximum allowed span (max − min) per channel inside one group.
///
/// Every value lies in `[MIN_TOLERANCE, MAX_TOLERANCE]`; the only ways to
/// obtain a set are the validating constructors and deserialization, which
/// runs the same check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawToleranceSet")]
pub struct ToleranceSet {
    delta_l: f64,
    delta_a: f64,
    delta_b: f64,
}

#[derive(Deserialize)]
struct RawToleranceSet {
    delta_l: f64,
    delta_a: f64,
    delta_b: f64,
}

impl TryFrom<RawToleranceSet> for ToleranceSet {
    type Error = ValidationError;

    fn try_from(raw: RawToleranceSet) -> Result<Self, Self::Error> {
        ToleranceSet::new(raw.delta_l, raw.delta_a, raw.delta_b)
    }
}

impl Default for ToleranceSet {
    fn default() -> Self {
        ToleranceSet {
            delta_l: 0.15,
            delta_a: 0.08,
            delta_b: 0.10,
        }
    }
}

impl ToleranceSet {
    pub fn new(delta_l: f64, delta_a: f64, delta_b: f64) -> Result<Self, ValidationError> {
        Ok(ToleranceSet {
            delta_l: check(Channel::L, delta_l)?,
            delta_a: check(Channel::A, delta_a)?,
            delta_b: check(Channel::B, delta_b)?,
        })
    }

    /// Bypasses validation so tests can feed bad sets to consumers.
    #[cfg(test)]
    pub(crate) fn new_unchecked(delta_l: f64, delta_a: f64, delta_b: f64) -> Self {
        ToleranceSet {
            delta_l,
            delta_a,
            delta_b,
        }
    }

    pub fn delta_l(&self) -> f64 {
        self.delta_l
    }

    pub fn delta_a(&self) -> f64 {
        self.delta_a
    }

    pub fn delta_b(&self) -> f64 {
        self.delta_b
    }

    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::L => self.delta_l,
            Channel::A => self.delta_a,
            Channel::B => self.delta_b,
        }
    }

    /// Copy of this set with one channel replaced. Out-of-range values are
    /// rejected, never clamped.
    pub fn with(&self, channel: Channel, value: f64) -> Result<Self, ValidationError> {
        let value = check(channel, value)?;
        let mut next = *self;
        match channel {
            Channel::L => next.delta_l = value,
            Channel::A => next.delta_a = value,
            Channel::B => next.delta_b = value,
        }
        Ok(next)
    }

    /// Re-check the range invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for channel in Channel::ALL {
            check(channel, self.get(channel))?;
        }
        Ok(())
    }
}
