// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A value that may not be computable from static metadata.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Result of a static estimate: either a computed value or `Unknown`.
///
/// `Known(0)` means "computed as zero"; `Unknown` means the inputs needed to
/// compute it were missing. Serialized as the plain value or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Estimate<T> {
    Known(T),
    Unknown,
}

impl<T> Estimate<T> {
    /// Returns `true` if the value was computed.
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Converts into an `Option`.
    pub fn known(self) -> Option<T> {
        match self {
            Self::Known(v) => Some(v),
            Self::Unknown => None,
        }
    }

    /// Maps a known value, leaving `Unknown` untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Estimate<U> {
        match self {
            Self::Known(v) => Estimate::Known(f(v)),
            Self::Unknown => Estimate::Unknown,
        }
    }

    /// Returns the known value or `default`.
    pub fn unwrap_or(self, default: T) -> T {
        self.known().unwrap_or(default)
    }
}

impl<T> From<Option<T>> for Estimate<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Known(v),
            None => Self::Unknown,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Estimate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(v) => write!(f, "{v}"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl<T: Serialize> Serialize for Estimate<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(v) => serializer.serialize_some(v),
            Self::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Estimate<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}
