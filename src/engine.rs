// Copyright 2025 Nathan Hoos
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use regex::Regex;
use std::sync::{Mutex, MutexGuard};

/// Failures the engine can report while applying a compiled pattern.
///
/// Unit consistency: `required` and every capacity passed to
/// [`BoundPattern::replace_all`] are measured in bytes, the engine's
/// native text unit. The capacity estimate, the overflow signal, and the
/// reallocation size must never mix units.
#[derive(Debug, PartialEq, Eq)]
pub enum EngineError {
    /// The destination was too small. `required` is the exact capacity,
    /// in bytes, needed to hold the full result.
    BufferOverflow { required: usize },

    /// Any other application failure, carrying the engine's diagnostic.
    Replace(String),
}

/// The compilation half of the matching engine.
///
/// The engine is an opaque collaborator: this crate only ever compiles
/// pattern text into a handle and applies the handle. Production code uses
/// [`RegexEngine`]; tests substitute engines with scripted behavior.
pub trait ReplaceEngine {
    type Handle: PatternHandle;

    /// Compile `pattern` into an applyable handle. The error payload is
    /// the engine's diagnostic message for the offending pattern.
    fn compile(&self, pattern: &str) -> Result<Self::Handle, String>;
}

/// A compiled pattern with the engine's bind/apply/unbind call shape.
///
/// Binding returns an exclusive reservation of the handle: the handle is
/// held for the reservation's whole lifetime, so a bind/replace/unbind
/// sequence can never interleave with another thread's sequence on the
/// same shared handle. Dropping the reservation unbinds, leaving the
/// handle neutral for the next caller.
pub trait PatternHandle {
    type Bound<'a>: BoundPattern
    where
        Self: 'a;

    /// Reserve the handle with `subject` as its active text.
    fn bind(&self, subject: &str) -> Result<Self::Bound<'_>, EngineError>;
}

/// An exclusive reservation of a handle with a subject bound to it.
pub trait BoundPattern {
    /// Replace every match in the bound subject, writing into `dest` as if
    /// it had exactly `capacity` bytes available. Returns the written
    /// length in bytes on success; an undersized destination is reported
    /// as [`EngineError::BufferOverflow`] with the required capacity and
    /// `dest` is left unspecified.
    fn replace_all(
        &mut self,
        replacement: &str,
        dest: &mut String,
        capacity: usize,
    ) -> Result<usize, EngineError>;
}

/// Production engine backed by the `regex` crate.
pub struct RegexEngine;

/// A compiled `regex::Regex` plus the active-text slot for the subject
/// currently bound to it.
///
/// The slot's mutex is taken by [`PatternHandle::bind`] and held by the
/// returned reservation, so a handle shared across host threads serializes
/// whole bind/replace/unbind sequences, not just individual calls.
#[derive(Debug)]
pub struct RegexPattern {
    regex: Regex,
    bound: Mutex<Option<String>>,
}

/// Reservation of a [`RegexPattern`] for one replace call.
pub struct BoundRegexPattern<'a> {
    regex: &'a Regex,
    bound: MutexGuard<'a, Option<String>>,
}

impl ReplaceEngine for RegexEngine {
    type Handle = RegexPattern;

    fn compile(&self, pattern: &str) -> Result<RegexPattern, String> {
        let regex = Regex::new(pattern).map_err(|e| e.to_string())?;
        Ok(RegexPattern {
            regex,
            bound: Mutex::new(None),
        })
    }
}

impl RegexPattern {
    /// The pattern text this handle was compiled from.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl PatternHandle for RegexPattern {
    type Bound<'a> = BoundRegexPattern<'a>
    where
        Self: 'a;

    fn bind(&self, subject: &str) -> Result<BoundRegexPattern<'_>, EngineError> {
        let mut bound = self.bound.lock().unwrap();
        *bound = Some(subject.to_owned());
        Ok(BoundRegexPattern {
            regex: &self.regex,
            bound,
        })
    }
}

impl BoundPattern for BoundRegexPattern<'_> {
    fn replace_all(
        &mut self,
        replacement: &str,
        dest: &mut String,
        capacity: usize,
    ) -> Result<usize, EngineError> {
        let subject = self
            .bound
            .as_deref()
            .ok_or_else(|| EngineError::Replace("no subject text bound".to_owned()))?;

        let result = self.regex.replace_all(subject, replacement);
        if result.len() > capacity {
            return Err(EngineError::BufferOverflow {
                required: result.len(),
            });
        }

        dest.clear();
        dest.push_str(&result);
        Ok(result.len())
    }
}

impl Drop for BoundRegexPattern<'_> {
    fn drop(&mut self) {
        *self.bound = None;
    }
}
