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

use crate::engine::{BoundPattern, EngineError, PatternHandle};
use crate::error::Error;
use tracing::error;

/// Replace every match of `handle` in `subject`, sizing the destination
/// buffer with at most one growth retry.
///
/// The initial capacity guess is the subject's byte length, falling back
/// to the replacement's byte length when the subject is empty (an empty
/// subject can still produce output when the pattern matches the empty
/// string). Most replacements do not drastically expand the output, so
/// this trades a possible one-time retry for never speculatively
/// over-allocating.
///
/// When the engine reports the destination undersized, the buffer is
/// grown to exactly the size the engine reported and the replacement runs
/// once more. A second undersize report means the engine's own numbers
/// cannot be trusted and fails the call; there is no growth loop.
///
/// Binding reserves the handle exclusively for the duration of the call;
/// the reservation is released on every exit path, success or failure,
/// so the handle always comes back neutral for the next caller.
pub fn replace_with_growth<H: PatternHandle>(
    handle: &H,
    subject: &str,
    replacement: &str,
) -> Result<String, Error> {
    // Nothing to match against and nothing to write: the result is the
    // empty text, engine not invoked.
    if subject.is_empty() && replacement.is_empty() {
        return Ok(String::new());
    }

    let mut bound = match handle.bind(subject) {
        Ok(bound) => bound,
        Err(err) => return Err(surface(err)),
    };

    // The reservation unbinds when it goes out of scope, on the error
    // paths as much as on success.
    grow_and_replace(&mut bound, subject, replacement)
}

fn grow_and_replace<B: BoundPattern>(
    bound: &mut B,
    subject: &str,
    replacement: &str,
) -> Result<String, Error> {
    let guess = if subject.is_empty() {
        replacement.len()
    } else {
        subject.len()
    };

    let mut dest = String::new();
    dest.try_reserve(guess).map_err(|_| Error::OutOfMemory)?;

    match bound.replace_all(replacement, &mut dest, guess) {
        Ok(_) => {
            dest.shrink_to_fit();
            Ok(dest)
        }
        Err(EngineError::BufferOverflow { required }) => {
            // The engine reported exactly how much it needs; grow once.
            let mut dest = String::new();
            dest.try_reserve(required).map_err(|_| Error::OutOfMemory)?;

            match bound.replace_all(replacement, &mut dest, required) {
                Ok(_) => {
                    dest.shrink_to_fit();
                    Ok(dest)
                }
                Err(err) => Err(surface(err)),
            }
        }
        Err(err @ EngineError::Replace(_)) => Err(surface(err)),
    }
}

/// Map a terminal engine failure onto the host-facing taxonomy. An
/// overflow only reaches here on the second attempt, where it signals an
/// engine inconsistency rather than a sizing miss.
fn surface(err: EngineError) -> Error {
    match err {
        EngineError::BufferOverflow { required } => {
            error!(
                required,
                "replace destination still undersized after growing to the engine-reported length"
            );
            Error::BufferGrowthFailed
        }
        EngineError::Replace(message) => Error::Replace(message),
    }
}
