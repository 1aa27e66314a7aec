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

use thiserror::Error;

/// Errors surfaced to the host for one `transform(pattern, subject,
/// replacement)` call.
///
/// Everything here is reported synchronously at the point of failure and
/// nothing is retried, with one exception: an undersized destination buffer
/// is grown once to the engine-reported size before [`Error::BufferGrowthFailed`]
/// can be produced. An absent subject is not an error at all; it yields a
/// null result upstream.
#[derive(Debug, Error)]
pub enum Error {
    /// The pattern argument was absent.
    #[error("no regexp")]
    MissingPattern,

    /// The replacement argument was absent.
    #[error("no replacement string")]
    MissingReplacement,

    /// The pattern argument was present but empty. Rejected before any
    /// compilation is attempted.
    #[error("empty regexp")]
    EmptyPattern,

    /// The pattern is not a valid expression in the engine's grammar.
    /// Displayed as `<pattern>: <diagnostic>` so the host sees the
    /// offending text next to the engine's message. The cache is left
    /// untouched; the caller may retry with a corrected pattern.
    #[error("{pattern}: {message}")]
    Compile { pattern: String, message: String },

    /// The engine failed while applying a compiled pattern (not a
    /// capacity problem). Carries the engine diagnostic verbatim.
    #[error("{0}")]
    Replace(String),

    /// The engine reported an undersized destination twice in a row,
    /// despite the second attempt using its own reported required size.
    /// This indicates an engine inconsistency, not a sizing miss.
    #[error("replace destination still undersized after growing to the engine-reported length")]
    BufferGrowthFailed,

    /// The destination buffer could not be allocated. No partial state
    /// is left behind in the cache or the handle.
    #[error("out of memory")]
    OutOfMemory,
}
