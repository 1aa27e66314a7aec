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

use crate::cache::PatternCache;
use crate::engine::RegexEngine;
use crate::error::Error;
use crate::replace::replace_with_growth;

/// One registered `transform(pattern, subject, replacement)` function.
///
/// Hosts construct one value per function registration and drop it at
/// deregistration; the drop releases every compiled pattern still cached.
/// The value may be invoked concurrently from any number of host threads.
///
/// Argument absence follows SQL null semantics: an absent subject
/// propagates as an absent result, while an absent pattern or replacement
/// is an error for that call.
pub struct RegexReplace {
    cache: PatternCache<RegexEngine>,
}

impl RegexReplace {
    /// A registration with the environment-configured cache capacity.
    pub fn new() -> Self {
        Self {
            cache: PatternCache::new(RegexEngine),
        }
    }

    /// A registration caching at most `capacity` compiled patterns.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: PatternCache::with_capacity(RegexEngine, capacity),
        }
    }

    /// Apply one (pattern, subject, replacement) triple.
    pub fn invoke(
        &self,
        pattern: Option<&str>,
        subject: Option<&str>,
        replacement: Option<&str>,
    ) -> Result<Option<String>, Error> {
        let subject = match subject {
            Some(subject) => subject,
            // Null subject, null result. Checked before the other
            // arguments: a row with no text to transform is not an error
            // even when the pattern is also absent.
            None => return Ok(None),
        };
        let pattern = pattern.ok_or(Error::MissingPattern)?;
        let replacement = replacement.ok_or(Error::MissingReplacement)?;

        let handle = self.cache.lookup_or_compile(pattern)?;
        replace_with_growth(handle.as_ref(), subject, replacement).map(Some)
    }

    /// The registration's pattern cache, for introspection.
    pub fn cache(&self) -> &PatternCache<RegexEngine> {
        &self.cache
    }
}

impl Default for RegexReplace {
    fn default() -> Self {
        Self::new()
    }
}
