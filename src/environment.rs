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

use once_cell::sync::Lazy;
use std::env;

/// Default number of compiled patterns a cache instance holds.
pub const DEFAULT_CACHE_SIZE: usize = 16;

/// Maximum number of compiled patterns to cache per registration.
///
/// # Environment Configuration
/// Set via `FASTER_REPLACE_CACHE_SIZE` environment variable.
///
/// # Default Behavior
/// - Default size: 16 patterns
/// - LRU eviction once full
///
/// Set the env var like so:
/// ```bash
/// export FASTER_REPLACE_CACHE_SIZE=[INTEGER]
/// ```
///
/// The working set of distinct patterns in a query workload is usually
/// tiny (the same pattern repeated over many rows), so the default stays
/// small. Values below 1 are ignored.
pub static PATTERN_CACHE_SIZE: Lazy<usize> = Lazy::new(|| {
    env::var("FASTER_REPLACE_CACHE_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n| n >= 1)
        .unwrap_or(DEFAULT_CACHE_SIZE)
});

/// Global flag to disable pattern caching.
///
/// # Environment Configuration
/// Set via `FASTER_REPLACE_DISABLE_CACHE` environment variable.
///
/// # Accepted Values
/// - Enable cache (default):
///   - Not set
///   - Empty string
///   - "0"
///   - "false"
///   - "no"
/// - Disable cache:
///   - "1"
///   - "true"
///   - "yes"
///   Case insensitive for all values
///
/// When disabled, every lookup compiles the pattern from scratch and
/// nothing is retained. Useful when debugging pattern compilation or
/// when memory is tighter than CPU.
pub static DISABLE_CACHE: Lazy<bool> =
    Lazy::new(|| match env::var("FASTER_REPLACE_DISABLE_CACHE") {
        Ok(val) => {
            let val_lower = val.to_lowercase();
            let is_disabled = val_lower == "1" || val_lower == "true" || val_lower == "yes";
            if is_disabled {
                tracing::info!("pattern caching disabled via FASTER_REPLACE_DISABLE_CACHE");
            }
            is_disabled
        }
        Err(_) => false,
    });
