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
mod environment;
pub mod cache;
pub mod engine;
pub mod error;
pub mod function;
pub mod replace;
mod bindings;

pub use crate::cache::{CacheStats, PatternCache};
pub use crate::engine::{
    BoundPattern, BoundRegexPattern, EngineError, PatternHandle, RegexEngine, RegexPattern,
    ReplaceEngine,
};
pub use crate::error::Error;
pub use crate::function::RegexReplace;
pub use crate::replace::replace_with_growth;

#[cfg(feature = "python_bindings")]
pub use crate::bindings::faster_replace;
