// Copyright 2024 OctoFHIR Team
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

//! Evaluation configuration
//!
//! Knobs that change how an expression is evaluated without changing what it
//! means for well-behaved inputs.

/// Default depth limit for `descendants()`
pub const DEFAULT_MAX_DESCENDANT_DEPTH: usize = 256;

/// Default compiled-size limit for `matches()` patterns (1 MiB)
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Evaluation configuration
///
/// # Examples
///
/// ```rust
/// use octofhir_fluentpath::evaluator::EvaluationConfig;
///
/// // Use default configuration
/// let config = EvaluationConfig::default();
/// assert!(config.type_prefix_matching);
///
/// // Or use builder pattern methods
/// let config = EvaluationConfig::default()
///     .with_type_prefix_matching(false)
///     .with_max_descendant_depth(32);
/// assert_eq!(config.max_descendant_depth, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationConfig {
    /// Let a path step whose name starts with an uppercase letter match the
    /// type of the focus itself, so `Patient.name` works on a Patient root.
    /// Default: true
    pub type_prefix_matching: bool,

    /// Maximum depth `descendants()` walks before failing. Default: 256
    pub max_descendant_depth: usize,

    /// Compiled-size limit for regular expressions used by `matches()`.
    /// Default: 1 MiB
    pub regex_size_limit: usize,
}

impl EvaluationConfig {
    /// Create new configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable type-name matching on the first path step
    pub fn with_type_prefix_matching(mut self, enabled: bool) -> Self {
        self.type_prefix_matching = enabled;
        self
    }

    /// Set the depth limit for `descendants()`
    ///
    /// # Arguments
    /// * `depth` - Maximum number of levels below the focus
    pub fn with_max_descendant_depth(mut self, depth: usize) -> Self {
        self.max_descendant_depth = depth;
        self
    }

    /// Set the compiled-size limit for `matches()` patterns
    ///
    /// # Arguments
    /// * `bytes` - Limit handed to the regex builder
    pub fn with_regex_size_limit(mut self, bytes: usize) -> Self {
        self.regex_size_limit = bytes;
        self
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            type_prefix_matching: true,
            max_descendant_depth: DEFAULT_MAX_DESCENDANT_DEPTH,
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
        }
    }
}
