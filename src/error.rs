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

//! Error types for FluentPath parsing and evaluation
//!
//! Every failure is either a syntax error (malformed source text, detected while
//! compiling) or a semantic error (a well-formed expression that cannot be
//! evaluated). [`FhirPathError::kind`] tells the two apart.

use thiserror::Error;

/// Result type alias for FluentPath operations
pub type Result<T> = std::result::Result<T, FhirPathError>;

/// The two error families an expression can fail with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed source text
    Syntax,
    /// Evaluation-time failure of a well-formed expression
    Semantic,
}

/// Error type for FluentPath operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FhirPathError {
    /// Source text could not be parsed
    #[error("Syntax error at position {position}: {message}")]
    SyntaxError {
        /// Byte offset in the source where the error was detected
        position: usize,
        /// Human-readable error message
        message: String,
    },

    /// A `%name` constant that the evaluation host does not know
    #[error("Unknown constant '%{name}'")]
    UnknownConstant {
        /// Constant name without the `%` prefix
        name: String,
    },

    /// `%context` or `%resource` referenced while not bound
    #[error("Cannot resolve {axis}: {message}")]
    UnboundAxis {
        /// The axis that was referenced
        axis: String,
        /// Why it could not be resolved
        message: String,
    },

    /// No candidate signature accepts the runtime operand types
    #[error("Function '{function_name}' cannot be called {signature}")]
    NoMatchingSignature {
        /// Function or operator name
        function_name: String,
        /// Description of the runtime focus and parameter types
        signature: String,
    },

    /// More than one candidate signature matches equally well
    #[error("Call to '{function_name}' {signature} matches {candidates} signatures equally well")]
    AmbiguousSignature {
        /// Function or operator name
        function_name: String,
        /// Description of the runtime focus and parameter types
        signature: String,
        /// Number of equally specific candidates
        candidates: usize,
    },

    /// Function name not known to the symbol table nor to the evaluation host
    #[error("Unknown function '{function_name}'")]
    UnknownFunction {
        /// Name of the unknown function
        function_name: String,
    },

    /// Known function invoked with an unsupported number of parameters
    #[error("Function '{function_name}' does not accept {actual} parameter(s)")]
    InvalidArity {
        /// Name of the function
        function_name: String,
        /// Number of parameters supplied
        actual: usize,
    },

    /// A single value was required
    #[error("Expected a single {requested} value, got {actual} items")]
    Cardinality {
        /// What kind of value was requested
        requested: String,
        /// Number of items actually present
        actual: usize,
    },

    /// A value could not be read as the requested type
    #[error("Conversion error: cannot convert {actual} to {requested}")]
    ConversionError {
        /// Requested type name
        requested: String,
        /// Actual type name
        actual: String,
    },

    /// A fault raised while a function or operator body was running
    #[error("Invocation of '{function_name}' failed: {source}")]
    FunctionError {
        /// Name of the function or operator
        function_name: String,
        /// The underlying cause
        #[source]
        source: Box<FhirPathError>,
    },

    /// Any other evaluation failure
    #[error("Evaluation error: {message}")]
    EvaluationError {
        /// Human-readable message
        message: String,
    },
}

impl FhirPathError {
    /// Create a syntax error at the given byte offset
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::SyntaxError {
            position,
            message: message.into(),
        }
    }

    /// Create a generic evaluation error
    pub fn evaluation_error(message: impl Into<String>) -> Self {
        Self::EvaluationError {
            message: message.into(),
        }
    }

    /// Create a conversion error naming the requested and the actual type
    pub fn conversion(requested: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ConversionError {
            requested: requested.into(),
            actual: actual.into(),
        }
    }

    /// Wrap a fault raised inside the body of `function_name`
    pub fn in_function(function_name: impl Into<String>, source: FhirPathError) -> Self {
        Self::FunctionError {
            function_name: function_name.into(),
            source: Box::new(source),
        }
    }

    /// Classify this error as syntactic or semantic
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SyntaxError { .. } => ErrorKind::Syntax,
            _ => ErrorKind::Semantic,
        }
    }

    /// Check if this is a syntax error
    pub fn is_syntax(&self) -> bool {
        self.kind() == ErrorKind::Syntax
    }

    /// Check if this is a semantic error
    pub fn is_semantic(&self) -> bool {
        self.kind() == ErrorKind::Semantic
    }

    /// Follow `FunctionError` wrappers down to the original fault
    pub fn root_cause(&self) -> &FhirPathError {
        match self {
            Self::FunctionError { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_kinds() {
        assert!(FhirPathError::syntax(3, "unexpected ')'").is_syntax());
        assert!(FhirPathError::evaluation_error("boom").is_semantic());
        assert_eq!(
            FhirPathError::conversion("integer", "string").kind(),
            ErrorKind::Semantic
        );
    }

    #[test]
    fn test_function_error_chains_source() {
        let inner = FhirPathError::conversion("integer", "string");
        let outer = FhirPathError::in_function("skip", inner.clone());

        assert!(outer.to_string().contains("'skip'"));
        assert!(outer.to_string().contains("cannot convert string to integer"));
        assert!(outer.source().is_some());
        assert_eq!(outer.root_cause(), &inner);
    }
}
