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

//! Function and operator signatures for runtime overload resolution

use std::fmt;

use crate::model::{Collection, Primitive};

/// Declared type of a focus or parameter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// Any collection, including empty
    Collection,
    /// An unevaluated expression; the body evaluates it itself
    Lambda,
    /// Exactly one item of any type
    Value,
    /// Exactly one boolean
    Boolean,
    /// Exactly one integer
    Integer,
    /// Exactly one decimal; integers are accepted with lower priority
    Decimal,
    /// Exactly one string
    String,
    /// Exactly one date-time
    DateTime,
    /// Exactly one time
    Time,
}

impl ParamType {
    /// Whether the dispatcher must leave this slot unevaluated
    pub fn is_lazy(self) -> bool {
        self == Self::Lambda
    }

    /// How well `value` fits this slot, `None` when it does not fit at all
    ///
    /// Higher is more specific: an exact primitive type scores 3, an integer
    /// widened to decimal or a date-time string read as a date-time 2, a bare
    /// single value 1, collections and lambdas 0.
    pub fn fit(self, value: Option<&Collection>) -> Option<u8> {
        match self {
            Self::Collection | Self::Lambda => Some(0),
            Self::Value => value?.single().map(|_| 1),
            _ => {
                let primitive = value?.single()?.value()?;
                self.fit_primitive(&primitive)
            }
        }
    }

    fn fit_primitive(self, primitive: &Primitive) -> Option<u8> {
        match (self, primitive) {
            (Self::Boolean, Primitive::Boolean(_))
            | (Self::Integer, Primitive::Integer(_))
            | (Self::Decimal, Primitive::Decimal(_))
            | (Self::String, Primitive::String(_))
            | (Self::DateTime, Primitive::DateTime(_))
            | (Self::Time, Primitive::Time(_)) => Some(3),
            (Self::Decimal, Primitive::Integer(_)) => Some(2),
            (Self::DateTime, Primitive::String(_)) => primitive.as_date_time().map(|_| 2),
            _ => None,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Collection => "collection",
            Self::Lambda => "expression",
            Self::Value => "any",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::DateTime => "dateTime",
            Self::Time => "time",
        };
        f.write_str(name)
    }
}

/// Signature of one candidate implementation
///
/// Functions declare the type of their focus; operators have none and take
/// all operands as parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    /// Focus type, `None` for operators
    pub focus: Option<ParamType>,
    /// Parameter types in call order
    pub parameters: Vec<ParamType>,
}

impl Signature {
    /// Create a function signature
    pub fn function(focus: ParamType, parameters: &[ParamType]) -> Self {
        Self {
            focus: Some(focus),
            parameters: parameters.to_vec(),
        }
    }

    /// Create an operator signature
    pub fn operator(operands: &[ParamType]) -> Self {
        Self {
            focus: None,
            parameters: operands.to_vec(),
        }
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Total fit of the runtime arguments, `None` if any slot does not fit
    ///
    /// `parameters` holds `None` for lazy slots the dispatcher did not
    /// evaluate.
    pub fn score(&self, focus: Option<&Collection>, parameters: &[Option<Collection>]) -> Option<u32> {
        if parameters.len() != self.parameters.len() {
            return None;
        }
        let mut total = 0u32;
        if let Some(focus_type) = self.focus {
            total += u32::from(focus_type.fit(focus)?);
        }
        for (declared, actual) in self.parameters.iter().zip(parameters) {
            total += u32::from(declared.fit(actual.as_ref())?);
        }
        Some(total)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ")")?;
        if let Some(focus) = self.focus {
            write!(f, " on {focus}")?;
        }
        Ok(())
    }
}
