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

//! Reading single typed values out of collections

use rust_decimal::Decimal;

use super::temporal::{PartialDateTime, PartialTime};
use super::value::{Collection, FhirPathValue, Primitive};
use crate::error::{FhirPathError, Result};

/// Types that can be read from a single primitive
pub trait FromPrimitive: Sized {
    /// FHIR type name used in error messages
    const TYPE_NAME: &'static str;

    /// Extract the value, `None` when the primitive has another type
    fn from_primitive(value: &Primitive) -> Option<Self>;
}

impl FromPrimitive for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn from_primitive(value: &Primitive) -> Option<Self> {
        value.as_boolean()
    }
}

impl FromPrimitive for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn from_primitive(value: &Primitive) -> Option<Self> {
        match value {
            Primitive::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

/// Integers widen to decimals
impl FromPrimitive for Decimal {
    const TYPE_NAME: &'static str = "decimal";

    fn from_primitive(value: &Primitive) -> Option<Self> {
        match value {
            Primitive::Decimal(d) => Some(*d),
            Primitive::Integer(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }
}

impl FromPrimitive for String {
    const TYPE_NAME: &'static str = "string";

    fn from_primitive(value: &Primitive) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

/// Document strings holding a date-time in literal form are read as one
impl FromPrimitive for PartialDateTime {
    const TYPE_NAME: &'static str = "dateTime";

    fn from_primitive(value: &Primitive) -> Option<Self> {
        value.as_date_time()
    }
}

impl FromPrimitive for PartialTime {
    const TYPE_NAME: &'static str = "time";

    fn from_primitive(value: &Primitive) -> Option<Self> {
        match value {
            Primitive::Time(t) => Some(t.clone()),
            _ => None,
        }
    }
}

/// The single item of `collection`, a cardinality error otherwise
pub fn single<'a>(collection: &'a Collection, requested: &str) -> Result<&'a FhirPathValue> {
    collection.single().ok_or_else(|| FhirPathError::Cardinality {
        requested: requested.to_string(),
        actual: collection.len(),
    })
}

/// Read a single value of type `T` from an item
pub fn coerce_value<T: FromPrimitive>(value: &FhirPathValue) -> Result<T> {
    value
        .value()
        .as_ref()
        .and_then(T::from_primitive)
        .ok_or_else(|| FhirPathError::conversion(T::TYPE_NAME, value.type_name()))
}

/// Read a single value of type `T` from a collection of exactly one item
pub fn coerce<T: FromPrimitive>(collection: &Collection) -> Result<T> {
    coerce_value(single(collection, T::TYPE_NAME)?)
}

/// Interpret a collection as a three-valued boolean
///
/// Empty is unknown. A single boolean-valued item is that boolean; any other
/// single item counts as `true`. More than one item is an error.
pub fn boolean_eval(collection: &Collection) -> Result<Option<bool>> {
    match collection.len() {
        0 => Ok(None),
        1 => {
            let value = single(collection, bool::TYPE_NAME)?;
            Ok(Some(
                value.value().and_then(|p| p.as_boolean()).unwrap_or(true),
            ))
        }
        n => Err(FhirPathError::Cardinality {
            requested: bool::TYPE_NAME.to_string(),
            actual: n,
        }),
    }
}
