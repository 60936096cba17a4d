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

//! Data model: values, collections and the document navigator contract

pub mod json;
pub mod navigator;
pub mod temporal;
pub mod tree;
pub mod type_coercion;
pub mod value;

pub use navigator::{Navigator, Node};
pub use temporal::{PartialDateTime, PartialTime};
pub use tree::{DocumentTree, DocumentTreeBuilder, NodeId, TreeNavigator};
pub use type_coercion::{FromPrimitive, boolean_eval, coerce, coerce_value, single};
pub use value::{Collection, FhirPathValue, Primitive};
