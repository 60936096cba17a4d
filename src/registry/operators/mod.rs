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

//! Built-in operator implementations

pub mod arithmetic;
pub mod collection;
pub mod comparison;
pub mod logical;

use super::SymbolTable;

/// Register all built-in operators
pub(crate) fn register(table: &mut SymbolTable) {
    arithmetic::register(table);
    collection::register(table);
    comparison::register(table);
    logical::register(table);
}
