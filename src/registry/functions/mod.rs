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

//! Built-in function implementations organized by category

pub mod collection;
pub mod conversion;
pub mod filtering;
pub mod navigation;
pub mod string;
pub mod utility;

use super::SymbolTable;

/// Register all built-in functions
pub(crate) fn register(table: &mut SymbolTable) {
    collection::register(table);
    conversion::register(table);
    filtering::register(table);
    navigation::register(table);
    string::register(table);
    utility::register(table);
}
