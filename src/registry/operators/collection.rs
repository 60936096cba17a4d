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

//! Collection operators: union (`|`) and membership (`in`)

use super::comparison::values_equal;
use crate::error::Result;
use crate::model::{Collection, FhirPathValue};
use crate::registry::{EmptyPropagation, ParamType, Signature, SymbolTable, wrap2};

/// Append `value` unless an equal item is already present
pub(crate) fn push_distinct(items: &mut Vec<FhirPathValue>, value: FhirPathValue) {
    if !items.iter().any(|existing| values_equal(existing, &value)) {
        items.push(value);
    }
}

/// Union of both sides without duplicates, left items first
pub fn union(left: Collection, right: Collection) -> Result<Collection> {
    let mut items = Vec::with_capacity(left.len() + right.len());
    for value in left.into_iter().chain(right) {
        push_distinct(&mut items, value);
    }
    Ok(Collection::from_vec(items))
}

/// Whether every item on the left has an equal item on the right
///
/// An empty left side gives empty.
pub fn membership(left: Collection, right: Collection) -> Result<Collection> {
    if left.is_empty() {
        return Ok(Collection::new());
    }
    let contained = left
        .iter()
        .all(|item| right.iter().any(|candidate| values_equal(item, candidate)));
    Ok(Collection::singleton(contained))
}

pub(crate) fn register(table: &mut SymbolTable) {
    let both = Signature::operator(&[ParamType::Collection, ParamType::Collection]);
    table.add("|", EmptyPropagation::Custom, both.clone(), wrap2(union));
    table.add("in", EmptyPropagation::Custom, both, wrap2(membership));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Collection {
        items.iter().map(|s| FhirPathValue::from(*s)).collect()
    }

    #[test]
    fn test_union_removes_duplicates() {
        let result = union(strings(&["a", "b"]), strings(&["a", "c"])).unwrap();
        assert_eq!(result.to_strings(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_union_with_empty() {
        let result = union(Collection::new(), strings(&["a"])).unwrap();
        assert_eq!(result.to_strings(), vec!["a"]);
    }

    #[test]
    fn test_membership() {
        let all = strings(&["a", "b", "c"]);
        assert_eq!(
            membership(strings(&["a", "c"]), all.clone()).unwrap().to_strings(),
            vec!["true"]
        );
        assert_eq!(
            membership(strings(&["d"]), all.clone()).unwrap().to_strings(),
            vec!["false"]
        );
        assert!(membership(Collection::new(), all).unwrap().is_empty());
        assert_eq!(
            membership(strings(&["a"]), Collection::new()).unwrap().to_strings(),
            vec!["false"]
        );
    }
}
