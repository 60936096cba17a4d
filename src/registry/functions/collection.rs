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

//! Existence and subsetting functions

use crate::error::Result;
use crate::model::{Collection, coerce};
use crate::registry::operators::collection::push_distinct;
use crate::registry::{EmptyPropagation, ParamType as P, Signature, SymbolTable, wrap1, wrap2};

/// empty() - true when the focus has no items
pub fn empty(focus: Collection) -> Result<Collection> {
    Ok(Collection::singleton(focus.is_empty()))
}

/// exists() - true when the focus has at least one item
pub fn exists(focus: Collection) -> Result<Collection> {
    Ok(Collection::singleton(!focus.is_empty()))
}

/// count() - number of items, 0 for empty
pub fn count(focus: Collection) -> Result<Collection> {
    Ok(Collection::singleton(focus.len() as i64))
}

/// first() - the first item
pub fn first(focus: Collection) -> Result<Collection> {
    Ok(focus.into_iter().take(1).collect())
}

/// last() - the last item
pub fn last(focus: Collection) -> Result<Collection> {
    Ok(focus.last().cloned().into_iter().collect())
}

/// tail() - all items except the first
pub fn tail(focus: Collection) -> Result<Collection> {
    Ok(focus.into_iter().skip(1).collect())
}

fn non_negative(count: &Collection) -> Result<usize> {
    Ok(usize::try_from(coerce::<i64>(count)?).unwrap_or(0))
}

/// skip(num) - all items except the first `num`
pub fn skip(focus: Collection, num: Collection) -> Result<Collection> {
    let num = non_negative(&num)?;
    Ok(focus.into_iter().skip(num).collect())
}

/// take(num) - the first `num` items
pub fn take(focus: Collection, num: Collection) -> Result<Collection> {
    let num = non_negative(&num)?;
    Ok(focus.into_iter().take(num).collect())
}

/// item(index) - the item at a zero-based position, empty when out of range
pub fn item(focus: Collection, index: Collection) -> Result<Collection> {
    let index = coerce::<i64>(&index)?;
    Ok(usize::try_from(index)
        .ok()
        .and_then(|i| focus.get(i).cloned())
        .into_iter()
        .collect())
}

/// distinct() - items without duplicates, first occurrence kept
pub fn distinct(focus: Collection) -> Result<Collection> {
    let mut items = Vec::with_capacity(focus.len());
    for value in focus {
        push_distinct(&mut items, value);
    }
    Ok(Collection::from_vec(items))
}

pub(crate) fn register(table: &mut SymbolTable) {
    use EmptyPropagation::{Custom, Propagate};

    let on_collection = Signature::function(P::Collection, &[]);
    table.add("empty", Custom, on_collection.clone(), wrap1(empty));
    table.add("exists", Custom, on_collection.clone(), wrap1(exists));
    table.add("count", Custom, on_collection.clone(), wrap1(count));

    table.add("first", Propagate, on_collection.clone(), wrap1(first));
    table.add("last", Propagate, on_collection.clone(), wrap1(last));
    table.add("tail", Propagate, on_collection.clone(), wrap1(tail));
    table.add("distinct", Propagate, on_collection, wrap1(distinct));

    let with_integer = Signature::function(P::Collection, &[P::Integer]);
    table.add("skip", Propagate, with_integer.clone(), wrap2(skip));
    table.add("take", Propagate, with_integer.clone(), wrap2(take));
    table.add("item", Propagate, with_integer, wrap2(item));
}
