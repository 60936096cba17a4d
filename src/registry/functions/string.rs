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

//! String functions
//!
//! Positions and lengths count Unicode scalar values, not bytes.

use regex::RegexBuilder;

use crate::error::{FhirPathError, Result};
use crate::evaluator::{EvaluationContext, Invokee};
use crate::model::{Collection, FhirPathValue, coerce};
use crate::registry::{EmptyPropagation, ParamType as P, Signature, SymbolTable, wrap1, wrap2, wrap3};

fn char_slice(text: &str, start: i64, length: Option<i64>) -> Option<String> {
    let start = usize::try_from(start).ok()?;
    if start >= text.chars().count() {
        return None;
    }
    let rest = text.chars().skip(start);
    Some(match length {
        Some(length) => rest.take(usize::try_from(length).unwrap_or(0)).collect(),
        None => rest.collect(),
    })
}

/// substring(start) - the rest of the string from `start`
///
/// Empty when `start` lies outside the string.
pub fn substring_from(focus: Collection, start: Collection) -> Result<Collection> {
    let text = coerce::<String>(&focus)?;
    let start = coerce::<i64>(&start)?;
    Ok(char_slice(&text, start, None)
        .map(Collection::singleton)
        .unwrap_or_default())
}

/// substring(start, length) - at most `length` characters from `start`
pub fn substring(focus: Collection, start: Collection, length: Collection) -> Result<Collection> {
    let text = coerce::<String>(&focus)?;
    let start = coerce::<i64>(&start)?;
    let length = coerce::<i64>(&length)?;
    Ok(char_slice(&text, start, Some(length))
        .map(Collection::singleton)
        .unwrap_or_default())
}

/// Items of `focus` that carry a value, paired with their string form
fn string_values(focus: &Collection) -> impl Iterator<Item = (&FhirPathValue, String)> {
    focus
        .iter()
        .filter_map(|item| item.value().map(|v| (item, v.to_string_representation())))
}

/// length() - character count of the longest string form in the focus
///
/// Empty when no item carries a value.
pub fn length(focus: Collection) -> Result<Collection> {
    Ok(string_values(&focus)
        .map(|(_, text)| text.chars().count() as i64)
        .max()
        .map(Collection::singleton)
        .unwrap_or_default())
}

/// startsWith(prefix)
pub fn starts_with(focus: Collection, prefix: Collection) -> Result<Collection> {
    let text = coerce::<String>(&focus)?;
    let prefix = coerce::<String>(&prefix)?;
    Ok(Collection::singleton(text.starts_with(&prefix)))
}

/// contains(substring) - the items whose string form contains `substring`
pub fn contains(focus: Collection, needle: Collection) -> Result<Collection> {
    let needle = coerce::<String>(&needle)?;
    Ok(Collection::from_vec(
        string_values(&focus)
            .filter(|(_, text)| text.contains(&needle))
            .map(|(item, _)| item.clone())
            .collect(),
    ))
}

/// matches(regex) - the items whose string form the pattern matches anywhere
///
/// Patterns are compiled with the configured size limit.
pub fn matches(ctx: &EvaluationContext, args: &[Invokee]) -> Result<Collection> {
    let [focus, pattern] = args else {
        return Err(FhirPathError::InvalidArity {
            function_name: "matches".to_string(),
            actual: args.len().saturating_sub(1),
        });
    };
    let focus = focus.select(ctx)?;
    let pattern = coerce::<String>(&pattern.select(ctx)?)?;

    let regex = RegexBuilder::new(&pattern)
        .size_limit(ctx.config().regex_size_limit)
        .build()
        .map_err(|e| {
            FhirPathError::evaluation_error(format!("Invalid regex pattern '{pattern}': {e}"))
        })?;
    Ok(Collection::from_vec(
        string_values(&focus)
            .filter(|(_, text)| regex.is_match(text))
            .map(|(item, _)| item.clone())
            .collect(),
    ))
}

/// `&` - string concatenation where empty operands count as ''
pub fn concatenate(left: Collection, right: Collection) -> Result<Collection> {
    let text = |side: &Collection| -> Result<String> {
        if side.is_empty() {
            Ok(String::new())
        } else {
            coerce::<String>(side)
        }
    };
    Ok(Collection::singleton(text(&left)? + &text(&right)?))
}

pub(crate) fn register(table: &mut SymbolTable) {
    use EmptyPropagation::{Custom, Propagate};

    table.add(
        "substring",
        Propagate,
        Signature::function(P::String, &[P::Integer]),
        wrap2(substring_from),
    );
    table.add(
        "substring",
        Propagate,
        Signature::function(P::String, &[P::Integer, P::Integer]),
        wrap3(substring),
    );
    table.add("length", Propagate, Signature::function(P::Collection, &[]), wrap1(length));

    table.add(
        "startsWith",
        Propagate,
        Signature::function(P::String, &[P::String]),
        wrap2(starts_with),
    );
    let filter = Signature::function(P::Collection, &[P::String]);
    table.add("contains", Propagate, filter.clone(), wrap2(contains));
    table.add("matches", Propagate, filter, Invokee::new(matches));

    table.add(
        "&",
        Custom,
        Signature::operator(&[P::Collection, P::Collection]),
        wrap2(concatenate),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvaluationConfig;

    fn s(text: &str) -> Collection {
        Collection::singleton(text)
    }

    fn i(n: i64) -> Collection {
        Collection::singleton(n)
    }

    #[test]
    fn test_substring() {
        assert_eq!(substring(s("abcdefg"), i(3), i(2)).unwrap().to_strings(), vec!["de"]);
        assert_eq!(substring_from(s("abcdefg"), i(5)).unwrap().to_strings(), vec!["fg"]);
        assert_eq!(substring(s("abc"), i(1), i(10)).unwrap().to_strings(), vec!["bc"]);
        assert!(substring_from(s("abc"), i(3)).unwrap().is_empty());
        assert!(substring_from(s("abc"), i(-1)).unwrap().is_empty());
        assert_eq!(substring(s("héllo"), i(1), i(1)).unwrap().to_strings(), vec!["é"]);
    }

    fn names() -> Collection {
        Collection::from_vec(vec!["Peter".into(), "James".into(), "Jim".into()])
    }

    #[test]
    fn test_length_and_predicates() {
        assert_eq!(length(s("héllo")).unwrap().to_strings(), vec!["5"]);
        assert_eq!(length(names()).unwrap().to_strings(), vec!["5"]);
        assert_eq!(length(i(1234)).unwrap().to_strings(), vec!["4"]);
        assert_eq!(starts_with(s("hello"), s("he")).unwrap().to_strings(), vec!["true"]);
    }

    #[test]
    fn test_contains_filters_the_focus() {
        assert_eq!(contains(names(), s("e")).unwrap().to_strings(), vec!["Peter", "James"]);
        assert_eq!(contains(s("hello"), s("ell")).unwrap().to_strings(), vec!["hello"]);
        assert!(contains(s("hello"), s("xyz")).unwrap().is_empty());
    }

    #[test]
    fn test_matches_filters_and_is_bounded() {
        let ctx = EvaluationContext::new(s("abc123"));
        let pattern = |p: &'static str| Invokee::literal(p);
        let result = matches(&ctx, &[Invokee::this(), pattern("[0-9]+")]).unwrap();
        assert_eq!(result.to_strings(), vec!["abc123"]);

        let ctx = EvaluationContext::new(names());
        let result = matches(&ctx, &[Invokee::this(), pattern("^J")]).unwrap();
        assert_eq!(result.to_strings(), vec!["James", "Jim"]);

        assert!(matches(&ctx, &[Invokee::this(), pattern("(")]).is_err());

        let tiny = EvaluationContext::builder(s("abc"))
            .with_config(EvaluationConfig::default().with_regex_size_limit(16))
            .build();
        assert!(matches(&tiny, &[Invokee::this(), pattern("\\w{100}")]).is_err());
    }

    #[test]
    fn test_concatenate_treats_empty_as_blank() {
        assert_eq!(concatenate(s("a"), Collection::new()).unwrap().to_strings(), vec!["a"]);
        assert_eq!(concatenate(Collection::new(), Collection::new()).unwrap().to_strings(), vec![""]);
        assert_eq!(concatenate(s("a"), s("b")).unwrap().to_strings(), vec!["ab"]);
    }
}
