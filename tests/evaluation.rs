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

//! End-to-end evaluation over a JSON-backed patient document

mod utils;

use pretty_assertions::assert_eq;
use rstest::rstest;
use utils::{eval, eval_patient, eval_patient_types, eval_types, strings};

#[test]
fn test_path_navigation() {
    assert_eq!(eval_patient("Patient.name.count()"), strings(&["2"]));
    assert_eq!(
        eval_patient("Patient.name.given"),
        strings(&["Peter", "James", "Jim"])
    );
    assert_eq!(eval_patient("name.family"), strings(&["Chalmers"]));
    assert_eq!(eval_patient("Patient.birthDate"), strings(&["1974-12-25"]));
    assert_eq!(eval_patient("Patient.unknown"), Vec::<String>::new());
    assert_eq!(eval_patient_types("Patient.name.count()"), strings(&["integer"]));
}

#[test]
fn test_type_prefix_only_matches_the_focus_type() {
    assert_eq!(eval_patient("Observation.name"), Vec::<String>::new());
}

#[test]
fn test_path_composition_is_associative() {
    let left = eval_patient("(Patient.name).given");
    let right = eval_patient("Patient.(name.given)");
    assert_eq!(left, right);
    assert_eq!(left.len(), 3);
}

#[rstest]
#[case("(1 + 2) * 3", "9")]
#[case("1 + 2 * 3", "7")]
#[case("7 div 2", "3")]
#[case("7 mod 2", "1")]
#[case("7 / 2", "3.5")]
#[case("1.5 + 1", "2.5")]
#[case("'a' + 'b'", "ab")]
#[case("10 - 2 - 3", "5")]
fn test_arithmetic(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(eval(source), strings(&[expected]));
}

#[rstest]
#[case("(1 + 2) * 3", "integer")]
#[case("7 / 2", "decimal")]
#[case("1.5 + 1", "decimal")]
#[case("'a' + 'b'", "string")]
fn test_arithmetic_result_types(#[case] source: &str, #[case] type_name: &str) {
    assert_eq!(eval_types(source), strings(&[type_name]));
}

#[test]
fn test_division_by_zero_is_empty() {
    assert_eq!(eval("1 / 0"), Vec::<String>::new());
    assert_eq!(eval("1 div 0"), Vec::<String>::new());
}

#[rstest]
#[case("'hello'", "hello")]
#[case("42", "42")]
#[case("3.14", "3.14")]
#[case("true", "true")]
#[case("@2015-02-04", "2015-02-04")]
#[case("@2015-02-04T14:34:28Z", "2015-02-04T14:34:28Z")]
#[case("@T14:30", "14:30")]
fn test_literals_round_trip(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(eval(source), strings(&[expected]));
}

#[rstest]
#[case("'abc'", "string")]
#[case("42", "integer")]
#[case("3.14", "decimal")]
#[case("true", "boolean")]
#[case("@2015-02-04", "dateTime")]
#[case("@T14:30", "time")]
fn test_literal_types(#[case] source: &str, #[case] type_name: &str) {
    assert_eq!(eval_types(source), strings(&[type_name]));
}

#[test]
fn test_union_removes_duplicates() {
    assert_eq!(eval("'a' | 'b' | 'a'"), strings(&["a", "b"]));
    assert_eq!(
        eval_patient("Patient.name.use | Patient.telecom.use"),
        strings(&["official", "usual", "work"])
    );
}

#[test]
fn test_empty_propagation() {
    assert_eq!(eval_patient("Patient.missing + 1"), Vec::<String>::new());
    assert_eq!(eval_patient("Patient.missing.substring(1)"), Vec::<String>::new());
    assert_eq!(eval_patient("'abc'.substring(Patient.missing)"), Vec::<String>::new());
    assert_eq!(eval_patient("Patient.missing.first()"), Vec::<String>::new());
    assert_eq!(eval_patient("Patient.missing.last()"), Vec::<String>::new());
    assert_eq!(eval_patient("Patient.missing.count()"), strings(&["0"]));
    assert_eq!(eval_patient("Patient.missing.empty()"), strings(&["true"]));
    assert_eq!(eval_patient("Patient.missing.exists()"), strings(&["false"]));
}

#[test]
fn test_where_excludes_empty_criteria() {
    assert_eq!(
        eval_patient("Patient.name.where(use = 'official').given"),
        strings(&["Peter", "James"])
    );
    assert_eq!(eval_patient("Patient.name.where(missing = 'x')"), Vec::<String>::new());
}

#[test]
fn test_all_treats_empty_criteria_as_true() {
    assert_eq!(eval_patient("Patient.name.all(missing = 'x')"), strings(&["true"]));
    assert_eq!(eval_patient("Patient.name.all(use = 'official')"), strings(&["false"]));
    assert_eq!(eval_patient("Patient.name.any(use = 'usual')"), strings(&["true"]));
    assert_eq!(eval_patient("Patient.name.any()"), strings(&["true"]));
}

#[rstest]
#[case("(Patient.missing = 'x') and false", &["false"])]
#[case("(Patient.missing = 'x') and true", &[])]
#[case("(Patient.missing = 'x') or true", &["true"])]
#[case("(Patient.missing = 'x') or false", &[])]
#[case("false implies (Patient.missing = 'x')", &["true"])]
#[case("(Patient.missing = 'x') implies true", &["true"])]
#[case("true xor (Patient.missing = 'x')", &[])]
#[case("Patient.missing.not()", &[])]
#[case("Patient.active.not()", &["false"])]
fn test_three_valued_logic(#[case] source: &str, #[case] expected: &[&str]) {
    assert_eq!(eval_patient(source), strings(expected));
}

#[test]
fn test_indexing_and_paging() {
    assert_eq!(eval_patient("Patient.name.given[1]"), strings(&["James"]));
    assert_eq!(eval_patient("Patient.name.given[5]"), Vec::<String>::new());
    assert_eq!(eval_patient("Patient.name.given.item(0)"), strings(&["Peter"]));
    assert_eq!(
        eval_patient("Patient.name.given.skip(1)"),
        strings(&["James", "Jim"])
    );
    assert_eq!(
        eval_patient("Patient.name.given.take(2)"),
        strings(&["Peter", "James"])
    );
    assert_eq!(eval_patient("Patient.name.given.tail().first()"), strings(&["James"]));
    assert_eq!(eval_patient("Patient.name.given.last()"), strings(&["Jim"]));
    assert_eq!(eval_patient("Patient.name.skip(-1).count()"), strings(&["2"]));
    assert_eq!(eval_patient("Patient.name.take(-1).count()"), strings(&["0"]));
}

#[test]
fn test_select_projects_and_flattens() {
    assert_eq!(
        eval_patient("Patient.name.select(given.first())"),
        strings(&["Peter", "Jim"])
    );
    assert_eq!(
        eval_patient("Patient.name.given.select($this.length())"),
        strings(&["5", "5", "3"])
    );
}

#[test]
fn test_string_functions() {
    assert_eq!(eval("'abcdef'.substring(2)"), strings(&["cdef"]));
    assert_eq!(eval("'abcdef'.substring(1, 3)"), strings(&["bcd"]));
    assert_eq!(eval("'abc'.substring(5)"), Vec::<String>::new());
    assert_eq!(eval("'abc'.startsWith('ab')"), strings(&["true"]));
    assert_eq!(eval("'abc'.contains('x')"), Vec::<String>::new());
    assert_eq!(eval("'abc'.contains('b')"), strings(&["abc"]));
    assert_eq!(
        eval(r"'2023-01-15'.matches('^\\d{4}-\\d{2}-\\d{2}$')"),
        strings(&["2023-01-15"])
    );
    assert_eq!(eval("'a' & 'b'"), strings(&["ab"]));
}

#[test]
fn test_string_functions_over_several_items() {
    assert_eq!(
        eval_patient("Patient.name.given.contains('e')"),
        strings(&["Peter", "James"])
    );
    assert_eq!(eval_patient("Patient.name.given.matches('^J')"), strings(&["James", "Jim"]));
    assert_eq!(eval_patient("Patient.name.given.length()"), strings(&["5"]));
    assert_eq!(
        eval_patient("Patient.name.where(given.contains('Pe').exists()).use"),
        strings(&["official"])
    );
}

#[test]
fn test_document_dates_compare_with_date_literals() {
    assert_eq!(eval_patient("Patient.birthDate = @1974-12-25"), strings(&["true"]));
    assert_eq!(eval_patient("Patient.birthDate != @1974-12-26"), strings(&["true"]));
    assert_eq!(eval_patient("Patient.birthDate < @2000-01-01"), strings(&["true"]));
    assert_eq!(eval_patient("Patient.birthDate >= @1975-01-01"), strings(&["false"]));
    assert_eq!(eval_patient("Patient.birthDate.toString() = '1974-12-25'"), strings(&["true"]));
}

#[test]
fn test_date_equality_across_precisions() {
    assert_eq!(eval("@2015 = @2015-02"), Vec::<String>::new());
    assert_eq!(eval("@2015 != @2015-02"), Vec::<String>::new());
    assert_eq!(eval("@2015 = @2016-02"), strings(&["false"]));
    assert_eq!(eval("@T10 = @T10:30"), Vec::<String>::new());
}

#[test]
fn test_comparison() {
    assert_eq!(eval("1 < 2"), strings(&["true"]));
    assert_eq!(eval("2.0 = 2"), strings(&["true"]));
    assert_eq!(eval("'abc' >= 'abd'"), strings(&["false"]));
    assert_eq!(eval("@2015-02-04 < @2015-02-05"), strings(&["true"]));
    assert_eq!(eval("@2015-02 < @2015-02-05"), Vec::<String>::new());
    assert_eq!(eval("'Hello  World' ~ 'hello world'"), strings(&["true"]));
    assert_eq!(eval("'a' != 'b'"), strings(&["true"]));
    assert_eq!(eval_patient("Patient.gender = 'male'"), strings(&["true"]));
}

#[test]
fn test_membership() {
    assert_eq!(eval("'b' in ('a' | 'b')"), strings(&["true"]));
    assert_eq!(eval("'c' in ('a' | 'b')"), strings(&["false"]));
    assert_eq!(eval_patient("Patient.missing in ('a' | 'b')"), Vec::<String>::new());
}

#[test]
fn test_conversions() {
    assert_eq!(eval("'42'.toInteger() + 1"), strings(&["43"]));
    assert_eq!(eval("'1.5'.toDecimal()"), strings(&["1.5"]));
    assert_eq!(eval("'abc'.toInteger()"), Vec::<String>::new());
    assert_eq!(eval("12.toString() & 'x'"), strings(&["12x"]));
}

#[test]
fn test_tree_axes() {
    assert_eq!(
        eval_patient("Patient.name.first().children().count()"),
        strings(&["4"])
    );
    assert_eq!(
        eval_patient("Patient.descendants().where($this = 'Jim').count()"),
        strings(&["1"])
    );
    assert_eq!(
        eval_patient("Patient.name.given.first().parent().family"),
        strings(&["Chalmers"])
    );
    assert_eq!(
        eval_patient("Patient.extension('http://example.org/ext/race').valueString"),
        strings(&["unknown"])
    );
}

#[test]
fn test_constants() {
    assert_eq!(eval("%ucum"), strings(&["http://unitsofmeasure.org"]));
    assert_eq!(
        eval("%vs-administrative-gender"),
        strings(&["http://hl7.org/fhir/ValueSet/administrative-gender"])
    );
    assert_eq!(eval_patient("%context.name.count()"), strings(&["2"]));
    assert_eq!(eval_patient("Patient.name.where(%context.active).count()"), strings(&["2"]));
}

#[test]
fn test_distinct() {
    assert_eq!(eval("(1 | 2).distinct().count()"), strings(&["2"]));
    assert_eq!(
        eval_patient("Patient.name.use.distinct()"),
        strings(&["official", "usual"])
    );
}
