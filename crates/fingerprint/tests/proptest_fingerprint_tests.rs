//! Property-based tests for fingerprint stability and sensitivity.
//!
//! - Determinism: the same call always produces the same key
//! - Sensitivity: changing code, an argument, or a capture changes the key
//! - Invariance: blank lines and keyword insertion order do not matter

use memoir_fingerprint::{
    Arguments, Code, Environment, arg_fingerprint, call_fingerprint, code_fingerprint,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Source lines without newlines; may be blank or whitespace-only
fn line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-z_(){};=+* ]{1,30}".prop_map(String::from),
        1 => Just(String::new()),
        1 => "[ \t]{1,4}".prop_map(String::from),
    ]
}

fn source_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(line_strategy(), 1..12)
}

fn keyword_strategy() -> impl Strategy<Value = BTreeMap<String, i64>> {
    prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..6)
}

fn build_args(positional: &[i64], keywords: impl IntoIterator<Item = (String, i64)>) -> Arguments {
    let mut args = Arguments::new();
    for value in positional {
        args.push(value).unwrap();
    }
    for (name, value) in keywords {
        args.insert(name, &value).unwrap();
    }
    args
}

// =============================================================================
// Property Tests: Determinism
// =============================================================================

proptest! {
    /// Contract: the same call fingerprints identically every time
    #[test]
    fn call_fingerprint_is_deterministic(
        lines in source_strategy(),
        positional in prop::collection::vec(any::<i64>(), 0..5),
        keywords in keyword_strategy(),
        captured in any::<i32>(),
    ) {
        let code = Code::source("f", lines.join("\n"));
        let args = build_args(&positional, keywords);
        let env = Environment::new().nonlocal("captured", &captured).unwrap();

        prop_assert_eq!(
            call_fingerprint(&code, &args, &env),
            call_fingerprint(&code.clone(), &args.clone(), &env.clone())
        );
    }

    /// Contract: keyword insertion order never changes the key
    #[test]
    fn keyword_order_is_irrelevant(keywords in keyword_strategy()) {
        let forward = build_args(&[], keywords.clone());
        let reverse = build_args(&[], keywords.into_iter().rev());
        prop_assert_eq!(arg_fingerprint(&forward), arg_fingerprint(&reverse));
    }

    /// Contract: inserting blank lines anywhere keeps the code fingerprint
    #[test]
    fn blank_lines_are_irrelevant(
        lines in source_strategy(),
        insert_at in prop::collection::vec(any::<prop::sample::Index>(), 0..4),
    ) {
        let mut padded = lines.clone();
        for index in insert_at {
            let at = index.index(padded.len() + 1);
            padded.insert(at, "   ".to_string());
        }
        prop_assert_eq!(
            code_fingerprint(&Code::source("f", lines.join("\n"))),
            code_fingerprint(&Code::source("f", padded.join("\n")))
        );
    }
}

// =============================================================================
// Property Tests: Sensitivity
// =============================================================================

proptest! {
    /// Contract: swapping two distinct positional arguments changes the key
    #[test]
    fn positional_order_matters(a in any::<i64>(), b in any::<i64>()) {
        prop_assume!(a != b);
        prop_assert_ne!(
            arg_fingerprint(&build_args(&[a, b], BTreeMap::new())),
            arg_fingerprint(&build_args(&[b, a], BTreeMap::new()))
        );
    }

    /// Contract: changing one keyword value changes the key
    #[test]
    fn keyword_value_matters(
        keywords in keyword_strategy(),
        name in "[a-z]{1,8}",
        value in any::<i64>(),
        other in any::<i64>(),
    ) {
        prop_assume!(value != other);
        let mut with_value = keywords.clone();
        with_value.insert(name.clone(), value);
        let mut with_other = keywords;
        with_other.insert(name, other);
        prop_assert_ne!(
            arg_fingerprint(&build_args(&[], with_value)),
            arg_fingerprint(&build_args(&[], with_other))
        );
    }

    /// Contract: changing a captured global changes the key, all else fixed
    #[test]
    fn captured_value_matters(before in any::<u32>(), after in any::<u32>()) {
        prop_assume!(before != after);
        let code = Code::versioned("score", "1");
        let args = Arguments::new();
        prop_assert_ne!(
            call_fingerprint(&code, &args, &Environment::new().global("seed", &before).unwrap()),
            call_fingerprint(&code, &args, &Environment::new().global("seed", &after).unwrap())
        );
    }

    /// Contract: changing a non-blank source line changes the key
    #[test]
    fn source_change_matters(lines in source_strategy(), extra in "[a-z]{1,10}") {
        let original = lines.join("\n");
        let edited = format!("{original}\n{extra}");
        prop_assert_ne!(
            code_fingerprint(&Code::source("f", original)),
            code_fingerprint(&Code::source("f", edited))
        );
    }
}
