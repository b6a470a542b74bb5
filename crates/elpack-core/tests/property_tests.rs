//! # Property-Based Tests
//!
//! Invariants of the prerequisite expression parser and the duration
//! parsers, checked with proptest.

use elpack_core::PrerequisiteExpression;
use elpack_core::duration::{format_iso8601, parse_iso8601, parse_timespan};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::time::Duration;

// =============================================================================
// STRATEGIES
// =============================================================================

/// Ids whose second character is a digit, so they never spell a keyword.
fn system_id() -> impl Strategy<Value = String> {
    "[A-Z][0-9][A-Za-z0-9_.-]{0,5}"
}

/// Random expression trees over a small set of ids.
fn expression() -> impl Strategy<Value = PrerequisiteExpression> {
    let leaf = prop::sample::select(vec!["A1", "A2", "B.1", "c_3", "D-4"])
        .prop_map(|id| PrerequisiteExpression::Reference(id.to_string()));
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(PrerequisiteExpression::negate),
            vec(inner.clone(), 2..4).prop_filter_map("operands", |ops| PrerequisiteExpression::and(ops)),
            vec(inner, 2..4).prop_filter_map("operands", |ops| PrerequisiteExpression::or(ops)),
        ]
    })
}

// =============================================================================
// PREREQUISITE EXPRESSIONS
// =============================================================================

proptest! {
    /// Rendering then re-parsing preserves the meaning of an expression.
    #[test]
    fn display_round_trip_preserves_evaluation(
        expr in expression(),
        completed in btree_set(prop::sample::select(vec!["A1", "A2", "B.1", "c_3", "D-4"]), 0..5)
    ) {
        let rendered = expr.to_string();
        let reparsed = PrerequisiteExpression::parse(&rendered).expect("canonical form parses");
        let done = |id: &str| completed.contains(id);
        prop_assert_eq!(expr.evaluate(done), reparsed.evaluate(done));
        prop_assert_eq!(reparsed.to_string(), rendered);
    }

    /// A conjunction of plain references holds exactly when all are completed.
    #[test]
    fn conjunction_requires_every_reference(
        ids in btree_set(system_id(), 1..6),
        completed in btree_set(system_id(), 0..6)
    ) {
        let text = ids.iter().cloned().collect::<Vec<_>>().join(" & ");
        let expr = PrerequisiteExpression::parse(&text).expect("parse");
        let expected = ids.iter().all(|id| completed.contains(id));
        prop_assert_eq!(expr.evaluate(|id| completed.contains(id)), expected);
    }

    /// References are reported once each, whatever the nesting.
    #[test]
    fn references_are_unique(expr in expression()) {
        let refs = expr.references();
        let unique: BTreeSet<&str> = refs.iter().copied().collect();
        prop_assert_eq!(unique.len(), refs.len());
    }

    /// A run of negations reduces to its parity.
    #[test]
    fn negation_runs_keep_parity(count in 0usize..20_000, done in any::<bool>()) {
        let text = format!("{}A1", "~".repeat(count));
        let expr = PrerequisiteExpression::parse(&text).expect("parse");
        let expected = if count % 2 == 0 { "A1" } else { "~A1" };
        prop_assert_eq!(expr.to_string(), expected);
        prop_assert_eq!(expr.evaluate(|_| done), done == (count % 2 == 0));
    }

    /// Arbitrary input never panics the parser.
    #[test]
    fn parser_never_panics(input in "[ A-Za-z0-9_.&|~()#-]{0,40}") {
        let _ = PrerequisiteExpression::parse(&input);
    }
}

// =============================================================================
// DURATIONS
// =============================================================================

proptest! {
    /// Arbitrary input never panics the duration parsers.
    #[test]
    fn duration_parsers_never_panic(input in "\\PC{0,24}") {
        let _ = parse_iso8601(&input);
        let _ = parse_timespan(&input);
    }

    /// Well-formed timespans parse to the expected number of seconds.
    #[test]
    fn timespan_components(hours in 0u64..10_000, minutes in 0u64..60, seconds in 0u64..60) {
        let text = format!("{:04}:{:02}:{:02}", hours, minutes, seconds);
        let parsed = parse_timespan(&text).expect("valid timespan");
        prop_assert_eq!(parsed, Duration::from_secs(hours * 3600 + minutes * 60 + seconds));
    }

    /// Whole-second durations survive formatting and re-parsing.
    #[test]
    fn iso8601_format_round_trip(secs in 0u64..1_000_000) {
        let duration = Duration::from_secs(secs);
        let parsed = parse_iso8601(&format_iso8601(duration)).expect("formatted duration parses");
        prop_assert_eq!(parsed, duration);
    }
}
