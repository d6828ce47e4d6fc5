//! Property tests for condition module
//!
//! Parsing shape, evaluation against direct computation, combination order
//! and stored-form fidelity.

use proptest::prelude::*;

use crate::condition::ast::{AstNode, Connective};
use crate::condition::cache::check_rule;
use crate::condition::combiner::combine;
use crate::condition::evaluator::evaluate;
use crate::condition::parser::parse;
use crate::error::RuleError;
use crate::record::{Record, Value};

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators for property tests
// ═══════════════════════════════════════════════════════════════════════════

const FIELDS: [&str; 4] = ["age", "score", "level", "rank"];

/// Generate field names present in every generated record
fn field_name_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(FIELDS.to_vec())
}

/// Generate comparison operators
fn comparator_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just(">"),
        Just("<"),
        Just(">="),
        Just("<="),
        Just("="),
        Just("!="),
    ]
}

/// Generate integer values in reasonable range
fn integer_value_strategy() -> impl Strategy<Value = i32> {
    -50..=50i32
}

/// Generate a simple condition string
fn simple_condition_strategy() -> impl Strategy<Value = String> {
    (field_name_strategy(), comparator_strategy(), integer_value_strategy())
        .prop_map(|(field, op, val)| format!("{} {} {}", field, op, val))
}

/// Generate a connective keyword
fn connective_strategy() -> impl Strategy<Value = Connective> {
    prop_oneof![Just(Connective::And), Just(Connective::Or)]
}

/// Generate a record with every field set; some values arrive as numeric strings
fn record_strategy() -> impl Strategy<Value = Record> {
    prop::collection::vec((integer_value_strategy(), any::<bool>()), FIELDS.len()).prop_map(
        |values| {
            FIELDS
                .iter()
                .zip(values)
                .map(|(field, (val, as_text))| {
                    let value = if as_text {
                        Value::Text(val.to_string())
                    } else {
                        Value::from(val)
                    };
                    (*field, value)
                })
                .collect::<Record>()
        },
    )
}

fn field_value(record: &Record, field: &str) -> i32 {
    record
        .get(field)
        .and_then(Value::as_number)
        .map(|n| n as i32)
        .unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// A chain joined by one connective has one more leaf than connectives
    #[test]
    fn prop_chain_leaf_count(
        conditions in prop::collection::vec(simple_condition_strategy(), 1..8),
        connective in connective_strategy()
    ) {
        let separator = format!(" {} ", connective);
        let rule = conditions.join(separator.as_str());
        let ast = parse(&rule).unwrap();

        prop_assert_eq!(ast.leaf_count(), conditions.len());

        let expected_fields: Vec<&str> = conditions
            .iter()
            .map(|c| c.split(' ').next().unwrap())
            .collect();
        prop_assert_eq!(ast.fields().to_vec(), expected_fields);
    }

    /// Redundant outer parentheses never change the tree
    #[test]
    fn prop_redundant_parens_are_transparent(
        cond in simple_condition_strategy(),
        other in simple_condition_strategy(),
        wraps in 1..5usize
    ) {
        let rule = format!("{} OR {}", cond, other);
        let wrapped = format!("{}{}{}", "(".repeat(wraps), rule, ")".repeat(wraps));
        prop_assert_eq!(parse(&wrapped).unwrap(), parse(&rule).unwrap());
    }

    /// Dropping a closing parenthesis is always a parse error
    #[test]
    fn prop_unclosed_group_fails(
        cond in simple_condition_strategy(),
        other in simple_condition_strategy()
    ) {
        let rule = format!("({} AND {}", cond, other);
        prop_assert!(matches!(parse(&rule), Err(RuleError::ParseError(_))));
    }

    /// Comparators should be mathematically correct, including numeric strings
    #[test]
    fn prop_comparators(
        actual in integer_value_strategy(),
        threshold in integer_value_strategy(),
        as_text in any::<bool>()
    ) {
        let value = if as_text { Value::Text(actual.to_string()) } else { Value::from(actual) };
        let record = Record::new().with("age", value);
        let check = |op: &str| evaluate(&parse(&format!("age {} {}", op, threshold)).unwrap(), &record).unwrap();

        prop_assert_eq!(check(">"), actual > threshold);
        prop_assert_eq!(check("<"), actual < threshold);
        prop_assert_eq!(check(">="), actual >= threshold);
        prop_assert_eq!(check("<="), actual <= threshold);
        prop_assert_eq!(check("="), actual == threshold);
        prop_assert_eq!(check("!="), actual != threshold);
    }

    /// AND/OR of two conditions matches direct computation
    #[test]
    fn prop_connective_evaluation(
        first in integer_value_strategy(),
        second in integer_value_strategy(),
        connective in connective_strategy(),
        record in record_strategy()
    ) {
        let rule = format!("age >= {} {} score < {}", first, connective, second);
        let result = evaluate(&parse(&rule).unwrap(), &record).unwrap();

        let left = field_value(&record, "age") >= first;
        let right = field_value(&record, "score") < second;
        let expected = match connective {
            Connective::And => left && right,
            Connective::Or => left || right,
        };
        prop_assert_eq!(result, expected, "Rule: {}", rule);
    }

    /// The right side is never reached once the left side decides the result
    #[test]
    fn prop_short_circuit_skips_unknown_fields(
        threshold in integer_value_strategy(),
        record in record_strategy()
    ) {
        let age = field_value(&record, "age");

        let and_rule = format!("age > {} AND missing = 1", threshold);
        let or_rule = format!("age > {} OR missing = 1", threshold);
        let and_result = evaluate(&parse(&and_rule).unwrap(), &record);
        let or_result = evaluate(&parse(&or_rule).unwrap(), &record);

        if age > threshold {
            prop_assert_eq!(or_result, Ok(true));
            prop_assert_eq!(and_result, Err(RuleError::UnknownField("missing".to_string())));
        } else {
            prop_assert_eq!(and_result, Ok(false));
            prop_assert_eq!(or_result, Err(RuleError::UnknownField("missing".to_string())));
        }
    }

    /// Combining keeps every leaf in input order and evaluates as a fold
    #[test]
    fn prop_combine_preserves_order(
        conditions in prop::collection::vec(simple_condition_strategy(), 1..6),
        connective in connective_strategy(),
        record in record_strategy()
    ) {
        let trees: Vec<AstNode> = conditions.iter().map(|c| parse(c).unwrap()).collect();
        let results: Vec<bool> = trees.iter().map(|t| evaluate(t, &record).unwrap()).collect();
        let combined = combine(trees.clone(), connective).unwrap();

        let expected_leaves: usize = trees.iter().map(AstNode::leaf_count).sum();
        prop_assert_eq!(combined.leaf_count(), expected_leaves);

        match &combined {
            AstNode::Operator { left, .. } => prop_assert_eq!(&**left, &trees[0]),
            leaf => prop_assert_eq!(leaf, &trees[0]),
        }

        let expected = match connective {
            Connective::And => results.iter().all(|r| *r),
            Connective::Or => results.iter().any(|r| *r),
        };
        prop_assert_eq!(evaluate(&combined, &record).unwrap(), expected);
    }

    /// Stored JSON decodes back to the same tree
    #[test]
    fn prop_stored_form_restores_tree(
        conditions in prop::collection::vec(simple_condition_strategy(), 1..6),
        connective in connective_strategy()
    ) {
        let separator = format!(" {} ", connective);
        let rule = conditions.join(separator.as_str());
        let ast = parse(&rule).unwrap();
        prop_assert_eq!(AstNode::from_json(&ast.to_json()).unwrap(), ast);
    }

    /// Cache should return same results as direct parsing
    #[test]
    fn prop_cache_consistency(
        cond in simple_condition_strategy(),
        record in record_strategy()
    ) {
        let direct = evaluate(&parse(&cond).unwrap(), &record).unwrap();
        let cached_first = check_rule(&cond, &record).unwrap();
        let cached_second = check_rule(&cond, &record).unwrap();

        prop_assert_eq!(direct, cached_first);
        prop_assert_eq!(cached_first, cached_second);
    }
}
