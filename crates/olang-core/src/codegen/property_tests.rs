// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the emitter's stack accounting.
//!
//! The emitter verifies its own invariants while lowering (statements are
//! stack-neutral, pops never underflow), so "generation succeeds" is itself
//! a meaningful property: any accounting mistake on a generated program
//! shape turns into a `CodeGenError`. On top of that we check the emitted
//! limits against the text.

use proptest::prelude::*;

use crate::compile;

/// Generates a nested arithmetic expression over `seed` and small
/// constants. Depth controls nesting, which drives peak stack depth.
fn arith_expr(depth: u32) -> BoxedStrategy<String> {
    if depth == 0 {
        prop_oneof![
            (0i32..200).prop_map(|n| format!("Integer({n})")),
            Just("seed".to_string()),
        ]
        .boxed()
    } else {
        let inner = arith_expr(depth - 1);
        (
            inner.clone(),
            inner,
            prop_oneof![
                Just("Plus"),
                Just("Minus"),
                Just("Mult"),
                Just("Rem"),
            ],
        )
            .prop_map(|(left, right, op)| format!("{left}.{op}({right})"))
            .boxed()
    }
}

/// Generates a small loop-and-branch body over `seed` and `flag`.
fn control_flow_body() -> impl Strategy<Value = String> {
    (arith_expr(2), arith_expr(1), 1i32..5).prop_map(|(a, b, bound)| {
        format!(
            "var acc : {a} \
             var i : Integer(0) \
             while i.Less(Integer({bound})) loop \
             if flag then acc := acc.Plus({b}) else acc := {b} end \
             i := i.Plus(Integer(1)) \
             end \
             return acc"
        )
    })
}

/// Extracts the `.limit stack N` value of the first emitted method body.
fn stack_limit(text: &str) -> u32 {
    text.lines()
        .find_map(|line| line.trim().strip_prefix(".limit stack "))
        .expect("no stack limit emitted")
        .parse()
        .expect("unparseable stack limit")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn nested_arithmetic_lowers_with_exact_accounting(expr in arith_expr(4)) {
        let source = format!(
            "class P is method calc(seed : Integer) : Integer is return {expr} end end"
        );
        // Generation succeeding means every statement balanced and no pop
        // underflowed.
        let compiled = compile(&source).expect("pipeline failed");
        let text = &compiled.files[0].text;

        // Depth-d nesting needs at most d+1 operand slots.
        let limit = stack_limit(text);
        prop_assert!(limit >= 1);
        prop_assert!(limit <= 6, "limit {limit} exceeds nesting bound:\n{text}");
    }

    #[test]
    fn control_flow_lowers_with_exact_accounting(body in control_flow_body()) {
        let source = format!(
            "class P is method run(seed : Integer, flag : Boolean) : Integer is {body} end end"
        );
        let compiled = compile(&source).expect("pipeline failed");
        let text = &compiled.files[0].text;
        prop_assert!(stack_limit(text) >= 1);
        // Loop labels come in pairs
        let starts = text.matches("WhileStart").count();
        let ends = text.matches("WhileEnd").count();
        prop_assert_eq!(starts, ends);
    }

    #[test]
    fn emission_is_deterministic(expr in arith_expr(3)) {
        let source = format!(
            "class P is method calc(seed : Integer) : Integer is return {expr} end end"
        );
        let first = compile(&source).expect("pipeline failed");
        let second = compile(&source).expect("pipeline failed");
        prop_assert_eq!(first.files[0].text.clone(), second.files[0].text.clone());
    }
}
