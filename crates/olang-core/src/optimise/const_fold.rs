// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Constant folding over built-in wrapper values.
//!
//! The folder recognizes `Integer(5)`, `Boolean(true)`, `Real(3.14)` - a
//! wrapper constructor around a literal - and rewrites method calls whose
//! target and arguments are all such constants:
//!
//! ```text
//! Integer(2).Plus(Integer(3)).Mult(Integer(4))  →  Integer(20)
//! Boolean(true).And(Boolean(false))             →  Boolean(false)
//! Integer(10).Greater(Integer(5))               →  Boolean(true)
//! ```
//!
//! It also unwraps a wrapper around itself: `Boolean(Boolean(false))` →
//! `Boolean(false)`.
//!
//! Folding is conservative where runtime behavior could differ: integer
//! division and remainder by zero are left unfolded (the program keeps its
//! runtime fault), as is Real `Rem`. Real `Equal` folds using a fixed
//! `1e-9` tolerance. Integer arithmetic wraps, matching the target's 32-bit
//! semantics.
//!
//! Rewritten nodes carry their inferred types, so the emitter sees the same
//! invariants as for checker-produced trees.

use crate::ast::{ExprKind, Expression, MemberDecl, Program, Statement};
use crate::semantic_analysis::types::Type;
use crate::source_analysis::Span;

/// Result of one folding sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoldOutcome {
    /// Whether any rewrite happened.
    pub changed: bool,
    /// Number of expressions simplified.
    pub folded: usize,
}

/// Runs one bottom-up folding sweep over the whole program.
pub fn fold_constants(program: &mut Program) -> FoldOutcome {
    let mut folder = Folder::default();
    for class in &mut program.classes {
        for member in &mut class.members {
            match member {
                MemberDecl::Variable(field) => folder.fold_expression(&mut field.initializer),
                MemberDecl::Method(method) => {
                    if let Some(body) = &mut method.body {
                        for statement in body {
                            folder.fold_statement(statement);
                        }
                    }
                }
                MemberDecl::Constructor(ctor) => {
                    for statement in &mut ctor.body {
                        folder.fold_statement(statement);
                    }
                }
            }
        }
    }
    FoldOutcome {
        changed: folder.changed,
        folded: folder.folded,
    }
}

/// Tolerance for folding Real `Equal`.
const REAL_EQUAL_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Default)]
struct Folder {
    changed: bool,
    folded: usize,
}

impl Folder {
    fn fold_statement(&mut self, statement: &mut Statement) {
        match statement {
            Statement::Variable(decl) => self.fold_expression(&mut decl.initializer),
            Statement::Assignment(assign) => self.fold_expression(&mut assign.value),
            Statement::If(if_stmt) => {
                self.fold_expression(&mut if_stmt.condition);
                for stmt in &mut if_stmt.then_branch {
                    self.fold_statement(stmt);
                }
                if let Some(else_branch) = &mut if_stmt.else_branch {
                    for stmt in else_branch {
                        self.fold_statement(stmt);
                    }
                }
            }
            Statement::While(while_loop) => {
                self.fold_expression(&mut while_loop.condition);
                for stmt in &mut while_loop.body {
                    self.fold_statement(stmt);
                }
            }
            Statement::Return(ret) => {
                if let Some(value) = &mut ret.value {
                    self.fold_expression(value);
                }
            }
            Statement::Expression(expr) => self.fold_expression(expr),
            Statement::Unknown(_) => {}
        }
    }

    /// Folds children first, then tries to rewrite this node.
    fn fold_expression(&mut self, expression: &mut Expression) {
        match &mut expression.kind {
            ExprKind::MethodCall {
                target, arguments, ..
            } => {
                self.fold_expression(target);
                for argument in arguments {
                    self.fold_expression(argument);
                }
            }
            ExprKind::ConstructorCall { arguments, .. } => {
                for argument in arguments {
                    self.fold_expression(argument);
                }
            }
            ExprKind::MemberAccess { target, .. } => self.fold_expression(target),
            _ => {}
        }

        if let Some(replacement) = try_rewrite(expression) {
            *expression = replacement;
            self.folded += 1;
            self.changed = true;
        }
    }
}

/// Attempts a single rewrite of `expression`, returning the replacement.
fn try_rewrite(expression: &Expression) -> Option<Expression> {
    match &expression.kind {
        ExprKind::MethodCall {
            target,
            method_name,
            arguments,
            ..
        } => try_fold_call(target, method_name, arguments, expression.span),
        ExprKind::ConstructorCall {
            class_name,
            arguments,
            ..
        } => try_unwrap_wrapper(class_name, arguments, expression.span),
        _ => None,
    }
}

/// Folds a method call whose target and arguments are wrapper constants.
fn try_fold_call(
    target: &Expression,
    method: &str,
    arguments: &[Expression],
    span: Span,
) -> Option<Expression> {
    if let Some(left) = integer_constant(target) {
        return match arguments {
            [] => fold_integer_unary(left, method, span),
            [arg] => fold_integer_binary(left, integer_constant(arg)?, method, span),
            _ => None,
        };
    }
    if let Some(left) = boolean_constant(target) {
        return match arguments {
            [] => fold_boolean_unary(left, method, span),
            [arg] => fold_boolean_binary(left, boolean_constant(arg)?, method, span),
            _ => None,
        };
    }
    if let Some(left) = real_constant(target) {
        return match arguments {
            [] => fold_real_unary(left, method, span),
            [arg] => fold_real_binary(left, real_constant(arg)?, method, span),
            _ => None,
        };
    }
    None
}

fn fold_integer_binary(left: i32, right: i32, method: &str, span: Span) -> Option<Expression> {
    Some(match method {
        "Plus" => make_integer(left.wrapping_add(right), span),
        "Minus" => make_integer(left.wrapping_sub(right), span),
        "Mult" => make_integer(left.wrapping_mul(right), span),
        // Division by zero keeps its runtime fault
        "Div" if right != 0 => make_integer(left.wrapping_div(right), span),
        "Rem" if right != 0 => make_integer(left.wrapping_rem(right), span),
        "Less" => make_boolean(left < right, span),
        "LessEqual" => make_boolean(left <= right, span),
        "Greater" => make_boolean(left > right, span),
        "GreaterEqual" => make_boolean(left >= right, span),
        "Equal" => make_boolean(left == right, span),
        _ => return None,
    })
}

fn fold_integer_unary(value: i32, method: &str, span: Span) -> Option<Expression> {
    Some(match method {
        "UnaryMinus" => make_integer(value.wrapping_neg(), span),
        "UnaryPlus" => make_integer(value, span),
        _ => return None,
    })
}

fn fold_boolean_binary(left: bool, right: bool, method: &str, span: Span) -> Option<Expression> {
    Some(match method {
        "And" => make_boolean(left && right, span),
        "Or" => make_boolean(left || right, span),
        "Xor" => make_boolean(left ^ right, span),
        _ => return None,
    })
}

fn fold_boolean_unary(value: bool, method: &str, span: Span) -> Option<Expression> {
    match method {
        "Not" => Some(make_boolean(!value, span)),
        _ => None,
    }
}

fn fold_real_binary(left: f64, right: f64, method: &str, span: Span) -> Option<Expression> {
    Some(match method {
        "Plus" => make_real(left + right, span),
        "Minus" => make_real(left - right, span),
        "Mult" => make_real(left * right, span),
        "Div" if right != 0.0 => make_real(left / right, span),
        "Less" => make_boolean(left < right, span),
        "LessEqual" => make_boolean(left <= right, span),
        "Greater" => make_boolean(left > right, span),
        "GreaterEqual" => make_boolean(left >= right, span),
        "Equal" => make_boolean((left - right).abs() < REAL_EQUAL_TOLERANCE, span),
        // Real Rem is emitted but never folded
        _ => return None,
    })
}

fn fold_real_unary(value: f64, method: &str, span: Span) -> Option<Expression> {
    Some(match method {
        "UnaryMinus" => make_real(-value, span),
        "UnaryPlus" => make_real(value, span),
        _ => return None,
    })
}

/// `Outer(Outer(lit))` → `Outer(lit)` for a same-named wrapper around a
/// literal-carrying wrapper.
fn try_unwrap_wrapper(
    class_name: &str,
    arguments: &[Expression],
    span: Span,
) -> Option<Expression> {
    let [argument] = arguments else { return None };
    let ExprKind::ConstructorCall {
        class_name: inner_name,
        arguments: inner_args,
        ..
    } = &argument.kind
    else {
        return None;
    };
    if inner_name != class_name {
        return None;
    }
    let [literal] = inner_args.as_slice() else {
        return None;
    };
    if !literal.is_syntactic_literal() {
        return None;
    }
    Some(make_wrapper(
        class_name,
        literal.kind.clone(),
        literal_type(&literal.kind),
        span,
    ))
}

// ============================================================================
// Constant extraction
// ============================================================================

fn integer_constant(expression: &Expression) -> Option<i32> {
    match wrapper_literal(expression, "Integer")? {
        ExprKind::IntegerLiteral(value) => Some(*value),
        _ => None,
    }
}

fn boolean_constant(expression: &Expression) -> Option<bool> {
    match wrapper_literal(expression, "Boolean")? {
        ExprKind::BooleanLiteral(value) => Some(*value),
        _ => None,
    }
}

fn real_constant(expression: &Expression) -> Option<f64> {
    match wrapper_literal(expression, "Real")? {
        ExprKind::RealLiteral(value) => Some(*value),
        _ => None,
    }
}

/// Returns the literal argument of a `Wrapper(lit)` form.
fn wrapper_literal<'a>(expression: &'a Expression, wrapper: &str) -> Option<&'a ExprKind> {
    let ExprKind::ConstructorCall {
        class_name,
        arguments,
        ..
    } = &expression.kind
    else {
        return None;
    };
    if class_name != wrapper {
        return None;
    }
    let [argument] = arguments.as_slice() else {
        return None;
    };
    Some(&argument.kind)
}

// ============================================================================
// Node construction
// ============================================================================

fn make_integer(value: i32, span: Span) -> Expression {
    make_wrapper("Integer", ExprKind::IntegerLiteral(value), Type::integer(), span)
}

fn make_boolean(value: bool, span: Span) -> Expression {
    make_wrapper("Boolean", ExprKind::BooleanLiteral(value), Type::boolean(), span)
}

fn make_real(value: f64, span: Span) -> Expression {
    make_wrapper("Real", ExprKind::RealLiteral(value), Type::real(), span)
}

fn make_wrapper(class_name: &str, literal: ExprKind, ty: Type, span: Span) -> Expression {
    let mut argument = Expression::new(literal, span);
    argument.inferred_type = Some(ty.clone());
    let mut wrapper = Expression::new(
        ExprKind::ConstructorCall {
            class_name: class_name.into(),
            arguments: vec![argument],
            resolved_class: None,
            resolved_type: Some(ty.clone()),
        },
        span,
    );
    wrapper.inferred_type = Some(ty);
    wrapper
}

fn literal_type(kind: &ExprKind) -> Type {
    match kind {
        ExprKind::IntegerLiteral(_) => Type::integer(),
        ExprKind::BooleanLiteral(_) => Type::boolean(),
        ExprKind::RealLiteral(_) => Type::real(),
        _ => unreachable!("literal_type on non-literal kind"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimise::tests::typed_program;

    /// Folds the program to a fixed point and returns the first field or
    /// first local initializer of class 0.
    fn folded_initializer(source: &str) -> Expression {
        let mut program = typed_program(source);
        while fold_constants(&mut program).changed {}
        let class = &program.classes[0];
        if let Some((_, field)) = class.fields().next() {
            return field.initializer.clone();
        }
        for (_, ctor) in class.constructors() {
            if let Some(Statement::Variable(decl)) = ctor.body.first() {
                return decl.initializer.clone();
            }
        }
        panic!("no initializer found");
    }

    fn as_integer(expression: &Expression) -> i32 {
        integer_constant(expression).expect("expected folded Integer constant")
    }

    fn as_boolean(expression: &Expression) -> bool {
        boolean_constant(expression).expect("expected folded Boolean constant")
    }

    #[test]
    fn folds_integer_arithmetic_chain() {
        let init = folded_initializer(
            "class ConstFold is this() is var r : Integer(2).Plus(Integer(3)).Mult(Integer(4)) end end",
        );
        assert_eq!(as_integer(&init), 20);
        // The folded node keeps its inferred type for the emitter
        assert_eq!(init.inferred_type.as_ref().unwrap().name(), "Integer");
    }

    #[test]
    fn folds_each_integer_operator() {
        for (source_op, expected) in [
            ("Plus", 13),
            ("Minus", 7),
            ("Mult", 30),
            ("Div", 3),
            ("Rem", 1),
        ] {
            let init = folded_initializer(&format!(
                "class A is var x : Integer(10).{source_op}(Integer(3)) end"
            ));
            assert_eq!(as_integer(&init), expected, "operator {source_op}");
        }
    }

    #[test]
    fn folds_integer_comparisons_to_booleans() {
        for (op, expected) in [
            ("Less", false),
            ("LessEqual", false),
            ("Greater", true),
            ("GreaterEqual", true),
            ("Equal", false),
        ] {
            let init = folded_initializer(&format!(
                "class A is var x : Integer(10).{op}(Integer(3)) end"
            ));
            assert_eq!(as_boolean(&init), expected, "operator {op}");
        }
    }

    #[test]
    fn folds_unary_operators() {
        let init = folded_initializer("class A is var x : Integer(5).UnaryMinus() end");
        assert_eq!(as_integer(&init), -5);
        let init = folded_initializer("class A is var x : Integer(5).UnaryPlus() end");
        assert_eq!(as_integer(&init), 5);
    }

    #[test]
    fn division_by_zero_is_left_unfolded() {
        let init = folded_initializer("class A is var x : Integer(10).Div(Integer(0)) end");
        assert!(matches!(init.kind, ExprKind::MethodCall { .. }));
        let init = folded_initializer("class A is var x : Integer(10).Rem(Integer(0)) end");
        assert!(matches!(init.kind, ExprKind::MethodCall { .. }));
    }

    #[test]
    fn folds_boolean_logic() {
        let init =
            folded_initializer("class A is var x : Boolean(true).And(Boolean(false)) end");
        assert!(!as_boolean(&init));
        let init =
            folded_initializer("class A is var x : Boolean(true).Or(Boolean(false)) end");
        assert!(as_boolean(&init));
        let init =
            folded_initializer("class A is var x : Boolean(true).Xor(Boolean(true)) end");
        assert!(!as_boolean(&init));
        let init = folded_initializer("class A is var x : Boolean(false).Not() end");
        assert!(as_boolean(&init));
    }

    #[test]
    fn folds_real_arithmetic() {
        let init = folded_initializer("class A is var x : Real(1.5).Plus(Real(2.5)) end");
        assert_eq!(real_constant(&init), Some(4.0));
        let init = folded_initializer("class A is var x : Real(10.0).Div(Real(4.0)) end");
        assert_eq!(real_constant(&init), Some(2.5));
    }

    #[test]
    fn real_equal_uses_tolerance() {
        let init = folded_initializer(
            "class A is var x : Real(1.0).Equal(Real(1.0000000001)) end",
        );
        assert!(as_boolean(&init), "within 1e-9 folds to true");
        let init = folded_initializer("class A is var x : Real(1.0).Equal(Real(1.1)) end");
        assert!(!as_boolean(&init));
    }

    #[test]
    fn real_rem_is_not_folded() {
        let init = folded_initializer("class A is var x : Real(10.0).Rem(Real(3.0)) end");
        assert!(matches!(init.kind, ExprKind::MethodCall { .. }));
    }

    #[test]
    fn real_division_by_zero_is_left_unfolded() {
        let init = folded_initializer("class A is var x : Real(1.0).Div(Real(0.0)) end");
        assert!(matches!(init.kind, ExprKind::MethodCall { .. }));
    }

    #[test]
    fn unwraps_nested_wrapper() {
        let init = folded_initializer("class A is var x : Boolean(Boolean(false)) end");
        assert_eq!(boolean_constant(&init), Some(false));
    }

    #[test]
    fn variables_are_not_folded() {
        let mut program = typed_program(
            "class A is method m(n : Integer) : Integer is return n.Plus(Integer(1)) end end",
        );
        let outcome = fold_constants(&mut program);
        assert!(!outcome.changed);
        assert_eq!(outcome.folded, 0);
    }

    #[test]
    fn loop_conditions_on_variables_stay_intact() {
        let mut program = typed_program(
            "class Loop is method factorial(n : Integer) : Integer is \
             var result : Integer(1) var i : Integer(1) \
             while i.LessEqual(n) loop \
             result := result.Mult(i) i := i.Plus(Integer(1)) end \
             return result end this() is end end",
        );
        let outcome = fold_constants(&mut program);
        assert!(!outcome.changed, "nothing constant to fold in the loop");
    }

    #[test]
    fn expression_count_never_increases() {
        // The §8 monotonicity invariant.
        fn count_expressions(expression: &Expression) -> usize {
            1 + match &expression.kind {
                ExprKind::MethodCall {
                    target, arguments, ..
                } => count_expressions(target)
                    + arguments.iter().map(count_expressions).sum::<usize>(),
                ExprKind::ConstructorCall { arguments, .. } => {
                    arguments.iter().map(count_expressions).sum()
                }
                ExprKind::MemberAccess { target, .. } => count_expressions(target),
                _ => 0,
            }
        }
        fn count_in_statements(statements: &[Statement]) -> usize {
            statements
                .iter()
                .map(|s| match s {
                    Statement::Variable(decl) => count_expressions(&decl.initializer),
                    Statement::Assignment(assign) => count_expressions(&assign.value),
                    Statement::If(if_stmt) => {
                        count_expressions(&if_stmt.condition)
                            + count_in_statements(&if_stmt.then_branch)
                            + if_stmt
                                .else_branch
                                .as_deref()
                                .map_or(0, count_in_statements)
                    }
                    Statement::While(while_loop) => {
                        count_expressions(&while_loop.condition)
                            + count_in_statements(&while_loop.body)
                    }
                    Statement::Return(ret) => {
                        ret.value.as_ref().map_or(0, count_expressions)
                    }
                    Statement::Expression(expr) => count_expressions(expr),
                    Statement::Unknown(_) => 0,
                })
                .sum()
        }
        fn count_in_program(program: &Program) -> usize {
            program
                .classes
                .iter()
                .flat_map(|c| c.members.iter())
                .map(|m| match m {
                    MemberDecl::Variable(field) => count_expressions(&field.initializer),
                    MemberDecl::Method(method) => {
                        method.body.as_deref().map_or(0, count_in_statements)
                    }
                    MemberDecl::Constructor(ctor) => count_in_statements(&ctor.body),
                })
                .sum()
        }

        let mut program = typed_program(
            "class A is this() is \
             var a : Integer(2).Plus(Integer(3)).Mult(Integer(4)) \
             var b : Boolean(Boolean(true)).And(Boolean(false)) \
             var c : Real(1.0).Plus(Real(2.0)) end end",
        );
        let mut previous = count_in_program(&program);
        loop {
            let outcome = fold_constants(&mut program);
            let current = count_in_program(&program);
            assert!(current <= previous, "expression count grew: {previous} → {current}");
            previous = current;
            if !outcome.changed {
                break;
            }
        }
    }
}
