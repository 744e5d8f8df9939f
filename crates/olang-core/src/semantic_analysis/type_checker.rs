// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Type inference and checking (semantic pass 2).
//!
//! Runs after the symbol-table pass, which has already resolved names.
//! Two sub-passes:
//!
//! - **Signature resolution** - every declared type name in the program
//!   (parameter types, return types) is resolved to a [`Type`]; methods
//!   without a declared return type get `Void`. Field types are then
//!   inferred from their initializers, class by class, before any body is
//!   checked, so methods may reference fields declared after them.
//! - **Body checking** - statements and expressions are traversed,
//!   populating `inferred_type` bottom-up and validating: assignment
//!   compatibility, Boolean conditions, return/return-type agreement,
//!   constructor contracts (built-in and user), array method shapes, and
//!   method overload resolution by signature with a compatibility fallback.
//!
//! Overload resolution is textual: an exact `name(T1,…)` signature match on
//! the inheritance chain wins; otherwise candidates with the same name and
//! arity are tried in subclass-first chain order with per-argument
//! compatibility. There is no numeric promotion between Integer and Real.

use std::collections::HashMap;

use ecow::EcoString;

use crate::ast::{
    ClassId, ExprKind, Expression, MemberDecl, Program, ResolvedName, Statement, VarId,
};
use crate::source_analysis::{Diagnostic, Span};

use super::program_index::ProgramIndex;
use super::stdlib::standard_library;
use super::types::{array_element_name, is_array_type_name, is_wrapper_type_name, Type};

/// Type checks a program, filling the inferred-type and resolved-method
/// slots in place. Returns the diagnostics of this pass (errors and
/// warnings).
#[must_use]
pub fn check_types(program: &mut Program, index: &mut ProgramIndex) -> Vec<Diagnostic> {
    let mut checker = TypeChecker {
        index,
        diagnostics: Vec::new(),
        var_types: HashMap::new(),
        current_class: ClassId(0),
        current_return: None,
    };
    checker.resolve_signatures(program);
    checker.infer_field_types(program);
    checker.check_bodies(program);
    checker.diagnostics
}

struct TypeChecker<'i> {
    index: &'i mut ProgramIndex,
    diagnostics: Vec<Diagnostic>,
    /// Declared types of parameters, locals, and fields, keyed by their
    /// declaration ids. Written as declarations are typed, read by
    /// identifier uses.
    var_types: HashMap<VarId, Type>,
    current_class: ClassId,
    /// Expected return type of the enclosing method; constructors check
    /// against `Void`. `None` outside bodies.
    current_return: Option<Type>,
}

impl TypeChecker<'_> {
    fn error(&mut self, message: impl Into<EcoString>, span: Span) {
        self.diagnostics.push(Diagnostic::error(message, span));
    }

    fn warning(&mut self, message: impl Into<EcoString>, span: Span) {
        self.diagnostics.push(Diagnostic::warning(message, span));
    }

    // ========================================================================
    // Sub-pass A: signature resolution and field typing
    // ========================================================================

    fn resolve_signatures(&mut self, program: &mut Program) {
        for class_idx in 0..program.classes.len() {
            let class_id = ClassId(class_idx as u32);
            for member_idx in 0..program.classes[class_idx].members.len() {
                match &mut program.classes[class_idx].members[member_idx] {
                    MemberDecl::Method(method) => {
                        let mut params = Vec::with_capacity(method.parameters.len());
                        for param in &mut method.parameters {
                            let type_name = param.type_name.clone();
                            let span = param.span;
                            let resolved = self.resolve_type_name(&type_name, span);
                            if let Some(ty) = &resolved {
                                self.var_types.insert(param.id, ty.clone());
                            }
                            param.resolved_type = resolved.clone();
                            params.push(resolved);
                        }

                        let return_type = match &method.return_type_name {
                            Some(name) => {
                                let name = name.clone();
                                let span = method.span;
                                self.resolve_type_name(&name, span)
                            }
                            None => Some(Type::Void),
                        };
                        method.return_type = return_type.clone();

                        let entry = self.index.entry_mut(class_id);
                        if let Some(method_entry) =
                            entry.methods.iter_mut().find(|m| m.member == member_idx)
                        {
                            method_entry.params = params;
                            method_entry.return_type = return_type;
                        }
                    }
                    MemberDecl::Constructor(ctor) => {
                        let mut params = Vec::with_capacity(ctor.parameters.len());
                        for param in &mut ctor.parameters {
                            let type_name = param.type_name.clone();
                            let span = param.span;
                            let resolved = self.resolve_type_name(&type_name, span);
                            if let Some(ty) = &resolved {
                                self.var_types.insert(param.id, ty.clone());
                            }
                            param.resolved_type = resolved.clone();
                            params.push(resolved);
                        }
                        let entry = self.index.entry_mut(class_id);
                        if let Some(ctor_entry) =
                            entry.constructors.iter_mut().find(|c| c.member == member_idx)
                        {
                            ctor_entry.params = params;
                        }
                    }
                    MemberDecl::Variable(_) => {}
                }
            }
        }
    }

    /// Infers every field's type from its initializer before bodies are
    /// checked, so bodies may use fields regardless of declaration order.
    /// Within one class, fields type in declaration order (a field may
    /// reference fields declared above it).
    fn infer_field_types(&mut self, program: &mut Program) {
        for class_idx in 0..program.classes.len() {
            self.current_class = ClassId(class_idx as u32);
            for member_idx in 0..program.classes[class_idx].members.len() {
                let MemberDecl::Variable(field) = &mut program.classes[class_idx].members[member_idx]
                else {
                    continue;
                };
                let ty = self.infer_expression(&mut field.initializer);
                field.declared_type = ty.clone();
                if let Some(ty) = ty {
                    self.var_types.insert(field.id, ty.clone());
                    let entry = self.index.entry_mut(self.current_class);
                    if let Some(field_entry) =
                        entry.fields.iter_mut().find(|f| f.member == member_idx)
                    {
                        field_entry.ty = Some(ty);
                    }
                }
            }
        }
    }

    // ========================================================================
    // Sub-pass B: body checking
    // ========================================================================

    fn check_bodies(&mut self, program: &mut Program) {
        for class_idx in 0..program.classes.len() {
            self.current_class = ClassId(class_idx as u32);
            for member_idx in 0..program.classes[class_idx].members.len() {
                match &mut program.classes[class_idx].members[member_idx] {
                    MemberDecl::Method(method) => {
                        self.current_return = method.return_type.clone();
                        if let Some(body) = &mut method.body {
                            for statement in body {
                                self.check_statement(statement);
                            }
                        }
                        self.current_return = None;
                    }
                    MemberDecl::Constructor(ctor) => {
                        self.current_return = Some(Type::Void);
                        for statement in &mut ctor.body {
                            self.check_statement(statement);
                        }
                        self.current_return = None;
                    }
                    MemberDecl::Variable(_) => {}
                }
            }
        }
    }

    fn check_statement(&mut self, statement: &mut Statement) {
        match statement {
            Statement::Variable(decl) => {
                let ty = self.infer_expression(&mut decl.initializer);
                decl.declared_type = ty.clone();
                if let Some(ty) = ty {
                    self.var_types.insert(decl.id, ty);
                }
            }
            Statement::Assignment(assign) => {
                let span = assign.span;
                let value_span = assign.value.span;
                let value_type = self.infer_expression(&mut assign.value);

                let Some(resolved) = assign.resolved_target else {
                    // Unresolved target was already reported in pass 1.
                    return;
                };
                let target_type = self.type_of_resolved(resolved);
                let Some(target_type) = target_type else {
                    let message =
                        format!("Cannot determine type of variable: {}", assign.target);
                    self.error(message, span);
                    return;
                };
                let Some(value_type) = value_type else {
                    let message = format!(
                        "Cannot determine type of expression in assignment to: {}",
                        assign.target
                    );
                    self.error(message, value_span);
                    return;
                };
                if !value_type.is_compatible_with(&target_type, self.index) {
                    let message = format!(
                        "Type mismatch in assignment for var {}: cannot assign {} to {}",
                        assign.target,
                        value_type.name(),
                        target_type.name()
                    );
                    self.error(message, span);
                }
            }
            Statement::If(if_stmt) => {
                let cond_span = if_stmt.condition.span;
                if let Some(cond_type) = self.infer_expression(&mut if_stmt.condition) {
                    if cond_type != Type::boolean() {
                        let message = format!(
                            "'If' condition must be Boolean, got: {}",
                            cond_type.name()
                        );
                        self.error(message, cond_span);
                    }
                }
                for stmt in &mut if_stmt.then_branch {
                    self.check_statement(stmt);
                }
                if let Some(else_branch) = &mut if_stmt.else_branch {
                    for stmt in else_branch {
                        self.check_statement(stmt);
                    }
                }
            }
            Statement::While(while_loop) => {
                let cond_span = while_loop.condition.span;
                if let Some(cond_type) = self.infer_expression(&mut while_loop.condition) {
                    if cond_type != Type::boolean() {
                        let message = format!(
                            "'While' condition must be Boolean, got: {}",
                            cond_type.name()
                        );
                        self.error(message, cond_span);
                    }
                }
                for stmt in &mut while_loop.body {
                    self.check_statement(stmt);
                }
            }
            Statement::Return(ret) => {
                let span = ret.span;
                let expected = self.current_return.clone();
                match &mut ret.value {
                    None => {
                        if let Some(expected) = expected {
                            if !expected.is_void() {
                                let message = format!(
                                    "Method must return a value of type: {}",
                                    expected.name()
                                );
                                self.error(message, span);
                            }
                        }
                    }
                    Some(value) => {
                        let actual = self.infer_expression(value);
                        match expected {
                            None | Some(Type::Void) => {
                                self.error("Method should not return a value", span);
                            }
                            Some(expected) => {
                                if let Some(actual) = actual {
                                    if !actual.is_compatible_with(&expected, self.index) {
                                        let message = format!(
                                            "Return type mismatch: expected {}, got {}",
                                            expected.name(),
                                            actual.name()
                                        );
                                        self.error(message, span);
                                    }
                                }
                            }
                        }
                    }
                }
            }
            Statement::Expression(expr) => {
                let span = expr.span;
                if let Some(ty) = self.infer_expression(expr) {
                    if !ty.is_void() {
                        let message = format!("Unused result of type {}", ty.name());
                        self.warning(message, span);
                    }
                }
            }
            Statement::Unknown(_) => {}
        }
    }

    // ========================================================================
    // Expression inference
    // ========================================================================

    /// Infers the type of an expression bottom-up, storing it in the node's
    /// `inferred_type` slot. `None` marks an error path (already reported).
    fn infer_expression(&mut self, expression: &mut Expression) -> Option<Type> {
        let ty = if matches!(expression.kind, ExprKind::ConstructorCall { .. }) {
            self.infer_constructor_call(expression)
        } else if matches!(expression.kind, ExprKind::MethodCall { .. }) {
            self.infer_method_call(expression)
        } else if matches!(expression.kind, ExprKind::MemberAccess { .. }) {
            self.infer_member_access(expression)
        } else {
            match &expression.kind {
                ExprKind::IntegerLiteral(_) => Some(Type::integer()),
                ExprKind::RealLiteral(_) => Some(Type::real()),
                ExprKind::BooleanLiteral(_) => Some(Type::boolean()),
                ExprKind::This => {
                    let name = self.index.class_name(self.current_class).clone();
                    Some(Type::class(name, self.current_class))
                }
                ExprKind::Identifier { resolved, .. } => {
                    resolved.and_then(|resolved| self.type_of_resolved(resolved))
                }
                _ => None,
            }
        };
        expression.inferred_type = ty.clone();
        ty
    }

    fn infer_constructor_call(&mut self, expression: &mut Expression) -> Option<Type> {
        let span = expression.span;
        let ExprKind::ConstructorCall {
            class_name,
            arguments,
            resolved_class,
            ..
        } = &mut expression.kind
        else {
            unreachable!("infer_constructor_call on non-constructor expression");
        };
        let class_name = class_name.clone();
        let resolved_class = *resolved_class;

        let mut arg_types = Vec::with_capacity(arguments.len());
        for argument in arguments.iter_mut() {
            arg_types.push(self.infer_expression(argument));
        }

        let class_type = self.resolve_type_name(&class_name, span)?;

        if is_array_type_name(&class_name) {
            self.validate_array_constructor(&arg_types, span);
        } else if is_wrapper_type_name(&class_name) {
            self.validate_wrapper_constructor(&class_name, &arg_types, span);
        } else if class_name == "Printer" {
            if !arg_types.is_empty() {
                let message = format!(
                    "Printer constructor expects no arguments, got {}",
                    arg_types.len()
                );
                self.error(message, span);
            }
        } else {
            self.validate_user_constructor(&class_name, resolved_class, &arg_types, span);
        }

        let ExprKind::ConstructorCall { resolved_type, .. } = &mut expression.kind else {
            unreachable!();
        };
        *resolved_type = Some(class_type.clone());
        Some(class_type)
    }

    /// Built-in wrapper constructors require exactly one argument of the
    /// wrapper's own type; there is no implicit conversion, so
    /// `Integer(Real)` and friends are rejected.
    fn validate_wrapper_constructor(
        &mut self,
        class_name: &str,
        arg_types: &[Option<Type>],
        span: Span,
    ) {
        if arg_types.len() != 1 {
            let message = format!(
                "{class_name} constructor expects 1 argument, got {}",
                arg_types.len()
            );
            self.error(message, span);
            return;
        }
        if let Some(arg) = &arg_types[0] {
            if arg.name() != class_name {
                let message = format!(
                    "{class_name} constructor expects {class_name} argument, got {}",
                    arg.name()
                );
                self.error(message, span);
            }
        }
    }

    fn validate_array_constructor(&mut self, arg_types: &[Option<Type>], span: Span) {
        if arg_types.len() != 1 {
            let message = format!(
                "Array constructor expects 1 argument (size), got {}",
                arg_types.len()
            );
            self.error(message, span);
            return;
        }
        if let Some(arg) = &arg_types[0] {
            if *arg != Type::integer() {
                self.error("Array constructor size must be Integer", span);
            }
        }
    }

    fn validate_user_constructor(
        &mut self,
        class_name: &str,
        resolved_class: Option<ClassId>,
        arg_types: &[Option<Type>],
        span: Span,
    ) {
        let Some(class_id) = resolved_class else {
            return; // unresolved class already reported in pass 1
        };
        let constructors = self.index.entry(class_id).constructors.clone();
        let matches = constructors.iter().any(|ctor| {
            ctor.params.len() == arg_types.len()
                && ctor.params.iter().zip(arg_types).all(|(param, arg)| {
                    match (param, arg) {
                        (Some(param), Some(arg)) => arg.is_compatible_with(param, self.index),
                        // Unknown on either side never disqualifies;
                        // the underlying error is already reported.
                        _ => true,
                    }
                })
        });
        if !matches {
            let message = format!(
                "No matching constructor for {class_name} with {} arguments",
                arg_types.len()
            );
            self.error(message, span);
        }
    }

    fn infer_method_call(&mut self, expression: &mut Expression) -> Option<Type> {
        let span = expression.span;
        let ExprKind::MethodCall {
            target,
            method_name,
            arguments,
            ..
        } = &mut expression.kind
        else {
            unreachable!("infer_method_call on non-call expression");
        };
        let method_name = method_name.clone();

        // Literals must be wrapped: `Integer(5).Plus(…)`, never `5.Plus(…)`.
        if target.is_syntactic_literal() {
            let target_span = target.span;
            self.error("Cannot call method on literal directly", target_span);
            return None;
        }

        let target_span = target.span;
        let target_type = self.infer_expression(target);
        let Some(target_type) = target_type else {
            self.error("Cannot determine type of method call target", target_span);
            return None;
        };

        let mut arg_types = Vec::with_capacity(arguments.len());
        let mut arg_spans = Vec::with_capacity(arguments.len());
        for argument in arguments.iter_mut() {
            arg_spans.push(argument.span);
            arg_types.push(self.infer_expression(argument));
        }

        let result = match &target_type {
            Type::Array(element) => {
                let element = (**element).clone();
                self.check_array_method(&method_name, &element, &arg_types, &arg_spans, span)
            }
            Type::Class { name, .. } if name == "Printer" => {
                self.check_printer_method(&method_name, &arg_types, span)
            }
            Type::Class { name, .. } if matches!(name.as_str(), "Integer" | "Boolean" | "Real") => {
                match standard_library().find_method(name, &method_name, &arg_types) {
                    Some(method) => Some(method.return_type.clone()),
                    None => {
                        let message = format!(
                            "No built-in method {}.{} with {} arguments",
                            name,
                            method_name,
                            arg_types.len()
                        );
                        self.error(message, span);
                        None
                    }
                }
            }
            _ => {
                let resolved =
                    self.resolve_user_method(&target_type, &method_name, &arg_types, span);
                match resolved {
                    Some((method_ref, return_type)) => {
                        let ExprKind::MethodCall {
                            resolved_method, ..
                        } = &mut expression.kind
                        else {
                            unreachable!();
                        };
                        *resolved_method = Some(method_ref);
                        return_type
                    }
                    None => None,
                }
            }
        };
        result
    }

    fn check_array_method(
        &mut self,
        method_name: &str,
        element: &Type,
        arg_types: &[Option<Type>],
        arg_spans: &[Span],
        span: Span,
    ) -> Option<Type> {
        match method_name {
            "get" => {
                if arg_types.len() != 1 {
                    let message =
                        format!("Array.get expects 1 argument, got {}", arg_types.len());
                    self.error(message, span);
                    return None;
                }
                if let Some(index_type) = &arg_types[0] {
                    if *index_type != Type::integer() {
                        self.error("Array.get index must be Integer", arg_spans[0]);
                        return None;
                    }
                }
                Some(element.clone())
            }
            "set" => {
                if arg_types.len() != 2 {
                    let message =
                        format!("Array.set expects 2 arguments, got {}", arg_types.len());
                    self.error(message, span);
                    return None;
                }
                if let Some(index_type) = &arg_types[0] {
                    if *index_type != Type::integer() {
                        self.error("Array.set index must be Integer", arg_spans[0]);
                        return None;
                    }
                }
                if let Some(value_type) = &arg_types[1] {
                    if !value_type.is_compatible_with(element, self.index) {
                        let message = format!(
                            "Array.set value type mismatch: expected {}, got {}",
                            element.name(),
                            value_type.name()
                        );
                        self.error(message, arg_spans[1]);
                        return None;
                    }
                }
                Some(Type::Void)
            }
            "Length" => {
                if !arg_types.is_empty() {
                    self.error("Array.Length expects 0 arguments", span);
                    return None;
                }
                Some(Type::integer())
            }
            other => {
                let message = format!("Unknown array method: {other}");
                self.error(message, span);
                None
            }
        }
    }

    /// `Printer.print` takes exactly one argument of any value type; the
    /// emitter selects the output overload from the argument's static type.
    fn check_printer_method(
        &mut self,
        method_name: &str,
        arg_types: &[Option<Type>],
        span: Span,
    ) -> Option<Type> {
        if method_name != "print" || arg_types.len() != 1 {
            let message = format!(
                "No built-in method Printer.{} with {} arguments",
                method_name,
                arg_types.len()
            );
            self.error(message, span);
            return None;
        }
        match &arg_types[0] {
            Some(ty) if ty.is_void() => {
                self.error("Printer.print argument has no value", span);
                None
            }
            Some(_) => Some(Type::Void),
            None => None,
        }
    }

    fn resolve_user_method(
        &mut self,
        target_type: &Type,
        method_name: &str,
        arg_types: &[Option<Type>],
        span: Span,
    ) -> Option<(crate::ast::MethodRef, Option<Type>)> {
        let Some(class_id) = target_type.class_decl() else {
            let message = format!("Cannot call methods on type: {}", target_type.name());
            self.error(message, span);
            return None;
        };

        // Exact textual signature first ("?" stands in for unknown types).
        let arg_names: Vec<EcoString> = arg_types
            .iter()
            .map(|ty| ty.as_ref().map_or_else(|| EcoString::from("?"), Type::name))
            .collect();
        let signature = crate::ast::signature_of(
            method_name,
            arg_names.iter().map(EcoString::as_str),
        );

        if let Some((method_ref, entry)) = self.index.find_method(class_id, &signature) {
            return Some((method_ref, entry.return_type.clone()));
        }

        // Fall back to name-based candidates with per-argument compatibility,
        // subclass-first; the first match wins.
        let candidates = self.index.methods_named(class_id, method_name);
        let mut chosen = None;
        for (method_ref, entry) in candidates {
            if entry.params.len() != arg_types.len() {
                continue;
            }
            let compatible = entry.params.iter().zip(arg_types).all(|(param, arg)| {
                match (param, arg) {
                    (Some(param), Some(arg)) => arg.is_compatible_with(param, self.index),
                    _ => true,
                }
            });
            if compatible {
                chosen = Some((method_ref, entry.return_type.clone()));
                break;
            }
        }
        if let Some((method_ref, return_type)) = chosen {
            if return_type.is_none() {
                let message = format!("Method return type not resolved: {method_name}");
                self.error(message, span);
            }
            return Some((method_ref, return_type));
        }

        let message = format!(
            "No matching method found: {} in class {}",
            signature,
            self.index.class_name(class_id)
        );
        self.error(message, span);
        None
    }

    fn infer_member_access(&mut self, expression: &mut Expression) -> Option<Type> {
        let span = expression.span;
        let ExprKind::MemberAccess {
            target,
            member_name,
            ..
        } = &mut expression.kind
        else {
            unreachable!("infer_member_access on non-member expression");
        };
        let member_name = member_name.clone();

        let target_type = self.infer_expression(target)?;

        let Some(class_id) = target_type.class_decl() else {
            let message = format!(
                "Cannot access members of built-in type: {}",
                target_type.name()
            );
            self.error(message, span);
            return None;
        };

        let Some((field_ref, entry)) = self.index.find_field(class_id, &member_name) else {
            let message = format!(
                "Class {} has no field: {}",
                self.index.class_name(class_id),
                member_name
            );
            self.error(message, span);
            return None;
        };
        let field_type = entry.ty.clone();

        let ExprKind::MemberAccess { resolved_field, .. } = &mut expression.kind else {
            unreachable!();
        };
        *resolved_field = Some(field_ref);
        field_type
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn type_of_resolved(&self, resolved: ResolvedName) -> Option<Type> {
        match resolved {
            ResolvedName::Local(var) => self.var_types.get(&var).cloned(),
            ResolvedName::Field(field_ref) => self
                .index
                .entry(field_ref.class)
                .fields
                .iter()
                .find(|f| f.member == field_ref.member)
                .and_then(|f| f.ty.clone()),
        }
    }

    /// Resolves a declared type name: a built-in name, an `Array[T]` form
    /// whose inner name recursively resolves, or a registered class.
    fn resolve_type_name(&mut self, name: &str, span: Span) -> Option<Type> {
        if let Some(inner) = array_element_name(name) {
            let element = self.resolve_type_name(inner, span)?;
            return Some(Type::array(element));
        }
        match name {
            "Integer" => return Some(Type::integer()),
            "Boolean" => return Some(Type::boolean()),
            "Real" => return Some(Type::real()),
            "Printer" => return Some(Type::printer()),
            _ => {}
        }
        if let Some(id) = self.index.class_id(name) {
            return Some(Type::class(self.index.class_name(id).clone(), id));
        }
        self.error(format!("Unknown type: {name}"), span);
        None
    }
}
