// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Symbol table construction and name resolution (semantic pass 1).
//!
//! Three sub-passes over the program:
//!
//! 1. **Class registration** - every class goes into the global scope
//!    (duplicates reported), base-class links are wired up (self-extension,
//!    missing bases, and extending built-ins reported), and circular
//!    inheritance is detected with a visited-set walk.
//! 2. **Member tables** - fields, methods (keyed by textual signature), and
//!    constructors are registered per class; duplicates reported. A method
//!    with a body replaces a prior bodiless forward declaration under the
//!    same signature.
//! 3. **Body resolution** - every identifier in member bodies is resolved to
//!    a parameter/local binding or an (inherited) field; constructor-call
//!    class names are resolved; misuse of `this` is reported. Method and
//!    member-name resolution is deferred to the type checker, which needs
//!    inferred target types.

use ecow::EcoString;

use crate::ast::{
    ClassId, ExprKind, Expression, MemberDecl, Program, ResolvedName, Statement, VariableDecl,
};
use crate::source_analysis::{Diagnostic, Span};

use super::program_index::{CtorEntry, FieldEntry, MethodEntry, ProgramIndex};
use super::scope::{GlobalScope, GlobalSymbol, Scope};
use super::types::{array_element_name, is_array_type_name, Type};

/// Builds the symbol tables for a parsed program and resolves all names in
/// member bodies.
///
/// Returns the program index (consumed by the type checker and the emitter)
/// and the diagnostics of this pass.
#[must_use]
pub fn build_symbol_table(program: &mut Program) -> (ProgramIndex, Vec<Diagnostic>) {
    let mut builder = SymbolTableBuilder {
        index: ProgramIndex::default(),
        global: GlobalScope::new(),
        scope: Scope::new(),
        diagnostics: Vec::new(),
        current_class: ClassId(0),
        in_member_body: false,
    };
    builder.register_classes(program);
    builder.build_member_tables(program);
    builder.resolve_bodies(program);
    (builder.index, builder.diagnostics)
}

struct SymbolTableBuilder {
    index: ProgramIndex,
    global: GlobalScope,
    scope: Scope,
    diagnostics: Vec<Diagnostic>,
    current_class: ClassId,
    in_member_body: bool,
}

impl SymbolTableBuilder {
    fn error(&mut self, message: impl Into<EcoString>, span: Span) {
        self.diagnostics.push(Diagnostic::error(message, span));
    }

    // ========================================================================
    // Sub-pass 1: class registration and inheritance wiring
    // ========================================================================

    fn register_classes(&mut self, program: &mut Program) {
        for class in &program.classes {
            let (id, _) = self.index.register_class(class.name.clone());
            if !self.global.define(class.name.clone(), id) {
                self.error(
                    format!("Duplicate class: {}", class.name),
                    class.name_span,
                );
            }
        }

        for idx in 0..program.classes.len() {
            let class = &program.classes[idx];
            let Some(base_name) = class.base_name.clone() else {
                continue;
            };
            let base_span = class.base_span.unwrap_or(class.name_span);

            if base_name == class.name {
                self.error(
                    format!("Class cannot extend itself: {}", class.name),
                    base_span,
                );
                continue;
            }
            match self.global.resolve(&base_name) {
                None => {
                    self.error(format!("Parent class not found: {base_name}"), base_span);
                }
                Some(GlobalSymbol::BuiltIn(_)) => {
                    self.error(
                        format!("Cannot extend built-in type: {base_name}"),
                        base_span,
                    );
                }
                Some(GlobalSymbol::Class(base_id)) => {
                    let base_id = *base_id;
                    program.classes[idx].base_class = Some(base_id);
                    self.index.entry_mut(ClassId(idx as u32)).base = Some(base_id);
                }
            }
        }

        for (idx, class) in program.classes.iter().enumerate() {
            let id = ClassId(idx as u32);
            if class.base_class.is_some() && self.index.has_circular_inheritance(id) {
                self.error(
                    format!("Circular inheritance detected for class: {}", class.name),
                    class.name_span,
                );
            }
        }
    }

    // ========================================================================
    // Sub-pass 2: member tables
    // ========================================================================

    fn build_member_tables(&mut self, program: &Program) {
        for (idx, class) in program.classes.iter().enumerate() {
            let class_id = ClassId(idx as u32);
            for (member_idx, member) in class.members.iter().enumerate() {
                match member {
                    MemberDecl::Variable(field) => {
                        self.register_field(class_id, field, member_idx);
                    }
                    MemberDecl::Method(method) => {
                        self.register_method(class_id, class, method, member_idx);
                    }
                    MemberDecl::Constructor(ctor) => {
                        let signature = ctor.signature();
                        let entry = self.index.entry_mut(class_id);
                        if entry.constructors.iter().any(|c| c.signature == signature) {
                            self.error(
                                format!("Duplicate constructor with signature: {signature}"),
                                ctor.span,
                            );
                        } else {
                            entry.constructors.push(CtorEntry {
                                signature,
                                member: member_idx,
                                params: vec![None; ctor.parameters.len()],
                            });
                        }
                    }
                }
            }
        }
    }

    fn register_field(&mut self, class_id: ClassId, field: &VariableDecl, member_idx: usize) {
        let entry = self.index.entry_mut(class_id);
        if entry.fields.iter().any(|f| f.name == field.name) {
            self.error(format!("Duplicate field: {}", field.name), field.span);
        } else {
            entry.fields.push(FieldEntry {
                name: field.name.clone(),
                var: field.id,
                member: member_idx,
                ty: None,
            });
        }
    }

    fn register_method(
        &mut self,
        class_id: ClassId,
        class: &crate::ast::ClassDecl,
        method: &crate::ast::MethodDecl,
        member_idx: usize,
    ) {
        let signature = method.signature();
        let existing = self
            .index
            .entry(class_id)
            .methods
            .iter()
            .position(|m| m.signature == signature);

        if let Some(pos) = existing {
            let prior_member = self.index.entry(class_id).methods[pos].member;
            let prior_has_body = matches!(
                &class.members[prior_member],
                MemberDecl::Method(m) if m.body.is_some()
            );
            if !prior_has_body && method.body.is_some() {
                // A definition replaces its forward declaration.
                self.index.entry_mut(class_id).methods[pos].member = member_idx;
            } else {
                self.error(format!("Duplicate method: {signature}"), method.span);
            }
        } else {
            self.index.entry_mut(class_id).methods.push(MethodEntry {
                signature,
                name: method.name.clone(),
                member: member_idx,
                params: vec![None; method.parameters.len()],
                return_type: None,
            });
        }
    }

    // ========================================================================
    // Sub-pass 3: name resolution in bodies
    // ========================================================================

    fn resolve_bodies(&mut self, program: &mut Program) {
        for class_idx in 0..program.classes.len() {
            self.current_class = ClassId(class_idx as u32);
            for member_idx in 0..program.classes[class_idx].members.len() {
                match &mut program.classes[class_idx].members[member_idx] {
                    MemberDecl::Variable(field) => {
                        // Field initializers resolve against the class's
                        // field tables only; no local scope, no `this`.
                        self.in_member_body = false;
                        self.resolve_expression(&mut field.initializer);
                    }
                    MemberDecl::Method(method) => {
                        self.in_member_body = true;
                        self.scope.push();
                        for param in &method.parameters {
                            if !self.scope.define(param.name.clone(), param.id) {
                                let message = format!("Duplicate parameter: {}", param.name);
                                let span = param.span;
                                self.error(message, span);
                            }
                        }
                        if let Some(body) = &mut method.body {
                            for statement in body {
                                self.resolve_statement(statement);
                            }
                        }
                        self.scope.pop();
                    }
                    MemberDecl::Constructor(ctor) => {
                        self.in_member_body = true;
                        self.scope.push();
                        for param in &ctor.parameters {
                            if !self.scope.define(param.name.clone(), param.id) {
                                let message = format!("Duplicate parameter: {}", param.name);
                                let span = param.span;
                                self.error(message, span);
                            }
                        }
                        for statement in &mut ctor.body {
                            self.resolve_statement(statement);
                        }
                        self.scope.pop();
                    }
                }
            }
        }
    }

    fn resolve_statement(&mut self, statement: &mut Statement) {
        match statement {
            Statement::Variable(decl) => {
                // The name is visible to its own initializer, matching the
                // single-scope-per-body model.
                if !self.scope.define(decl.name.clone(), decl.id) {
                    let message = format!("Variable already declared: {}", decl.name);
                    let span = decl.span;
                    self.error(message, span);
                }
                self.resolve_expression(&mut decl.initializer);
            }
            Statement::Assignment(assign) => {
                match self.resolve_name(&assign.target) {
                    Some(resolved) => assign.resolved_target = Some(resolved),
                    None => {
                        let message = format!("Undefined variable: {}", assign.target);
                        let span = assign.span;
                        self.error(message, span);
                    }
                }
                self.resolve_expression(&mut assign.value);
            }
            Statement::If(if_stmt) => {
                self.resolve_expression(&mut if_stmt.condition);
                for stmt in &mut if_stmt.then_branch {
                    self.resolve_statement(stmt);
                }
                if let Some(else_branch) = &mut if_stmt.else_branch {
                    for stmt in else_branch {
                        self.resolve_statement(stmt);
                    }
                }
            }
            Statement::While(while_loop) => {
                self.resolve_expression(&mut while_loop.condition);
                for stmt in &mut while_loop.body {
                    self.resolve_statement(stmt);
                }
            }
            Statement::Return(ret) => {
                if let Some(value) = &mut ret.value {
                    self.resolve_expression(value);
                }
            }
            Statement::Expression(expr) => self.resolve_expression(expr),
            Statement::Unknown(_) => {}
        }
    }

    fn resolve_expression(&mut self, expression: &mut Expression) {
        let span = expression.span;
        match &mut expression.kind {
            ExprKind::Identifier { name, resolved } => match self.resolve_name(name) {
                Some(found) => *resolved = Some(found),
                None => {
                    let message = format!("Undefined identifier: {name}");
                    self.error(message, span);
                }
            },
            ExprKind::ConstructorCall {
                class_name,
                arguments,
                resolved_class,
                resolved_type,
            } => {
                if is_array_type_name(class_name) {
                    let class_name = class_name.clone();
                    if let Some(ty) = self.resolve_array_type(&class_name, span) {
                        *resolved_type = Some(ty);
                    }
                } else {
                    match self.global.resolve(class_name) {
                        Some(GlobalSymbol::Class(id)) => *resolved_class = Some(*id),
                        Some(GlobalSymbol::BuiltIn(_)) => {}
                        None => {
                            let message = format!("Unknown class: {class_name}");
                            self.error(message, span);
                        }
                    }
                }
                for argument in arguments {
                    self.resolve_expression(argument);
                }
            }
            ExprKind::MethodCall {
                target, arguments, ..
            } => {
                self.resolve_expression(target);
                for argument in arguments {
                    self.resolve_expression(argument);
                }
                // Method resolution needs the target's inferred type and
                // happens in the type checker.
            }
            ExprKind::MemberAccess { target, .. } => {
                self.resolve_expression(target);
            }
            ExprKind::This => {
                if !self.in_member_body {
                    self.error("'this' cannot be used outside a method", span);
                }
            }
            ExprKind::IntegerLiteral(_)
            | ExprKind::RealLiteral(_)
            | ExprKind::BooleanLiteral(_)
            | ExprKind::Unknown => {}
        }
    }

    /// Resolves a bare name: the local scope chain first, then the enclosing
    /// class's field tables (walking the inheritance chain).
    fn resolve_name(&self, name: &str) -> Option<ResolvedName> {
        if let Some(var) = self.scope.resolve(name) {
            return Some(ResolvedName::Local(var));
        }
        self.index
            .find_field(self.current_class, name)
            .map(|(field_ref, _)| ResolvedName::Field(field_ref))
    }

    /// Resolves a synthetic `Array[…]` type name to a type, reporting
    /// unknown element types.
    fn resolve_array_type(&mut self, name: &str, span: Span) -> Option<Type> {
        if let Some(inner) = array_element_name(name) {
            let element = self.resolve_array_type(inner, span)?;
            return Some(Type::array(element));
        }
        match self.global.resolve(name) {
            Some(GlobalSymbol::BuiltIn(ty)) => Some(ty.clone()),
            Some(GlobalSymbol::Class(id)) => {
                Some(Type::class(self.index.class_name(*id).clone(), *id))
            }
            None => {
                self.error(format!("Unknown type: {name}"), span);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::{lex, parse};

    fn analyse(source: &str) -> (Program, ProgramIndex, Vec<Diagnostic>) {
        let (tokens, lex_diags) = lex(source);
        assert!(lex_diags.is_empty(), "lexical errors: {lex_diags:?}");
        let (mut program, parse_diags) = parse(tokens);
        assert!(parse_diags.is_empty(), "parse errors: {parse_diags:?}");
        let (index, diagnostics) = build_symbol_table(&mut program);
        (program, index, diagnostics)
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics.iter().map(|d| d.message.to_string()).collect()
    }

    #[test]
    fn registers_classes_and_links_bases() {
        let (program, index, diagnostics) =
            analyse("class Base is end class Derived extends Base is end");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(index.class_count(), 2);
        assert_eq!(program.classes[1].base_class, Some(ClassId(0)));
        assert_eq!(index.entry(ClassId(1)).base, Some(ClassId(0)));
    }

    #[test]
    fn duplicate_class_is_reported() {
        let (_, _, diagnostics) = analyse("class A is end class A is end");
        assert!(messages(&diagnostics).contains(&"Duplicate class: A".to_string()));
    }

    #[test]
    fn class_shadowing_builtin_is_a_duplicate() {
        let (_, _, diagnostics) = analyse("class Integer is end");
        assert!(messages(&diagnostics).contains(&"Duplicate class: Integer".to_string()));
    }

    #[test]
    fn self_extension_is_reported() {
        let (_, _, diagnostics) = analyse("class A extends A is end");
        assert!(messages(&diagnostics).contains(&"Class cannot extend itself: A".to_string()));
    }

    #[test]
    fn missing_base_is_reported() {
        let (_, _, diagnostics) = analyse("class A extends Ghost is end");
        assert!(messages(&diagnostics).contains(&"Parent class not found: Ghost".to_string()));
    }

    #[test]
    fn extending_builtin_is_reported() {
        let (_, _, diagnostics) = analyse("class A extends Integer is end");
        assert!(
            messages(&diagnostics).contains(&"Cannot extend built-in type: Integer".to_string())
        );
    }

    #[test]
    fn circular_inheritance_is_reported_per_participant() {
        let (_, _, diagnostics) =
            analyse("class A extends B is end class B extends A is end");
        let msgs = messages(&diagnostics);
        assert!(msgs.contains(&"Circular inheritance detected for class: A".to_string()));
        assert!(msgs.contains(&"Circular inheritance detected for class: B".to_string()));
    }

    #[test]
    fn duplicate_field_is_reported() {
        let (_, _, diagnostics) =
            analyse("class A is var x : Integer(1) var x : Integer(2) end");
        assert!(messages(&diagnostics).contains(&"Duplicate field: x".to_string()));
    }

    #[test]
    fn duplicate_method_signature_is_reported() {
        let (_, _, diagnostics) = analyse(
            "class A is method m(a : Integer) is end method m(b : Integer) is end end",
        );
        assert!(messages(&diagnostics).contains(&"Duplicate method: m(Integer)".to_string()));
    }

    #[test]
    fn overloads_with_different_signatures_coexist() {
        let (_, index, diagnostics) =
            analyse("class A is method m(a : Integer) is end method m(a : Real) is end end");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(index.entry(ClassId(0)).methods.len(), 2);
    }

    #[test]
    fn definition_replaces_forward_declaration() {
        let (_, index, diagnostics) = analyse(
            "class A is method m() : Integer method m() : Integer is return Integer(1) end end",
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let entry = index.entry(ClassId(0));
        assert_eq!(entry.methods.len(), 1);
        // The registered member is the definition (member index 1)
        assert_eq!(entry.methods[0].member, 1);
    }

    #[test]
    fn second_definition_after_forward_and_body_is_duplicate() {
        let (_, _, diagnostics) = analyse(
            "class A is method m() is end method m() is end end",
        );
        assert!(messages(&diagnostics).contains(&"Duplicate method: m()".to_string()));
    }

    #[test]
    fn duplicate_constructor_is_reported() {
        let (_, _, diagnostics) = analyse(
            "class A is this(n : Integer) is end this(m : Integer) is end end",
        );
        assert!(messages(&diagnostics)
            .contains(&"Duplicate constructor with signature: this(Integer)".to_string()));
    }

    #[test]
    fn duplicate_parameter_is_reported() {
        let (_, _, diagnostics) =
            analyse("class A is method m(x : Integer, x : Integer) is end end");
        assert!(messages(&diagnostics).contains(&"Duplicate parameter: x".to_string()));
    }

    #[test]
    fn identifiers_resolve_to_parameters_and_locals() {
        let (program, _, diagnostics) = analyse(
            "class A is method m(p : Integer) : Integer is var x : Integer(1) return x.Plus(p) end end",
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let MemberDecl::Method(method) = &program.classes[0].members[0] else {
            panic!("expected method");
        };
        let body = method.body.as_ref().unwrap();
        let Statement::Return(ret) = &body[1] else {
            panic!("expected return");
        };
        let ExprKind::MethodCall { target, arguments, .. } = &ret.value.as_ref().unwrap().kind
        else {
            panic!("expected call");
        };
        assert!(matches!(
            target.kind,
            ExprKind::Identifier { resolved: Some(ResolvedName::Local(_)), .. }
        ));
        assert!(matches!(
            arguments[0].kind,
            ExprKind::Identifier { resolved: Some(ResolvedName::Local(_)), .. }
        ));
    }

    #[test]
    fn identifiers_resolve_to_inherited_fields() {
        let (program, _, diagnostics) = analyse(
            "class Base is var x : Integer(10) this() is end end \
             class Derived extends Base is method getX() : Integer is return x end this() is end end",
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let MemberDecl::Method(method) = &program.classes[1].members[0] else {
            panic!("expected method");
        };
        let Statement::Return(ret) = &method.body.as_ref().unwrap()[0] else {
            panic!("expected return");
        };
        let ExprKind::Identifier { resolved, .. } = &ret.value.as_ref().unwrap().kind else {
            panic!("expected identifier");
        };
        let Some(ResolvedName::Field(field_ref)) = resolved else {
            panic!("expected field resolution, got {resolved:?}");
        };
        assert_eq!(field_ref.class, ClassId(0), "field declared on Base");
    }

    #[test]
    fn undefined_identifier_is_reported() {
        let (_, _, diagnostics) =
            analyse("class A is method m() is var x : ghost end end");
        assert!(messages(&diagnostics).contains(&"Undefined identifier: ghost".to_string()));
    }

    #[test]
    fn undefined_assignment_target_is_reported() {
        let (_, _, diagnostics) =
            analyse("class A is method m() is ghost := Integer(1) end end");
        assert!(messages(&diagnostics).contains(&"Undefined variable: ghost".to_string()));
    }

    #[test]
    fn local_redeclaration_is_reported() {
        let (_, _, diagnostics) = analyse(
            "class A is method m() is var x : Integer(1) var x : Integer(2) end end",
        );
        assert!(messages(&diagnostics).contains(&"Variable already declared: x".to_string()));
    }

    #[test]
    fn unknown_constructor_class_is_reported() {
        let (_, _, diagnostics) =
            analyse("class A is method m() is var x : Ghost(1) end end");
        assert!(messages(&diagnostics).contains(&"Unknown class: Ghost".to_string()));
    }

    #[test]
    fn builtin_constructor_calls_resolve_silently() {
        let (_, _, diagnostics) = analyse(
            "class A is method m() is var x : Integer(1) var p : Printer() end end",
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn array_constructor_resolves_element_type() {
        let (program, _, diagnostics) =
            analyse("class A is method m() is var xs : Array[Integer](10) end end");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let MemberDecl::Method(method) = &program.classes[0].members[0] else {
            panic!("expected method");
        };
        let Statement::Variable(decl) = &method.body.as_ref().unwrap()[0] else {
            panic!("expected variable");
        };
        let ExprKind::ConstructorCall { resolved_type, .. } = &decl.initializer.kind else {
            panic!("expected constructor call");
        };
        assert_eq!(resolved_type.as_ref().unwrap(), &Type::array(Type::integer()));
    }

    #[test]
    fn array_of_unknown_type_is_reported() {
        let (_, _, diagnostics) =
            analyse("class A is method m() is var xs : Array[Ghost](10) end end");
        assert!(messages(&diagnostics).contains(&"Unknown type: Ghost".to_string()));
    }

    #[test]
    fn this_in_field_initializer_is_reported() {
        let (_, _, diagnostics) = analyse("class A is var x : this end");
        assert!(messages(&diagnostics)
            .contains(&"'this' cannot be used outside a method".to_string()));
    }

    #[test]
    fn this_in_method_body_is_fine() {
        let (_, _, diagnostics) =
            analyse("class A is method m() : A is return this end end");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn field_initializers_may_reference_fields() {
        let (_, _, diagnostics) = analyse(
            "class A is var x : Integer(1) var y : x.Plus(Integer(1)) end",
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }
}
