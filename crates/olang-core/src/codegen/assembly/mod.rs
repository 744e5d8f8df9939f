// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Lowering from the analysed AST to stack-VM assembly text.
//!
//! One file is produced per class: a header (`.class`/`.super`), a field
//! declaration per member variable, then a constructor per `this(…)` and a
//! method per method declaration. Method bodies are lowered into a
//! temporary buffer while a [`MethodContext`] tracks local slots and the
//! symbolic operand-stack depth; the measured limits are then emitted ahead
//! of the body text.
//!
//! # Stack accounting
//!
//! The symbolic depth is kept exact: every emitted instruction is paired
//! with its push/pop effect. Statements must be stack-neutral, a value
//! expression must add exactly its width, and a discarded result is
//! explicitly popped. Violations abort code generation with an internal
//! error - they are emitter bugs, not user errors.
//!
//! # Built-in lowering
//!
//! Wrapper values never allocate: `Integer(42)` is a constant push, and the
//! wrapper's methods map to primitive instructions (`iadd`, `dcmpg` + a
//! short branch producing `0`/`1`, …). `Printer` is a placeholder object
//! (`aconst_null`); `print` fetches the host VM's standard output object
//! and selects a `println` overload from the argument's static type.

mod instructions;
mod method_context;

pub use instructions::AssemblyWriter;
pub use method_context::MethodContext;

use ecow::EcoString;

use crate::ast::{
    ClassDecl, ClassId, ConstructorDecl, ExprKind, Expression, FieldRef, MemberDecl, MethodDecl,
    Parameter, Program, ResolvedName, Statement, VariableDecl,
};
use crate::semantic_analysis::program_index::ProgramIndex;
use crate::semantic_analysis::types::{is_wrapper_type_name, Type};

use super::{CodeGenError, Result};

/// The implicit root class every base-less class extends.
pub const ROOT_CLASS: &str = "Object";

/// The class of the host VM's standard output object.
const OUTPUT_CLASS: &str = "PrintStream";

/// The static field holding the standard output object.
const OUTPUT_FIELD: &str = "System/out";

/// Name of the synthesized entry-point class.
const ENTRY_CLASS: &str = "Main";

/// One emitted assembly file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyFile {
    /// The class name; the file on disk is `<class_name>.assembly`.
    pub class_name: EcoString,
    /// The assembly text.
    pub text: String,
}

/// Generates assembly for every class in the program, plus the synthetic
/// entry-point file when a `Start` class qualifies.
///
/// # Errors
///
/// Returns [`CodeGenError`] when the tree violates the post-analysis
/// invariants (unresolved slots, missing inferred types) or when stack
/// accounting detects an emitter bug.
pub fn generate(program: &Program, index: &ProgramIndex) -> Result<Vec<AssemblyFile>> {
    let mut files = Vec::with_capacity(program.classes.len() + 1);
    for class in &program.classes {
        let emitter = ClassEmitter {
            program,
            index,
            class,
            writer: AssemblyWriter::new(),
            section: Section::ClassHeader,
        };
        files.push(emitter.emit()?);
    }
    if let Some(entry) = generate_entry_point(program)? {
        files.push(entry);
    }
    Ok(files)
}

/// Emission phases of a class file, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    ClassHeader,
    FieldSection,
    MemberSection,
    Closed,
}

struct ClassEmitter<'a> {
    program: &'a Program,
    index: &'a ProgramIndex,
    class: &'a ClassDecl,
    writer: AssemblyWriter,
    section: Section,
}

impl ClassEmitter<'_> {
    fn emit(mut self) -> Result<AssemblyFile> {
        self.advance(Section::FieldSection)?;
        self.writer
            .class_header(&self.class.name, self.class.base_name.as_deref());

        self.advance(Section::MemberSection)?;
        for (_, field) in self.class.fields() {
            let ty = field.declared_type.as_ref().ok_or_else(|| {
                unresolved("field type", &self.class.name, &field.name)
            })?;
            self.writer.field(&field.name, &ty.descriptor());
        }
        self.writer.blank();

        for (_, ctor) in self.class.constructors() {
            self.emit_constructor(ctor)?;
        }
        for (_, method) in self.class.methods() {
            // A forward declaration that never got a definition has nothing
            // to emit.
            if method.body.is_some() {
                self.emit_method(method)?;
            }
        }

        self.advance(Section::Closed)?;
        Ok(AssemblyFile {
            class_name: self.class.name.clone(),
            text: self.writer.into_code(),
        })
    }

    /// Enforces the header → fields → members → closed ordering.
    fn advance(&mut self, next: Section) -> Result<()> {
        let expected = match next {
            Section::ClassHeader => None,
            Section::FieldSection => Some(Section::ClassHeader),
            Section::MemberSection => Some(Section::FieldSection),
            Section::Closed => Some(Section::MemberSection),
        };
        if expected == Some(self.section) {
            self.section = next;
            Ok(())
        } else {
            Err(CodeGenError::Internal(format!(
                "class emitter for {} moved to {next:?} from {:?}",
                self.class.name, self.section
            )))
        }
    }

    fn emit_constructor(&mut self, ctor: &ConstructorDecl) -> Result<()> {
        let descriptor = format!(
            "({})V",
            parameter_descriptors(&ctor.parameters, &self.class.name, "<init>")?
        );

        let mut body = BodyEmitter::new(self.program, self.index, self.class, "<init>");
        for param in &ctor.parameters {
            body.add_parameter(param)?;
        }

        // Base constructor first, then field initialization, then the body.
        body.out.instr("aload_0");
        body.ctx.push(1);
        let parent = self.class.base_name.as_deref().unwrap_or(ROOT_CLASS);
        body.out.invoke(parent, "<init>", "()V", "special");
        body.ctx.pop(1)?;

        for (_, field) in self.class.fields() {
            body.emit_field_initializer(field)?;
        }

        for statement in &ctor.body {
            body.lower_statement(statement)?;
        }
        body.out.return_op('v');

        self.write_member("<init>", &descriptor, body);
        Ok(())
    }

    fn emit_method(&mut self, method: &MethodDecl) -> Result<()> {
        let descriptor = method_descriptor(method, &self.class.name)?;
        let return_type = method
            .return_type
            .as_ref()
            .ok_or_else(|| unresolved("return type", &self.class.name, &method.name))?;

        let mut body =
            BodyEmitter::new(self.program, self.index, self.class, method.name.as_str());
        for param in &method.parameters {
            body.add_parameter(param)?;
        }

        if let Some(statements) = &method.body {
            for statement in statements {
                body.lower_statement(statement)?;
            }
        }
        if return_type.is_void() {
            body.out.return_op('v');
        }

        self.write_member(&method.name, &descriptor, body);
        Ok(())
    }

    /// Prepends the measured limits to the body text and appends it to the
    /// class file.
    fn write_member(&mut self, name: &str, descriptor: &str, body: BodyEmitter<'_>) {
        self.writer.method_header(name, descriptor, false);
        self.writer
            .limits(body.ctx.max_depth(), body.ctx.max_locals());
        self.writer.splice(body.out.code());
        self.writer.method_footer();
    }
}

// ============================================================================
// Method-body lowering
// ============================================================================

struct BodyEmitter<'a> {
    program: &'a Program,
    index: &'a ProgramIndex,
    class: &'a ClassDecl,
    ctx: MethodContext,
    out: AssemblyWriter,
}

impl<'a> BodyEmitter<'a> {
    fn new(
        program: &'a Program,
        index: &'a ProgramIndex,
        class: &'a ClassDecl,
        method_name: &str,
    ) -> Self {
        Self {
            program,
            index,
            class,
            ctx: MethodContext::new(class.name.clone(), method_name, false),
            out: AssemblyWriter::body(),
        }
    }

    fn add_parameter(&mut self, param: &Parameter) -> Result<()> {
        let ty = param
            .resolved_type
            .as_ref()
            .ok_or_else(|| unresolved("parameter type", &self.class.name, &param.name))?;
        self.ctx.allocate(&param.name, ty.is_wide());
        Ok(())
    }

    fn unresolved(&self, what: &str) -> CodeGenError {
        CodeGenError::UnresolvedSlot {
            what: what.to_string(),
            location: self.ctx.location(),
        }
    }

    fn internal(&self, message: impl std::fmt::Display) -> CodeGenError {
        CodeGenError::Internal(format!("{} in {}", message, self.ctx.location()))
    }

    /// The field's declaring class and declaration for a resolved reference.
    fn field_decl(&self, field_ref: FieldRef) -> Result<(&'a ClassDecl, &'a VariableDecl)> {
        let class = self.program.class(field_ref.class);
        match class.members.get(field_ref.member) {
            Some(MemberDecl::Variable(field)) => Ok((class, field)),
            _ => Err(self.internal("field reference does not name a field member")),
        }
    }

    /// Field initialization at the top of a constructor. A built-in wrapper
    /// around a literal is a direct constant push, not an allocation.
    fn emit_field_initializer(&mut self, field: &VariableDecl) -> Result<()> {
        self.out.instr("aload_0");
        self.ctx.push(1);

        match &field.initializer.kind {
            ExprKind::ConstructorCall {
                class_name,
                arguments,
                ..
            } if is_wrapper_type_name(class_name) && arguments.len() == 1 => {
                match &arguments[0].kind {
                    ExprKind::IntegerLiteral(value) => {
                        self.out.push_int(*value);
                        self.ctx.push(1);
                    }
                    ExprKind::BooleanLiteral(value) => {
                        self.out.push_boolean(*value);
                        self.ctx.push(1);
                    }
                    ExprKind::RealLiteral(value) => {
                        self.out.push_double(*value);
                        self.ctx.push(2);
                    }
                    _ => self.lower_expression(&arguments[0])?,
                }
            }
            _ => self.lower_expression(&field.initializer)?,
        }

        let ty = field
            .declared_type
            .as_ref()
            .ok_or_else(|| unresolved("field type", &self.class.name, &field.name))?;
        self.out
            .field_access(&self.class.name, &field.name, &ty.descriptor(), false);
        self.ctx.pop(1 + ty.slot_count())?;
        Ok(())
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Lowers one statement and verifies it leaves the stack depth exactly
    /// where it found it.
    fn lower_statement(&mut self, statement: &Statement) -> Result<()> {
        let before = self.ctx.depth();
        self.lower_statement_inner(statement)?;
        let after = self.ctx.depth();
        if before != after {
            return Err(CodeGenError::UnbalancedStatement {
                location: self.ctx.location(),
                expected: before,
                found: after,
            });
        }
        Ok(())
    }

    fn lower_statement_inner(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Variable(decl) => {
                let ty = decl
                    .declared_type
                    .clone()
                    .ok_or_else(|| self.unresolved("local variable type"))?;
                let slot = self.ctx.allocate(&decl.name, ty.is_wide());
                self.lower_expression(&decl.initializer)?;
                self.out.store(slot, ty.type_char());
                self.ctx.pop(ty.slot_count())?;
            }
            Statement::Assignment(assign) => self.lower_assignment(assign)?,
            Statement::If(if_stmt) => {
                let else_label = self.ctx.next_label("IfElse");
                let end_label = self.ctx.next_label("IfEnd");

                self.lower_expression(&if_stmt.condition)?;
                self.out.if_zero("eq", &else_label);
                self.ctx.pop(1)?;

                for stmt in &if_stmt.then_branch {
                    self.lower_statement(stmt)?;
                }
                let then_returns = matches!(if_stmt.then_branch.last(), Some(Statement::Return(_)));
                if !then_returns {
                    self.out.goto(&end_label);
                }

                self.out.label(&else_label);
                if let Some(else_branch) = &if_stmt.else_branch {
                    for stmt in else_branch {
                        self.lower_statement(stmt)?;
                    }
                }

                self.out.label(&end_label);
                // Labels must target an instruction
                self.out.instr("nop");
            }
            Statement::While(while_loop) => {
                let start_label = self.ctx.next_label("WhileStart");
                let end_label = self.ctx.next_label("WhileEnd");

                self.out.label(&start_label);
                self.lower_expression(&while_loop.condition)?;
                self.out.if_zero("eq", &end_label);
                self.ctx.pop(1)?;

                for stmt in &while_loop.body {
                    self.lower_statement(stmt)?;
                }
                self.out.goto(&start_label);

                self.out.label(&end_label);
                self.out.instr("nop");
            }
            Statement::Return(ret) => match &ret.value {
                Some(value) => {
                    self.lower_expression(value)?;
                    let ty = value
                        .inferred_type
                        .clone()
                        .ok_or_else(|| self.unresolved("return value type"))?;
                    self.out.return_op(ty.type_char());
                    self.ctx.pop(ty.slot_count())?;
                }
                None => self.out.return_op('v'),
            },
            Statement::Expression(expr) => {
                self.lower_expression(expr)?;
                let ty = expr
                    .inferred_type
                    .clone()
                    .ok_or_else(|| self.unresolved("statement expression type"))?;
                if !ty.is_void() {
                    // Discarded result
                    self.out.instr(if ty.is_wide() { "pop2" } else { "pop" });
                    self.ctx.pop(ty.slot_count())?;
                }
            }
            Statement::Unknown(_) => {
                return Err(self.internal("unknown statement survived parsing"));
            }
        }
        Ok(())
    }

    fn lower_assignment(&mut self, assign: &crate::ast::Assignment) -> Result<()> {
        match assign.resolved_target {
            Some(ResolvedName::Field(field_ref)) => {
                self.out.load(0, 'a');
                self.ctx.push(1);
                self.lower_expression(&assign.value)?;

                let (declaring, field) = self.field_decl(field_ref)?;
                let ty = field
                    .declared_type
                    .clone()
                    .ok_or_else(|| self.unresolved("field type"))?;
                self.out
                    .field_access(&declaring.name, &assign.target, &ty.descriptor(), false);
                self.ctx.pop(1 + ty.slot_count())?;
            }
            Some(ResolvedName::Local(_)) => {
                let slot = self
                    .ctx
                    .slot(&assign.target)
                    .ok_or_else(|| self.internal("assignment to unallocated local"))?;
                self.lower_expression(&assign.value)?;
                let ty = assign
                    .value
                    .inferred_type
                    .clone()
                    .ok_or_else(|| self.unresolved("assigned value type"))?;
                self.out.store(slot, ty.type_char());
                self.ctx.pop(ty.slot_count())?;
            }
            None => return Err(self.unresolved("assignment target")),
        }
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn lower_expression(&mut self, expression: &Expression) -> Result<()> {
        match &expression.kind {
            ExprKind::IntegerLiteral(value) => {
                self.out.push_int(*value);
                self.ctx.push(1);
            }
            ExprKind::BooleanLiteral(value) => {
                self.out.push_boolean(*value);
                self.ctx.push(1);
            }
            ExprKind::RealLiteral(value) => {
                self.out.push_double(*value);
                self.ctx.push(2);
            }
            ExprKind::This => {
                self.out.load(0, 'a');
                self.ctx.push(1);
            }
            ExprKind::Identifier { name, resolved } => match resolved {
                Some(ResolvedName::Field(field_ref)) => {
                    self.out.load(0, 'a');
                    self.ctx.push(1);
                    let (declaring, field) = self.field_decl(*field_ref)?;
                    let ty = field
                        .declared_type
                        .clone()
                        .ok_or_else(|| self.unresolved("field type"))?;
                    self.out
                        .field_access(&declaring.name, name, &ty.descriptor(), true);
                    self.ctx.pop(1)?;
                    self.ctx.push(ty.slot_count());
                }
                Some(ResolvedName::Local(_)) => {
                    let slot = self
                        .ctx
                        .slot(name)
                        .ok_or_else(|| self.internal(format!("unallocated local '{name}'")))?;
                    let ty = expression
                        .inferred_type
                        .clone()
                        .ok_or_else(|| self.unresolved("local variable type"))?;
                    self.out.load(slot, ty.type_char());
                    self.ctx.push(ty.slot_count());
                }
                None => return Err(self.unresolved("identifier binding")),
            },
            ExprKind::ConstructorCall { .. } => self.lower_constructor_call(expression)?,
            ExprKind::MethodCall { .. } => self.lower_method_call(expression)?,
            ExprKind::MemberAccess {
                target,
                member_name,
                resolved_field,
            } => {
                self.lower_expression(target)?;
                let field_ref = resolved_field.ok_or_else(|| self.unresolved("field"))?;
                let (declaring, field) = self.field_decl(field_ref)?;
                let ty = field
                    .declared_type
                    .clone()
                    .ok_or_else(|| self.unresolved("field type"))?;
                self.out
                    .field_access(&declaring.name, member_name, &ty.descriptor(), true);
                self.ctx.pop(1)?;
                self.ctx.push(ty.slot_count());
            }
            ExprKind::Unknown => {
                return Err(self.internal("unknown expression survived parsing"));
            }
        }
        Ok(())
    }

    fn lower_constructor_call(&mut self, expression: &Expression) -> Result<()> {
        let ExprKind::ConstructorCall {
            class_name,
            arguments,
            resolved_class,
            resolved_type,
        } = &expression.kind
        else {
            unreachable!("lower_constructor_call on non-constructor expression");
        };

        // Array allocation
        if let Some(Type::Array(element)) = resolved_type {
            let [size] = arguments.as_slice() else {
                return Err(self.internal("array constructor without a single size argument"));
            };
            self.lower_expression(size)?;
            match element.name().as_str() {
                "Integer" | "Boolean" => self.out.instr("newarray int"),
                "Real" => self.out.instr("newarray double"),
                _ => {
                    let operand = match element.as_ref() {
                        Type::Array(_) => element.descriptor(),
                        _ => element.name(),
                    };
                    self.out.instr(&format!("anewarray {operand}"));
                }
            }
            self.ctx.pop(1)?;
            self.ctx.push(1);
            return Ok(());
        }

        // The Printer is a placeholder object
        if class_name == "Printer" {
            self.out.instr("aconst_null");
            self.ctx.push(1);
            return Ok(());
        }

        // A wrapper value is its argument, no allocation
        if is_wrapper_type_name(class_name) {
            let [argument] = arguments.as_slice() else {
                return Err(self.internal("wrapper constructor without a single argument"));
            };
            return self.lower_expression(argument);
        }

        // User class: allocate, duplicate, evaluate arguments, invoke
        self.out.new_and_dup(class_name);
        self.ctx.push(2);
        let mut arg_slots = 0;
        for argument in arguments {
            self.lower_expression(argument)?;
            let ty = argument
                .inferred_type
                .as_ref()
                .ok_or_else(|| self.unresolved("constructor argument type"))?;
            arg_slots += ty.slot_count();
        }

        let descriptor = self.constructor_descriptor_for_call(*resolved_class, arguments)?;
        self.out.invoke(class_name, "<init>", &descriptor, "special");
        self.ctx.pop(1 + arg_slots)?;
        Ok(())
    }

    /// Builds the `(…)V` descriptor for a user constructor call from the
    /// matched constructor's parameter types (falling back to the argument
    /// types when no registered constructor matches).
    fn constructor_descriptor_for_call(
        &self,
        resolved_class: Option<ClassId>,
        arguments: &[Expression],
    ) -> Result<String> {
        let mut arg_types = Vec::with_capacity(arguments.len());
        for argument in arguments {
            arg_types.push(
                argument
                    .inferred_type
                    .clone()
                    .ok_or_else(|| self.unresolved("constructor argument type"))?,
            );
        }

        if let Some(class_id) = resolved_class {
            let matched = self.index.entry(class_id).constructors.iter().find(|ctor| {
                ctor.params.len() == arg_types.len()
                    && ctor.params.iter().zip(&arg_types).all(|(param, arg)| {
                        param
                            .as_ref()
                            .is_some_and(|param| arg.is_compatible_with(param, self.index))
                    })
            });
            if let Some(ctor) = matched {
                let mut descriptor = String::from("(");
                for param in ctor.params.iter().flatten() {
                    descriptor.push_str(&param.descriptor());
                }
                descriptor.push_str(")V");
                return Ok(descriptor);
            }
        }

        let mut descriptor = String::from("(");
        for ty in &arg_types {
            descriptor.push_str(&ty.descriptor());
        }
        descriptor.push_str(")V");
        Ok(descriptor)
    }

    fn lower_method_call(&mut self, expression: &Expression) -> Result<()> {
        let ExprKind::MethodCall {
            target,
            method_name,
            arguments,
            resolved_method,
        } = &expression.kind
        else {
            unreachable!("lower_method_call on non-call expression");
        };

        let target_type = target
            .inferred_type
            .clone()
            .ok_or_else(|| self.unresolved("method call target type"))?;

        if let Type::Array(element) = &target_type {
            return self.lower_array_call(target, method_name, arguments, element);
        }

        match target_type.name().as_str() {
            "Printer" => self.lower_printer_call(arguments),
            "Integer" => self.lower_integer_call(target, method_name, arguments),
            "Boolean" => self.lower_boolean_call(target, method_name, arguments),
            "Real" => self.lower_real_call(target, method_name, arguments),
            _ => self.lower_user_call(
                target,
                &target_type,
                method_name,
                arguments,
                *resolved_method,
            ),
        }
    }

    fn lower_array_call(
        &mut self,
        target: &Expression,
        method_name: &str,
        arguments: &[Expression],
        element: &Type,
    ) -> Result<()> {
        self.lower_expression(target)?;
        for argument in arguments {
            self.lower_expression(argument)?;
        }

        let element_char = match element.name().as_str() {
            "Integer" | "Boolean" => 'i',
            "Real" => 'd',
            _ => 'a',
        };
        match method_name {
            "get" => {
                self.out.instr(&format!("{element_char}aload"));
                self.ctx.pop(2)?;
                self.ctx.push(element.slot_count());
            }
            "set" => {
                self.out.instr(&format!("{element_char}astore"));
                self.ctx.pop(2 + element.slot_count())?;
            }
            "Length" => {
                self.out.instr("arraylength");
                self.ctx.pop(1)?;
                self.ctx.push(1);
            }
            other => return Err(self.internal(format!("unknown array method '{other}'"))),
        }
        Ok(())
    }

    fn lower_printer_call(&mut self, arguments: &[Expression]) -> Result<()> {
        // The target Printer value is never evaluated; output goes through
        // the host VM's standard output object.
        self.out
            .instr(&format!("getstatic {OUTPUT_FIELD} L{OUTPUT_CLASS};"));
        self.ctx.push(1);

        let [argument] = arguments else {
            return Err(self.internal("print call without a single argument"));
        };
        self.lower_expression(argument)?;
        let arg_type = argument
            .inferred_type
            .clone()
            .ok_or_else(|| self.unresolved("print argument type"))?;

        let descriptor = match arg_type.type_char() {
            'i' => "(I)V",
            'd' => "(D)V",
            _ => "(LObject;)V",
        };
        self.out.invoke(OUTPUT_CLASS, "println", descriptor, "virtual");
        self.ctx.pop(1 + arg_type.slot_count())?;
        Ok(())
    }

    fn lower_integer_call(
        &mut self,
        target: &Expression,
        method_name: &str,
        arguments: &[Expression],
    ) -> Result<()> {
        self.lower_expression(target)?;
        for argument in arguments {
            self.lower_expression(argument)?;
        }
        match method_name {
            "Plus" => {
                self.out.arithmetic("add", 'i');
                self.ctx.binary_op()?;
            }
            "Minus" => {
                self.out.arithmetic("sub", 'i');
                self.ctx.binary_op()?;
            }
            "Mult" => {
                self.out.arithmetic("mul", 'i');
                self.ctx.binary_op()?;
            }
            "Div" => {
                self.out.arithmetic("div", 'i');
                self.ctx.binary_op()?;
            }
            "Rem" => {
                self.out.arithmetic("rem", 'i');
                self.ctx.binary_op()?;
            }
            "UnaryMinus" => {
                self.out.arithmetic("neg", 'i');
                self.ctx.unary_op(1)?;
            }
            "UnaryPlus" => {} // value is already on the stack
            "Less" => self.int_comparison("lt")?,
            "LessEqual" => self.int_comparison("le")?,
            "Greater" => self.int_comparison("gt")?,
            "GreaterEqual" => self.int_comparison("ge")?,
            "Equal" => self.int_comparison("eq")?,
            "toReal" => {
                self.out.instr("i2d");
                self.ctx.pop(1)?;
                self.ctx.push(2);
            }
            other => return Err(self.internal(format!("unknown Integer method '{other}'"))),
        }
        Ok(())
    }

    fn lower_boolean_call(
        &mut self,
        target: &Expression,
        method_name: &str,
        arguments: &[Expression],
    ) -> Result<()> {
        self.lower_expression(target)?;
        for argument in arguments {
            self.lower_expression(argument)?;
        }
        match method_name {
            "And" => {
                self.out.instr("iand");
                self.ctx.binary_op()?;
            }
            "Or" => {
                self.out.instr("ior");
                self.ctx.binary_op()?;
            }
            "Xor" => {
                self.out.instr("ixor");
                self.ctx.binary_op()?;
            }
            "Not" => {
                // XOR with 1 flips the flag
                self.out.push_int(1);
                self.ctx.push(1);
                self.out.instr("ixor");
                self.ctx.binary_op()?;
            }
            other => return Err(self.internal(format!("unknown Boolean method '{other}'"))),
        }
        Ok(())
    }

    fn lower_real_call(
        &mut self,
        target: &Expression,
        method_name: &str,
        arguments: &[Expression],
    ) -> Result<()> {
        self.lower_expression(target)?;
        for argument in arguments {
            self.lower_expression(argument)?;
        }
        match method_name {
            "Plus" | "Minus" | "Mult" | "Div" | "Rem" => {
                let op = match method_name {
                    "Plus" => "add",
                    "Minus" => "sub",
                    "Mult" => "mul",
                    "Div" => "div",
                    _ => "rem",
                };
                self.out.arithmetic(op, 'd');
                self.ctx.pop(4)?;
                self.ctx.push(2);
            }
            "UnaryMinus" => {
                self.out.arithmetic("neg", 'd');
                self.ctx.unary_op(2)?;
            }
            "UnaryPlus" => {}
            "Less" => self.real_comparison("lt")?,
            "LessEqual" => self.real_comparison("le")?,
            "Greater" => self.real_comparison("gt")?,
            "GreaterEqual" => self.real_comparison("ge")?,
            "Equal" => self.real_comparison("eq")?,
            "toInteger" => {
                self.out.instr("d2i");
                self.ctx.pop(2)?;
                self.ctx.push(1);
            }
            other => return Err(self.internal(format!("unknown Real method '{other}'"))),
        }
        Ok(())
    }

    fn lower_user_call(
        &mut self,
        target: &Expression,
        target_type: &Type,
        method_name: &str,
        arguments: &[Expression],
        resolved_method: Option<crate::ast::MethodRef>,
    ) -> Result<()> {
        self.lower_expression(target)?;
        let mut arg_slots = 0;
        for argument in arguments {
            self.lower_expression(argument)?;
            let ty = argument
                .inferred_type
                .as_ref()
                .ok_or_else(|| self.unresolved("argument type"))?;
            arg_slots += ty.slot_count();
        }

        let method_ref = resolved_method.ok_or_else(|| self.unresolved("method"))?;
        let declaring = self.program.class(method_ref.class);
        let Some(MemberDecl::Method(method)) = declaring.members.get(method_ref.member) else {
            return Err(self.internal("method reference does not name a method member"));
        };
        let descriptor = method_descriptor(method, &declaring.name)?;

        // Virtual dispatch goes through the receiver's static class
        self.out.invoke(
            target_type.name().as_str(),
            method_name,
            &descriptor,
            "virtual",
        );
        self.ctx.pop(1 + arg_slots)?;

        let return_type = method
            .return_type
            .as_ref()
            .ok_or_else(|| self.unresolved("return type"))?;
        if !return_type.is_void() {
            self.ctx.push(return_type.slot_count());
        }
        Ok(())
    }

    /// Integer comparison to a `0`/`1` value via a short branch.
    fn int_comparison(&mut self, comparison: &str) -> Result<()> {
        let true_label = self.ctx.next_label("CmpTrue");
        let end_label = self.ctx.next_label("CmpEnd");

        self.out.if_icmp(comparison, &true_label);
        self.ctx.pop(2)?;

        self.out.push_boolean(false);
        self.ctx.push(1);
        self.out.goto(&end_label);

        self.out.label(&true_label);
        // Leaves one value just like the fall-through path; the slot is
        // already accounted for.
        self.out.push_boolean(true);

        self.out.label(&end_label);
        Ok(())
    }

    /// Real comparison: `dcmpg` collapses the operands to -1/0/1, then a
    /// zero-branch produces the flag.
    fn real_comparison(&mut self, comparison: &str) -> Result<()> {
        self.out.instr("dcmpg");
        self.ctx.pop(4)?;
        self.ctx.push(1);

        let true_label = self.ctx.next_label("CmpTrue");
        let end_label = self.ctx.next_label("CmpEnd");

        self.out.if_zero(comparison, &true_label);
        self.ctx.pop(1)?;

        self.out.push_boolean(false);
        self.ctx.push(1);
        self.out.goto(&end_label);

        self.out.label(&true_label);
        self.out.push_boolean(true);

        self.out.label(&end_label);
        Ok(())
    }
}

// ============================================================================
// Descriptors
// ============================================================================

fn parameter_descriptors(params: &[Parameter], class: &str, member: &str) -> Result<String> {
    let mut descriptors = String::new();
    for param in params {
        let ty = param
            .resolved_type
            .as_ref()
            .ok_or_else(|| unresolved("parameter type", class, member))?;
        descriptors.push_str(&ty.descriptor());
    }
    Ok(descriptors)
}

fn method_descriptor(method: &MethodDecl, class: &str) -> Result<String> {
    let return_type = method
        .return_type
        .as_ref()
        .ok_or_else(|| unresolved("return type", class, &method.name))?;
    Ok(format!(
        "({}){}",
        parameter_descriptors(&method.parameters, class, &method.name)?,
        return_type.descriptor()
    ))
}

fn unresolved(what: &str, class: &str, member: &str) -> CodeGenError {
    CodeGenError::UnresolvedSlot {
        what: what.to_string(),
        location: format!("{class}.{member}"),
    }
}

// ============================================================================
// Entry point synthesis
// ============================================================================

/// Emits the synthetic entry-point class when a `Start` class with a
/// parameterless constructor and a parameterless Void `start` method exists.
fn generate_entry_point(program: &Program) -> Result<Option<AssemblyFile>> {
    let Some(start) = program.classes.iter().find(|c| c.name == "Start") else {
        return Ok(None);
    };
    let has_default_ctor = start
        .constructors()
        .any(|(_, ctor)| ctor.parameters.is_empty());
    let has_start_method = start.methods().any(|(_, method)| {
        method.name == "start"
            && method.parameters.is_empty()
            && method.return_type == Some(Type::Void)
            && method.body.is_some()
    });
    if !has_default_ctor || !has_start_method {
        return Ok(None);
    }

    let mut ctx = MethodContext::new(ENTRY_CLASS, "main", true);
    ctx.allocate("args", false);

    let mut body = AssemblyWriter::body();
    body.new_and_dup("Start");
    ctx.push(2);
    body.invoke("Start", "<init>", "()V", "special");
    ctx.pop(1)?;
    body.invoke("Start", "start", "()V", "virtual");
    ctx.pop(1)?;
    body.return_op('v');

    let mut writer = AssemblyWriter::new();
    writer.class_header(ENTRY_CLASS, None);
    writer.method_header("main", "([LString;)V", true);
    writer.limits(ctx.max_depth(), ctx.max_locals());
    writer.splice(body.code());
    writer.method_footer();

    Ok(Some(AssemblyFile {
        class_name: EcoString::from(ENTRY_CLASS),
        text: writer.into_code(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimise::optimise;
    use crate::semantic_analysis::{build_symbol_table, check_types};
    use crate::source_analysis::{has_errors, lex, parse};

    /// Runs the full front half of the pipeline and emits assembly.
    fn emit(source: &str) -> Vec<AssemblyFile> {
        let (tokens, lex_diags) = lex(source);
        assert!(lex_diags.is_empty(), "lexical errors: {lex_diags:?}");
        let (mut program, parse_diags) = parse(tokens);
        assert!(parse_diags.is_empty(), "parse errors: {parse_diags:?}");
        let (mut index, symbol_diags) = build_symbol_table(&mut program);
        assert!(!has_errors(&symbol_diags), "symbol errors: {symbol_diags:?}");
        let type_diags = check_types(&mut program, &mut index);
        assert!(!has_errors(&type_diags), "type errors: {type_diags:?}");
        optimise(&mut program);
        generate(&program, &index).expect("code generation failed")
    }

    fn file<'a>(files: &'a [AssemblyFile], name: &str) -> &'a str {
        &files
            .iter()
            .find(|f| f.class_name == name)
            .unwrap_or_else(|| panic!("no file for class {name}"))
            .text
    }

    #[test]
    fn simple_class_layout() {
        let files = emit("class SimpleClass is var value : Integer(42) this() is end end");
        assert_eq!(files.len(), 1);
        let text = file(&files, "SimpleClass");

        assert!(text.contains(".class public SimpleClass"));
        assert!(text.contains(&format!(".super {ROOT_CLASS}")));
        assert!(text.contains(".field private value I"));
        assert!(text.contains(".method public <init>()V"));
        // Field initialization: base ctor, then the constant store
        assert!(text.contains(&format!("invokespecial {ROOT_CLASS}/<init>()V")));
        assert!(text.contains("bipush 42"));
        assert!(text.contains("putfield SimpleClass/value I"));
        assert!(text.contains(".end method"));
    }

    #[test]
    fn inherited_class_calls_base_constructor() {
        let files = emit(
            "class Base is var x : Integer(10) method getValue() : Integer is return x end this() is end end \
             class Derived extends Base is var y : Integer(20) this() is end end",
        );
        assert_eq!(files.len(), 2);
        let derived = file(&files, "Derived");
        assert!(derived.contains(".super Base"));
        assert!(derived.contains("invokespecial Base/<init>()V"));
        assert!(derived.contains("putfield Derived/y I"));
        let base = file(&files, "Base");
        assert!(base.contains(".method public getValue()I"));
        assert!(base.contains("getfield Base/x I"));
        assert!(base.contains("ireturn"));
    }

    #[test]
    fn constant_folded_initializer_pushes_directly() {
        let files = emit(
            "class ConstFold is this() is var r : Integer(2).Plus(Integer(3)).Mult(Integer(4)) end end",
        );
        let text = file(&files, "ConstFold");
        assert!(text.contains("bipush 20"), "folded to a single push:\n{text}");
        assert!(!text.contains("imul"), "no residual arithmetic:\n{text}");
    }

    #[test]
    fn while_loop_shape() {
        let files = emit(
            "class Loop is method factorial(n : Integer) : Integer is \
             var result : Integer(1) var i : Integer(1) \
             while i.LessEqual(n) loop \
             result := result.Mult(i) i := i.Plus(Integer(1)) end \
             return result end this() is end end",
        );
        let text = file(&files, "Loop");
        assert!(text.contains("Label_0_Loop_factorial_WhileStart:"));
        assert!(text.contains("goto Label_0_Loop_factorial_WhileStart"));
        assert!(text.contains("ifeq Label_1_Loop_factorial_WhileEnd"));
        assert!(text.contains("imul"));
        assert!(text.contains("iadd"));
        assert!(text.contains("ireturn"));
        // Locals: this, n, result, i
        assert!(text.contains(".limit locals 4"));
    }

    #[test]
    fn if_else_with_then_return_skips_goto() {
        let files = emit(
            "class A is method pick(c : Boolean) : Integer is \
             if c then return Integer(1) else return Integer(2) end \
             return Integer(0) end this() is end end",
        );
        let text = file(&files, "A");
        assert!(text.contains("ifeq Label_0_A_pick_IfElse"));
        // The then branch ends in return, so there is no goto to IfEnd
        assert!(!text.contains("goto Label_1_A_pick_IfEnd"));
        assert!(text.contains("Label_1_A_pick_IfEnd:\n    nop"));
    }

    #[test]
    fn comparison_produces_flag_via_branch() {
        let files = emit(
            "class A is method less(a : Integer, b : Integer) : Boolean is \
             return a.Less(b) end this() is end end",
        );
        let text = file(&files, "A");
        assert!(text.contains("if_icmplt Label_0_A_less_CmpTrue"));
        assert!(text.contains("iconst_0"));
        assert!(text.contains("goto Label_1_A_less_CmpEnd"));
        assert!(text.contains("Label_0_A_less_CmpTrue:\n    iconst_1"));
    }

    #[test]
    fn real_arithmetic_uses_wide_forms() {
        let files = emit(
            "class A is method calc(x : Real) : Real is \
             return x.Mult(Real(2.5)) end this() is end end",
        );
        let text = file(&files, "A");
        assert!(text.contains("dload 1"));
        assert!(text.contains("ldc2_w 2.5"));
        assert!(text.contains("dmul"));
        assert!(text.contains("dreturn"));
        // x occupies slots 1-2
        assert!(text.contains(".limit locals 3"));
        assert!(text.contains(".limit stack 4"));
    }

    #[test]
    fn real_rem_is_emitted() {
        let files = emit(
            "class A is method m(a : Real, b : Real) : Real is return a.Rem(b) end end",
        );
        assert!(file(&files, "A").contains("drem"));
    }

    #[test]
    fn real_comparison_uses_dcmpg() {
        let files = emit(
            "class A is method m(a : Real, b : Real) : Boolean is return a.Less(b) end end",
        );
        let text = file(&files, "A");
        assert!(text.contains("dcmpg"));
        assert!(text.contains("iflt Label_0_A_m_CmpTrue"));
    }

    #[test]
    fn boolean_not_is_xor_with_one() {
        let files = emit(
            "class A is method m(b : Boolean) : Boolean is return b.Not() end end",
        );
        let text = file(&files, "A");
        assert!(text.contains("iconst_1\n    ixor"));
    }

    #[test]
    fn array_operations() {
        let files = emit(
            "class A is method m() : Integer is \
             var xs : Array[Integer](10) \
             xs.set(Integer(0), Integer(7)) \
             return xs.get(Integer(0)).Plus(xs.Length()) end end",
        );
        let text = file(&files, "A");
        assert!(text.contains("newarray int"));
        assert!(text.contains("iastore"));
        assert!(text.contains("iaload"));
        assert!(text.contains("arraylength"));
    }

    #[test]
    fn real_array_uses_double_opcodes() {
        let files = emit(
            "class A is method m() : Real is \
             var xs : Array[Real](4) \
             xs.set(Integer(0), Real(1.5)) \
             return xs.get(Integer(0)) end end",
        );
        let text = file(&files, "A");
        assert!(text.contains("newarray double"));
        assert!(text.contains("dastore"));
        assert!(text.contains("daload"));
    }

    #[test]
    fn object_array_uses_anewarray() {
        let files = emit(
            "class Item is this() is end end \
             class A is method m() : Array[Item] is \
             var xs : Array[Item](3) return xs end end",
        );
        let text = file(&files, "A");
        assert!(text.contains("anewarray Item"));
        assert!(text.contains("areturn"));
    }

    #[test]
    fn user_constructor_call_allocates_and_invokes() {
        let files = emit(
            "class Point is var x : Integer(0) this(px : Integer) is x := px end end \
             class A is method m() : Point is return Point(Integer(3)) end end",
        );
        let text = file(&files, "A");
        assert!(text.contains("new Point"));
        assert!(text.contains("dup"));
        assert!(text.contains("invokespecial Point/<init>(I)V"));
    }

    #[test]
    fn user_method_call_synthesizes_descriptor() {
        let files = emit(
            "class Calc is method add(a : Integer, b : Integer) : Integer is \
             return a.Plus(b) end this() is end end \
             class A is method m(c : Calc) : Integer is \
             return c.add(Integer(1), Integer(2)) end end",
        );
        let text = file(&files, "A");
        assert!(text.contains("invokevirtual Calc/add(II)I"));
    }

    #[test]
    fn printer_lowering() {
        let files = emit(
            "class Start is method start() is \
             var p : Printer() p.print(Integer(7)) end this() is end end",
        );
        let text = file(&files, "Start");
        assert!(text.contains("aconst_null"));
        assert!(text.contains(&format!("getstatic {OUTPUT_FIELD} L{OUTPUT_CLASS};")));
        assert!(text.contains(&format!("invokevirtual {OUTPUT_CLASS}/println(I)V")));
    }

    #[test]
    fn printer_selects_overload_by_argument_type() {
        let files = emit(
            "class A is method m(p : Printer, r : Real, a : A) is \
             p.print(r) p.print(a) end end",
        );
        let text = file(&files, "A");
        assert!(text.contains("println(D)V"));
        assert!(text.contains("println(LObject;)V"));
    }

    #[test]
    fn entry_point_is_synthesized_for_start_class() {
        let files = emit(
            "class Start is method start() is \
             var p : Printer() p.print(Integer(7)) end this() is end end",
        );
        assert_eq!(files.len(), 2);
        let main = file(&files, "Main");
        assert!(main.contains(".class public Main"));
        assert!(main.contains(".method public static main([LString;)V"));
        assert!(main.contains("new Start"));
        assert!(main.contains("invokespecial Start/<init>()V"));
        assert!(main.contains("invokevirtual Start/start()V"));
        assert!(main.contains(".limit stack 2"));
        assert!(main.contains(".limit locals 1"));
    }

    #[test]
    fn no_entry_point_without_qualifying_start() {
        // `start` takes a parameter, so no Main is produced
        let files = emit(
            "class Start is method start(n : Integer) is end this() is end end",
        );
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn no_entry_point_when_start_returns_a_value() {
        let files = emit(
            "class Start is method start() : Integer is return Integer(1) end this() is end end",
        );
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn discarded_result_is_popped() {
        let files = emit(
            "class A is method m() is var x : Integer(1) x.Plus(Integer(2)) end end",
        );
        let text = file(&files, "A");
        assert!(text.contains("iadd\n    pop"));
    }

    #[test]
    fn void_method_gets_implicit_return() {
        let files = emit("class A is method m() is end end");
        let text = file(&files, "A");
        assert!(text.contains("\n    return\n"));
    }

    #[test]
    fn forward_declaration_without_body_is_not_emitted() {
        let files = emit("class A is method later() : Integer end");
        let text = file(&files, "A");
        assert!(!text.contains("later"));
    }

    #[test]
    fn stack_limits_cover_peak_depth() {
        // Nested calls force a deeper operand stack
        let files = emit(
            "class A is method m(a : Integer, b : Integer, c : Integer) : Integer is \
             return a.Plus(b.Plus(c.Plus(Integer(1)))) end end",
        );
        let text = file(&files, "A");
        // Peak: a, b, c, 1 = 4 slots
        assert!(text.contains(".limit stack 4"), "{text}");
    }

    #[test]
    fn field_assignment_in_method_targets_declaring_class() {
        let files = emit(
            "class Base is var x : Integer(0) this() is end end \
             class Derived extends Base is \
             method setX(v : Integer) is x := v end this() is end end",
        );
        let text = file(&files, "Derived");
        // The field lives on Base
        assert!(text.contains("putfield Base/x I"));
    }

    #[test]
    fn member_access_emits_getfield_on_declaring_class() {
        let files = emit(
            "class Holder is var n : Integer(5) this() is end end \
             class A is method m(h : Holder) : Integer is return h.n end end",
        );
        let text = file(&files, "A");
        assert!(text.contains("getfield Holder/n I"));
    }

    #[test]
    fn wide_field_initialization() {
        let files = emit("class A is var r : Real(2.5) this() is end end");
        let text = file(&files, "A");
        assert!(text.contains(".field private r D"));
        assert!(text.contains("ldc2_w 2.5"));
        assert!(text.contains("putfield A/r D"));
        // aload_0 + two slots for the double
        assert!(text.contains(".limit stack 3"));
    }
}
