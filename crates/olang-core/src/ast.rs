// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Abstract Syntax Tree (AST) definitions for olang.
//!
//! The AST is produced by the parser, annotated in place by the semantic
//! passes, rewritten by the optimizer, and finally consumed by the emitter.
//! Every node carries a [`Span`] for error reporting.
//!
//! # Design Philosophy
//!
//! - **All nodes have spans** - required for every diagnostic
//! - **Error recovery** - the parser produces placeholder nodes
//!   ([`ExprKind::Unknown`], [`Statement::Unknown`]) instead of failing
//! - **Index-based cross references** - nodes refer to other nodes through
//!   plain indices ([`ClassId`], [`VarId`], [`MethodRef`], [`FieldRef`]),
//!   never through owning pointers; the inheritance graph is navigated via
//!   the semantic index, so no reference cycles can form
//! - **Semantic slots** - `Option` fields (`resolved*`, `inferred_type`,
//!   `declared_type`, `return_type`) start out `None` after parsing and are
//!   filled by the symbol-table and type-checking passes; the emitter treats
//!   a missing slot on a reachable node as an internal error
//!
//! # Example
//!
//! ```
//! use olang_core::source_analysis::{lex, parse};
//!
//! let (tokens, _) = lex("class A is var x : Integer(1) end");
//! let (program, diagnostics) = parse(tokens);
//! assert!(diagnostics.is_empty());
//! assert_eq!(program.classes.len(), 1);
//! assert_eq!(program.classes[0].name, "A");
//! ```

use ecow::EcoString;

use crate::semantic_analysis::types::Type;
use crate::source_analysis::Span;

/// Index of a class in [`Program::classes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

impl ClassId {
    /// Returns the index as a `usize` for slicing.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unique id of a variable declaration (field, local, or parameter).
///
/// Stamped by the parser; the type checker keys its declared-type table on
/// these ids so identifier uses can find their declaration's type without
/// aliasing into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u32);

/// A resolved reference to a method member: `(class, member index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodRef {
    /// The class declaring the method.
    pub class: ClassId,
    /// Index of the method in that class's member list.
    pub member: usize,
}

/// A resolved reference to a field member: `(declaring class, member index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
    /// The class declaring the field (possibly an ancestor of the target).
    pub class: ClassId,
    /// Index of the field in that class's member list.
    pub member: usize,
}

/// What a name in expression position resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedName {
    /// A parameter or local variable in the enclosing method scope.
    Local(VarId),
    /// A field found on the enclosing class or one of its ancestors.
    Field(FieldRef),
}

/// Top-level container: an ordered list of class declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Class declarations in source order.
    pub classes: Vec<ClassDecl>,
    /// Span of the whole compilation unit.
    pub span: Span,
}

impl Program {
    /// Creates a new program.
    #[must_use]
    pub fn new(classes: Vec<ClassDecl>, span: Span) -> Self {
        Self { classes, span }
    }

    /// Looks up a class declaration by id.
    #[must_use]
    pub fn class(&self, id: ClassId) -> &ClassDecl {
        &self.classes[id.index()]
    }
}

/// A class declaration: `class Name [extends Base] is … end`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    /// The class name.
    pub name: EcoString,
    /// Span of the name token.
    pub name_span: Span,
    /// The declared base class name, if any.
    pub base_name: Option<EcoString>,
    /// Span of the base class name token.
    pub base_span: Option<Span>,
    /// The resolved base class (filled by the symbol-table pass; stays
    /// `None` for root classes and for unresolvable or built-in bases).
    pub base_class: Option<ClassId>,
    /// Members in source order.
    pub members: Vec<MemberDecl>,
    /// Span of the entire declaration.
    pub span: Span,
}

impl ClassDecl {
    /// Iterates the class's field members with their member indices.
    pub fn fields(&self) -> impl Iterator<Item = (usize, &VariableDecl)> {
        self.members.iter().enumerate().filter_map(|(i, m)| match m {
            MemberDecl::Variable(field) => Some((i, field)),
            _ => None,
        })
    }

    /// Iterates the class's constructors with their member indices.
    pub fn constructors(&self) -> impl Iterator<Item = (usize, &ConstructorDecl)> {
        self.members.iter().enumerate().filter_map(|(i, m)| match m {
            MemberDecl::Constructor(ctor) => Some((i, ctor)),
            _ => None,
        })
    }

    /// Iterates the class's methods with their member indices.
    pub fn methods(&self) -> impl Iterator<Item = (usize, &MethodDecl)> {
        self.members.iter().enumerate().filter_map(|(i, m)| match m {
            MemberDecl::Method(method) => Some((i, method)),
            _ => None,
        })
    }
}

/// A member of a class body.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberDecl {
    /// A field: `var name : initializer`
    Variable(VariableDecl),
    /// A method declaration (possibly a bodiless forward declaration).
    Method(MethodDecl),
    /// A constructor: `this(…) is … end`
    Constructor(ConstructorDecl),
}

impl MemberDecl {
    /// Returns the span of this member.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Variable(v) => v.span,
            Self::Method(m) => m.span,
            Self::Constructor(c) => c.span,
        }
    }
}

/// A variable declaration, used both for class fields and for statement-level
/// locals. The declared type is inferred from the initializer by the type
/// checker.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    /// Unique declaration id.
    pub id: VarId,
    /// The variable name.
    pub name: EcoString,
    /// The initializer expression (`var x : <expr>`).
    pub initializer: Expression,
    /// Inferred declared type (filled by the type checker).
    pub declared_type: Option<Type>,
    /// Span of the whole declaration.
    pub span: Span,
}

/// A formal parameter: `name : TypeName`.
///
/// `Array[T]` type names arrive from the parser as a single synthetic
/// string, e.g. `"Array[Integer]"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Unique declaration id (parameters bind like locals).
    pub id: VarId,
    /// The parameter name.
    pub name: EcoString,
    /// The declared type name, textual.
    pub type_name: EcoString,
    /// The resolved type (filled by the type checker's signature pass).
    pub resolved_type: Option<Type>,
    /// Span of the parameter.
    pub span: Span,
}

/// A method declaration.
///
/// A method without a body is a forward declaration; a later declaration
/// with the same signature and a body replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    /// The method name.
    pub name: EcoString,
    /// Formal parameters.
    pub parameters: Vec<Parameter>,
    /// Declared return type name (`None` for procedures).
    pub return_type_name: Option<EcoString>,
    /// Resolved return type (filled by the type checker; `Void` when no
    /// return type was declared).
    pub return_type: Option<Type>,
    /// The body, or `None` for a forward declaration.
    pub body: Option<Vec<Statement>>,
    /// Span of the whole declaration.
    pub span: Span,
}

impl MethodDecl {
    /// Builds the textual signature key `name(T1,T2,…)` from the declared
    /// parameter type names.
    #[must_use]
    pub fn signature(&self) -> EcoString {
        signature_of(&self.name, self.parameters.iter().map(|p| p.type_name.as_str()))
    }
}

/// A constructor declaration: `this(…) is … end`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDecl {
    /// Formal parameters.
    pub parameters: Vec<Parameter>,
    /// The body statements.
    pub body: Vec<Statement>,
    /// Span of the whole declaration.
    pub span: Span,
}

impl ConstructorDecl {
    /// Builds the textual signature key `this(T1,T2,…)`.
    #[must_use]
    pub fn signature(&self) -> EcoString {
        signature_of("this", self.parameters.iter().map(|p| p.type_name.as_str()))
    }
}

/// Builds a `name(T1,T2,…)` signature string from textual type names.
#[must_use]
pub fn signature_of<'a>(name: &str, type_names: impl Iterator<Item = &'a str>) -> EcoString {
    let mut sig = EcoString::from(name);
    sig.push('(');
    for (i, ty) in type_names.enumerate() {
        if i > 0 {
            sig.push(',');
        }
        sig.push_str(ty);
    }
    sig.push(')');
    sig
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A local variable declaration.
    Variable(VariableDecl),
    /// An assignment: `name := expr`.
    Assignment(Assignment),
    /// `if cond then … [else …] end`
    If(IfStatement),
    /// `while cond loop … end`
    While(WhileLoop),
    /// `return [expr]`
    Return(ReturnStatement),
    /// An expression in statement position (e.g. a call for its effect).
    Expression(Expression),
    /// Placeholder for unparseable input.
    Unknown(Span),
}

impl Statement {
    /// Returns the span of this statement.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Variable(v) => v.span,
            Self::Assignment(a) => a.span,
            Self::If(i) => i.span,
            Self::While(w) => w.span,
            Self::Return(r) => r.span,
            Self::Expression(e) => e.span,
            Self::Unknown(span) => *span,
        }
    }
}

/// An assignment statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// The assigned variable or field name.
    pub target: EcoString,
    /// The assigned value.
    pub value: Expression,
    /// What the target name resolved to (filled by the symbol-table pass).
    pub resolved_target: Option<ResolvedName>,
    /// Span of the whole statement.
    pub span: Span,
}

/// An `if` statement. The else branch is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    /// The condition (must be Boolean).
    pub condition: Expression,
    /// Statements of the then branch.
    pub then_branch: Vec<Statement>,
    /// Statements of the else branch, if present.
    pub else_branch: Option<Vec<Statement>>,
    /// Span of the whole statement.
    pub span: Span,
}

/// A `while … loop … end` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileLoop {
    /// The condition (must be Boolean).
    pub condition: Expression,
    /// The loop body.
    pub body: Vec<Statement>,
    /// Span of the whole statement.
    pub span: Span,
}

/// A `return [expr]` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    /// The returned value, absent for bare `return`.
    pub value: Option<Expression>,
    /// Span of the whole statement.
    pub span: Span,
}

/// An expression with its span and inferred-type slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// The expression variant.
    pub kind: ExprKind,
    /// Source location.
    pub span: Span,
    /// The type attached by the type checker. `None` before type checking
    /// and on error paths.
    pub inferred_type: Option<Type>,
}

impl Expression {
    /// Creates an expression with an empty inferred-type slot.
    #[must_use]
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            inferred_type: None,
        }
    }

    /// Creates an error placeholder expression.
    #[must_use]
    pub fn unknown(span: Span) -> Self {
        Self::new(ExprKind::Unknown, span)
    }

    /// Returns `true` if this is a syntactic literal (integer, real, or
    /// boolean). Method calls on such expressions are rejected.
    #[must_use]
    pub fn is_syntactic_literal(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::IntegerLiteral(_) | ExprKind::RealLiteral(_) | ExprKind::BooleanLiteral(_)
        )
    }
}

/// The expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `42`, `-17`
    IntegerLiteral(i32),
    /// `3.14`
    RealLiteral(f64),
    /// `true` / `false`
    BooleanLiteral(bool),
    /// `this`
    This,
    /// A bare identifier use.
    Identifier {
        /// The name.
        name: EcoString,
        /// What the name resolved to (filled by the symbol-table pass).
        resolved: Option<ResolvedName>,
    },
    /// A constructor call: `ClassName(args…)`. Built-in wrapper values
    /// (`Integer(5)`) share this form.
    ConstructorCall {
        /// The class name (may be a synthetic `Array[T]` name).
        class_name: EcoString,
        /// The arguments.
        arguments: Vec<Expression>,
        /// The resolved user class (filled by the symbol-table pass; stays
        /// `None` for built-in names).
        resolved_class: Option<ClassId>,
        /// The resolved constructed type (filled for `Array[T]` forms during
        /// name resolution, and for all forms during type checking).
        resolved_type: Option<Type>,
    },
    /// A method call: `target.name(args…)`.
    MethodCall {
        /// The receiver.
        target: Box<Expression>,
        /// The method name.
        method_name: EcoString,
        /// The arguments.
        arguments: Vec<Expression>,
        /// The resolved method for user-class targets (filled by the type
        /// checker). Built-in and array calls resolve structurally.
        resolved_method: Option<MethodRef>,
    },
    /// A field access: `target.name` (no argument list).
    MemberAccess {
        /// The receiver.
        target: Box<Expression>,
        /// The field name.
        member_name: EcoString,
        /// The resolved field (filled by the type checker).
        resolved_field: Option<FieldRef>,
    },
    /// Placeholder for unparseable input.
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_formatting() {
        assert_eq!(signature_of("foo", [].into_iter()), "foo()");
        assert_eq!(
            signature_of("foo", ["Integer"].into_iter()),
            "foo(Integer)"
        );
        assert_eq!(
            signature_of("foo", ["Integer", "Array[Real]"].into_iter()),
            "foo(Integer,Array[Real])"
        );
    }

    #[test]
    fn method_signature_uses_textual_type_names() {
        let method = MethodDecl {
            name: "compute".into(),
            parameters: vec![
                Parameter {
                    id: VarId(0),
                    name: "a".into(),
                    type_name: "Integer".into(),
                    resolved_type: None,
                    span: Span::empty(0, 0),
                },
                Parameter {
                    id: VarId(1),
                    name: "b".into(),
                    type_name: "Array[Integer]".into(),
                    resolved_type: None,
                    span: Span::empty(0, 0),
                },
            ],
            return_type_name: None,
            return_type: None,
            body: None,
            span: Span::empty(0, 0),
        };
        assert_eq!(method.signature(), "compute(Integer,Array[Integer])");
    }

    #[test]
    fn constructor_signature_uses_this_prefix() {
        let ctor = ConstructorDecl {
            parameters: vec![Parameter {
                id: VarId(0),
                name: "n".into(),
                type_name: "Integer".into(),
                resolved_type: None,
                span: Span::empty(0, 0),
            }],
            body: Vec::new(),
            span: Span::empty(0, 0),
        };
        assert_eq!(ctor.signature(), "this(Integer)");
    }

    #[test]
    fn syntactic_literal_predicate() {
        let lit = Expression::new(ExprKind::IntegerLiteral(5), Span::empty(0, 0));
        assert!(lit.is_syntactic_literal());

        let ident = Expression::new(
            ExprKind::Identifier {
                name: "x".into(),
                resolved: None,
            },
            Span::empty(0, 0),
        );
        assert!(!ident.is_syntactic_literal());

        let wrapper = Expression::new(
            ExprKind::ConstructorCall {
                class_name: "Integer".into(),
                arguments: vec![lit],
                resolved_class: None,
                resolved_type: None,
            },
            Span::empty(0, 0),
        );
        assert!(!wrapper.is_syntactic_literal());
    }

    #[test]
    fn statement_spans() {
        let span = Span::on_line(3, 0, 6);
        assert_eq!(Statement::Unknown(span).span(), span);
        let ret = Statement::Return(ReturnStatement { value: None, span });
        assert_eq!(ret.span(), span);
    }
}
