// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! The type model.
//!
//! Types form a closed sum: class types (built-in or user-defined), array
//! types, and the distinguished `Void`. Equality is by name, which makes the
//! built-in singletons and freshly constructed types interchangeable.
//!
//! Compatibility is the assignment relation: a type is compatible with
//! itself, a class is compatible with any of its declared ancestors, and
//! arrays are invariant in their element type.

use std::hash::{Hash, Hasher};

use ecow::{eco_format, EcoString};

use crate::ast::ClassId;

use super::program_index::ProgramIndex;

/// A type in the language.
#[derive(Debug, Clone)]
pub enum Type {
    /// A class type. Built-in types (`Integer`, `Boolean`, `Real`,
    /// `Printer`) have no declaration.
    Class {
        /// The class name.
        name: EcoString,
        /// The declaring class, `None` for built-ins.
        decl: Option<ClassId>,
    },
    /// `Array[T]`. Arrays are invariant.
    Array(Box<Type>),
    /// The type of methods without a declared return type.
    Void,
}

impl Type {
    /// The built-in `Integer` type.
    #[must_use]
    pub fn integer() -> Self {
        Self::builtin("Integer")
    }

    /// The built-in `Boolean` type.
    #[must_use]
    pub fn boolean() -> Self {
        Self::builtin("Boolean")
    }

    /// The built-in `Real` type.
    #[must_use]
    pub fn real() -> Self {
        Self::builtin("Real")
    }

    /// The built-in `Printer` type.
    #[must_use]
    pub fn printer() -> Self {
        Self::builtin("Printer")
    }

    /// A built-in class type (no declaration).
    #[must_use]
    pub fn builtin(name: impl Into<EcoString>) -> Self {
        Self::Class {
            name: name.into(),
            decl: None,
        }
    }

    /// A user class type.
    #[must_use]
    pub fn class(name: impl Into<EcoString>, decl: ClassId) -> Self {
        Self::Class {
            name: name.into(),
            decl: Some(decl),
        }
    }

    /// An array of the given element type.
    #[must_use]
    pub fn array(element: Type) -> Self {
        Self::Array(Box::new(element))
    }

    /// Returns the textual name of this type, as used in signatures:
    /// `Integer`, `Counter`, `Array[Integer]`, `Void`.
    #[must_use]
    pub fn name(&self) -> EcoString {
        match self {
            Self::Class { name, .. } => name.clone(),
            Self::Array(element) => eco_format!("Array[{}]", element.name()),
            Self::Void => EcoString::from("Void"),
        }
    }

    /// Returns the element type for arrays.
    #[must_use]
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Self::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Returns the declaring class id for resolved user class types.
    #[must_use]
    pub fn class_decl(&self) -> Option<ClassId> {
        match self {
            Self::Class { decl, .. } => *decl,
            _ => None,
        }
    }

    /// Returns `true` for `Void`.
    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Returns `true` for types occupying two operand-stack slots (`Real`).
    #[must_use]
    pub fn is_wide(&self) -> bool {
        matches!(self, Self::Class { name, .. } if name == "Real")
    }

    /// Number of operand-stack slots a value of this type occupies.
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        if self.is_wide() {
            2
        } else {
            1
        }
    }

    /// The instruction-letter for load/store/return opcodes: `i` for
    /// Integer/Boolean, `d` for Real, `a` for references, `v` for Void.
    #[must_use]
    pub fn type_char(&self) -> char {
        match self {
            Self::Void => 'v',
            Self::Class { name, .. } => match name.as_str() {
                "Integer" | "Boolean" => 'i',
                "Real" => 'd',
                _ => 'a',
            },
            Self::Array(_) => 'a',
        }
    }

    /// Formats the descriptor of this type: `I` for Integer and Boolean,
    /// `D` for Real, `V` for Void, `[` + element descriptor for arrays, and
    /// `L<Name>;` for class references.
    #[must_use]
    pub fn descriptor(&self) -> EcoString {
        match self {
            Self::Void => EcoString::from("V"),
            Self::Array(element) => eco_format!("[{}", element.descriptor()),
            Self::Class { name, .. } => match name.as_str() {
                "Integer" | "Boolean" => EcoString::from("I"),
                "Real" => EcoString::from("D"),
                _ => eco_format!("L{name};"),
            },
        }
    }

    /// The assignment-compatibility relation.
    ///
    /// `a.is_compatible_with(b)` answers "may a value of type `a` be used
    /// where `b` is expected": equal names, or `a`'s declared base-class
    /// chain reaches `b`, or both are arrays with identical element types.
    #[must_use]
    pub fn is_compatible_with(&self, other: &Type, index: &ProgramIndex) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Self::Class { decl: Some(id), .. }, Self::Class { name: other_name, .. }) => index
                .base_chain(*id)
                .any(|ancestor| index.class_name(ancestor) == other_name),
            (Self::Array(a), Self::Array(b)) => a == b,
            _ => false,
        }
    }
}

/// Name equality: `Array[Integer]` equals `Array[Integer]` regardless of how
/// either was constructed, and a resolved user class type equals an
/// unresolved one of the same name.
impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Void, Self::Void) => true,
            (Self::Class { name: a, .. }, Self::Class { name: b, .. }) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Returns `true` for the built-in class names that carry methods or special
/// lowering: `Integer`, `Boolean`, `Real`, `Printer`, and `Array[…]` forms.
#[must_use]
pub fn is_builtin_type_name(name: &str) -> bool {
    matches!(name, "Integer" | "Boolean" | "Real" | "Printer") || is_array_type_name(name)
}

/// Returns `true` for the three value-wrapper names the constant folder and
/// the emitter treat as plain constants.
#[must_use]
pub fn is_wrapper_type_name(name: &str) -> bool {
    matches!(name, "Integer" | "Boolean" | "Real")
}

/// Returns `true` for synthetic `Array[…]` type names.
#[must_use]
pub fn is_array_type_name(name: &str) -> bool {
    name.starts_with("Array[") && name.ends_with(']')
}

/// Splits a synthetic `Array[Inner]` name into its inner name.
#[must_use]
pub fn array_element_name(name: &str) -> Option<&str> {
    name.strip_prefix("Array[")?.strip_suffix(']')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic_analysis::program_index::ProgramIndex;

    fn empty_index() -> ProgramIndex {
        ProgramIndex::default()
    }

    #[test]
    fn names() {
        assert_eq!(Type::integer().name(), "Integer");
        assert_eq!(Type::Void.name(), "Void");
        assert_eq!(Type::array(Type::real()).name(), "Array[Real]");
        assert_eq!(
            Type::array(Type::array(Type::integer())).name(),
            "Array[Array[Integer]]"
        );
    }

    #[test]
    fn equality_is_by_name() {
        assert_eq!(Type::integer(), Type::builtin("Integer"));
        assert_eq!(
            Type::class("Counter", ClassId(0)),
            Type::builtin("Counter")
        );
        assert_ne!(Type::integer(), Type::real());
        assert_ne!(Type::Void, Type::builtin("Void2"));
        assert_eq!(
            Type::array(Type::integer()),
            Type::array(Type::integer())
        );
        assert_ne!(Type::array(Type::integer()), Type::array(Type::real()));
    }

    #[test]
    fn descriptors() {
        assert_eq!(Type::integer().descriptor(), "I");
        assert_eq!(Type::boolean().descriptor(), "I");
        assert_eq!(Type::real().descriptor(), "D");
        assert_eq!(Type::Void.descriptor(), "V");
        assert_eq!(Type::array(Type::integer()).descriptor(), "[I");
        assert_eq!(
            Type::array(Type::array(Type::real())).descriptor(),
            "[[D"
        );
        assert_eq!(
            Type::builtin("Counter").descriptor(),
            "LCounter;"
        );
        assert_eq!(
            Type::array(Type::builtin("Counter")).descriptor(),
            "[LCounter;"
        );
    }

    #[test]
    fn wideness_and_type_chars() {
        assert!(Type::real().is_wide());
        assert!(!Type::integer().is_wide());
        assert_eq!(Type::real().slot_count(), 2);
        assert_eq!(Type::integer().slot_count(), 1);

        assert_eq!(Type::integer().type_char(), 'i');
        assert_eq!(Type::boolean().type_char(), 'i');
        assert_eq!(Type::real().type_char(), 'd');
        assert_eq!(Type::builtin("Counter").type_char(), 'a');
        assert_eq!(Type::array(Type::integer()).type_char(), 'a');
        assert_eq!(Type::Void.type_char(), 'v');
    }

    #[test]
    fn identical_types_are_compatible() {
        let index = empty_index();
        assert!(Type::integer().is_compatible_with(&Type::integer(), &index));
        assert!(Type::array(Type::real())
            .is_compatible_with(&Type::array(Type::real()), &index));
    }

    #[test]
    fn arrays_are_invariant() {
        let index = empty_index();
        assert!(!Type::array(Type::integer())
            .is_compatible_with(&Type::array(Type::real()), &index));
    }

    #[test]
    fn unrelated_classes_are_incompatible() {
        let index = empty_index();
        assert!(!Type::builtin("A").is_compatible_with(&Type::builtin("B"), &index));
        assert!(!Type::integer().is_compatible_with(&Type::real(), &index));
        assert!(!Type::Void.is_compatible_with(&Type::integer(), &index));
    }

    #[test]
    fn builtin_name_predicates() {
        assert!(is_builtin_type_name("Integer"));
        assert!(is_builtin_type_name("Printer"));
        assert!(is_builtin_type_name("Array[Integer]"));
        assert!(!is_builtin_type_name("Counter"));

        assert!(is_wrapper_type_name("Real"));
        assert!(!is_wrapper_type_name("Printer"));
        assert!(!is_wrapper_type_name("Array[Integer]"));

        assert_eq!(array_element_name("Array[Integer]"), Some("Integer"));
        assert_eq!(
            array_element_name("Array[Array[Real]]"),
            Some("Array[Real]")
        );
        assert_eq!(array_element_name("Integer"), None);
    }
}
