// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! The built-in standard library registry.
//!
//! A fixed table of the methods carried by `Integer`, `Boolean`, and `Real`,
//! keyed by `(class name, "name(T1,…)" signature)`. The table is built once
//! per process and shared read-only.
//!
//! `Array[T]`'s `get`/`set`/`Length` are *not* in the table - they depend on
//! the element type and are resolved structurally by the type checker.
//! `Printer.print` likewise: its argument accepts any non-Void type, which a
//! signature key cannot express.

use std::collections::HashMap;
use std::sync::LazyLock;

use ecow::EcoString;

use crate::ast::signature_of;

use super::types::Type;

/// A built-in method's type contract.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltInMethod {
    /// The method name.
    pub name: EcoString,
    /// Parameter types.
    pub parameters: Vec<Type>,
    /// Return type.
    pub return_type: Type,
}

impl BuiltInMethod {
    /// The `name(T1,…)` signature key of this method.
    #[must_use]
    pub fn signature(&self) -> EcoString {
        let names: Vec<EcoString> = self.parameters.iter().map(Type::name).collect();
        signature_of(&self.name, names.iter().map(EcoString::as_str))
    }
}

/// The registry of built-in methods.
#[derive(Debug)]
pub struct StandardLibrary {
    methods: HashMap<(EcoString, EcoString), BuiltInMethod>,
}

static STANDARD_LIBRARY: LazyLock<StandardLibrary> = LazyLock::new(StandardLibrary::build);

/// Returns the process-wide standard library table.
#[must_use]
pub fn standard_library() -> &'static StandardLibrary {
    &STANDARD_LIBRARY
}

impl StandardLibrary {
    fn build() -> Self {
        let mut lib = Self {
            methods: HashMap::new(),
        };
        lib.register_integer_methods();
        lib.register_boolean_methods();
        lib.register_real_methods();
        lib
    }

    fn register_integer_methods(&mut self) {
        let int = Type::integer;
        let boolean = Type::boolean;

        for op in ["Plus", "Minus", "Mult", "Div", "Rem"] {
            self.register("Integer", op, vec![int()], int());
        }
        self.register("Integer", "UnaryMinus", vec![], int());
        self.register("Integer", "UnaryPlus", vec![], int());
        for cmp in ["Less", "LessEqual", "Greater", "GreaterEqual", "Equal"] {
            self.register("Integer", cmp, vec![int()], boolean());
        }
        self.register("Integer", "toReal", vec![], Type::real());
    }

    fn register_boolean_methods(&mut self) {
        let boolean = Type::boolean;
        for op in ["And", "Or", "Xor"] {
            self.register("Boolean", op, vec![boolean()], boolean());
        }
        self.register("Boolean", "Not", vec![], boolean());
    }

    fn register_real_methods(&mut self) {
        let real = Type::real;
        let boolean = Type::boolean;

        for op in ["Plus", "Minus", "Mult", "Div", "Rem"] {
            self.register("Real", op, vec![real()], real());
        }
        self.register("Real", "UnaryMinus", vec![], real());
        self.register("Real", "UnaryPlus", vec![], real());
        for cmp in ["Less", "LessEqual", "Greater", "GreaterEqual", "Equal"] {
            self.register("Real", cmp, vec![real()], boolean());
        }
        self.register("Real", "toInteger", vec![], Type::integer());
    }

    fn register(&mut self, class: &str, name: &str, parameters: Vec<Type>, return_type: Type) {
        let method = BuiltInMethod {
            name: name.into(),
            parameters,
            return_type,
        };
        self.methods
            .insert((EcoString::from(class), method.signature()), method);
    }

    /// Looks up a built-in method by class, name, and argument types.
    ///
    /// Returns `None` when any argument type is unknown (error recovery) or
    /// no entry matches the exact signature.
    #[must_use]
    pub fn find_method(
        &self,
        class_name: &str,
        method_name: &str,
        arg_types: &[Option<Type>],
    ) -> Option<&BuiltInMethod> {
        let mut names = Vec::with_capacity(arg_types.len());
        for ty in arg_types {
            names.push(ty.as_ref()?.name());
        }
        let signature = signature_of(method_name, names.iter().map(EcoString::as_str));
        self.methods.get(&(EcoString::from(class_name), signature))
    }

    /// All methods registered for a class, in no particular order.
    #[must_use]
    pub fn methods_for_class(&self, class_name: &str) -> Vec<&BuiltInMethod> {
        self.methods
            .iter()
            .filter(|((class, _), _)| class == class_name)
            .map(|(_, method)| method)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(class: &str, name: &str, args: &[Type]) -> Option<BuiltInMethod> {
        let args: Vec<Option<Type>> = args.iter().cloned().map(Some).collect();
        standard_library().find_method(class, name, &args).cloned()
    }

    #[test]
    fn integer_arithmetic() {
        let plus = find("Integer", "Plus", &[Type::integer()]).unwrap();
        assert_eq!(plus.return_type, Type::integer());
        assert_eq!(plus.signature(), "Plus(Integer)");

        for op in ["Minus", "Mult", "Div", "Rem"] {
            let method = find("Integer", op, &[Type::integer()]).unwrap();
            assert_eq!(method.return_type, Type::integer());
        }
    }

    #[test]
    fn integer_comparisons_return_boolean() {
        for cmp in ["Less", "LessEqual", "Greater", "GreaterEqual", "Equal"] {
            let method = find("Integer", cmp, &[Type::integer()]).unwrap();
            assert_eq!(method.return_type, Type::boolean());
        }
    }

    #[test]
    fn unary_operations_take_no_arguments() {
        assert!(find("Integer", "UnaryMinus", &[]).is_some());
        assert!(find("Integer", "UnaryPlus", &[]).is_some());
        assert!(find("Real", "UnaryMinus", &[]).is_some());
        assert!(find("Boolean", "Not", &[]).is_some());
        // Wrong arity misses
        assert!(find("Integer", "UnaryMinus", &[Type::integer()]).is_none());
    }

    #[test]
    fn conversions() {
        assert_eq!(
            find("Integer", "toReal", &[]).unwrap().return_type,
            Type::real()
        );
        assert_eq!(
            find("Real", "toInteger", &[]).unwrap().return_type,
            Type::integer()
        );
    }

    #[test]
    fn boolean_logic() {
        for op in ["And", "Or", "Xor"] {
            let method = find("Boolean", op, &[Type::boolean()]).unwrap();
            assert_eq!(method.return_type, Type::boolean());
        }
    }

    #[test]
    fn real_rem_is_registered() {
        // Present in the contract even though the constant folder skips it.
        let rem = find("Real", "Rem", &[Type::real()]).unwrap();
        assert_eq!(rem.return_type, Type::real());
    }

    #[test]
    fn cross_type_signatures_do_not_exist() {
        assert!(find("Integer", "Plus", &[Type::real()]).is_none());
        assert!(find("Real", "Plus", &[Type::integer()]).is_none());
        assert!(find("Integer", "Less", &[Type::real()]).is_none());
    }

    #[test]
    fn unknown_argument_type_never_matches() {
        assert!(standard_library()
            .find_method("Integer", "Plus", &[None])
            .is_none());
    }

    #[test]
    fn unknown_class_or_method_misses() {
        assert!(find("Printer", "print", &[Type::integer()]).is_none());
        assert!(find("Integer", "Twice", &[]).is_none());
    }

    #[test]
    fn method_inventory_sizes() {
        assert_eq!(standard_library().methods_for_class("Integer").len(), 13);
        assert_eq!(standard_library().methods_for_class("Boolean").len(), 4);
        assert_eq!(standard_library().methods_for_class("Real").len(), 13);
    }
}
