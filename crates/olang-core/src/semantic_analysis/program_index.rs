// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Per-class member registry for inheritance-aware lookups.
//!
//! The symbol-table pass builds one [`ClassEntry`] per declared class:
//! base-class link, field table, method table (keyed by textual signature),
//! and constructor list. The type checker fills in resolved types; the type
//! checker and emitter consult the index for every lookup that walks the
//! inheritance chain.
//!
//! Keeping these tables outside the AST is what lets passes mutate the tree
//! (`&mut Program`) while still reading member information of *other*
//! classes - chain walks never alias into the tree being rewritten.
//!
//! Base links form a DAG in well-formed programs; every walk carries a
//! visited set so that cyclic-inheritance errors elsewhere cannot loop.

use std::collections::{HashMap, HashSet};

use ecow::EcoString;

use crate::ast::{ClassId, FieldRef, MethodRef, VarId};

use super::types::Type;

/// A field registered on a class.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    /// The field name.
    pub name: EcoString,
    /// The declaration id of the field's `VariableDecl`.
    pub var: VarId,
    /// Index of the field in the class's member list.
    pub member: usize,
    /// The field's type (filled by the type checker).
    pub ty: Option<Type>,
}

/// A method registered on a class.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodEntry {
    /// The textual signature key, e.g. `getValue()` or `add(Integer,Integer)`.
    pub signature: EcoString,
    /// The bare method name.
    pub name: EcoString,
    /// Index of the method in the class's member list.
    pub member: usize,
    /// Resolved parameter types (filled by the type checker).
    pub params: Vec<Option<Type>>,
    /// Resolved return type (filled by the type checker).
    pub return_type: Option<Type>,
}

/// A constructor registered on a class.
#[derive(Debug, Clone, PartialEq)]
pub struct CtorEntry {
    /// The textual signature key, e.g. `this(Integer)`.
    pub signature: EcoString,
    /// Index of the constructor in the class's member list.
    pub member: usize,
    /// Resolved parameter types (filled by the type checker).
    pub params: Vec<Option<Type>>,
}

/// Everything the later passes need to know about one class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassEntry {
    /// The class name.
    pub name: EcoString,
    /// The resolved base class, if any.
    pub base: Option<ClassId>,
    /// Fields in member order.
    pub fields: Vec<FieldEntry>,
    /// Methods in member order (duplicates already rejected).
    pub methods: Vec<MethodEntry>,
    /// Constructors in member order.
    pub constructors: Vec<CtorEntry>,
}

/// The program-wide class registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramIndex {
    by_name: HashMap<EcoString, ClassId>,
    entries: Vec<ClassEntry>,
}

impl ProgramIndex {
    /// Registers a class, returning its id and whether the name was fresh.
    ///
    /// Ids are positional: the n-th registration gets id `n`, so ids line up
    /// with `Program::classes` indices even for duplicate names. Name lookup
    /// keeps the first registration.
    pub fn register_class(&mut self, name: EcoString) -> (ClassId, bool) {
        let id = ClassId(u32::try_from(self.entries.len()).expect("class count fits in u32"));
        let fresh = !self.by_name.contains_key(&name);
        if fresh {
            self.by_name.insert(name.clone(), id);
        }
        self.entries.push(ClassEntry {
            name,
            ..ClassEntry::default()
        });
        (id, fresh)
    }

    /// Looks up a class id by name.
    #[must_use]
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Returns the entry for a class.
    #[must_use]
    pub fn entry(&self, id: ClassId) -> &ClassEntry {
        &self.entries[id.index()]
    }

    /// Returns the mutable entry for a class.
    pub fn entry_mut(&mut self, id: ClassId) -> &mut ClassEntry {
        &mut self.entries[id.index()]
    }

    /// Returns a class's name.
    #[must_use]
    pub fn class_name(&self, id: ClassId) -> &EcoString {
        &self.entries[id.index()].name
    }

    /// Iterates the base-class chain of `id`, starting with its direct base
    /// (excluding `id` itself). Stops on the first repeated class, so cyclic
    /// declarations terminate.
    pub fn base_chain(&self, id: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        BaseChain {
            index: self,
            current: self.entries[id.index()].base,
            visited: HashSet::from([id]),
        }
    }

    /// Iterates `id` followed by its base-class chain.
    pub fn class_and_bases(&self, id: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        std::iter::once(id).chain(self.base_chain(id))
    }

    /// Finds a field by name on the class or its ancestors, innermost first.
    #[must_use]
    pub fn find_field(&self, id: ClassId, name: &str) -> Option<(FieldRef, &FieldEntry)> {
        for class in self.class_and_bases(id) {
            if let Some(entry) = self.entries[class.index()]
                .fields
                .iter()
                .find(|f| f.name == name)
            {
                return Some((
                    FieldRef {
                        class,
                        member: entry.member,
                    },
                    entry,
                ));
            }
        }
        None
    }

    /// Finds a method by exact textual signature on the class or its
    /// ancestors, subclass-first.
    #[must_use]
    pub fn find_method(&self, id: ClassId, signature: &str) -> Option<(MethodRef, &MethodEntry)> {
        for class in self.class_and_bases(id) {
            if let Some(entry) = self.entries[class.index()]
                .methods
                .iter()
                .find(|m| m.signature == signature)
            {
                return Some((
                    MethodRef {
                        class,
                        member: entry.member,
                    },
                    entry,
                ));
            }
        }
        None
    }

    /// Collects all methods with the given bare name on the class and its
    /// ancestors, subclass-first in chain order.
    #[must_use]
    pub fn methods_named(&self, id: ClassId, name: &str) -> Vec<(MethodRef, &MethodEntry)> {
        let mut found = Vec::new();
        for class in self.class_and_bases(id) {
            for entry in &self.entries[class.index()].methods {
                if entry.name == name {
                    found.push((
                        MethodRef {
                            class,
                            member: entry.member,
                        },
                        entry,
                    ));
                }
            }
        }
        found
    }

    /// Returns `true` if following base links from `id` revisits a class.
    #[must_use]
    pub fn has_circular_inheritance(&self, id: ClassId) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(id);
        while let Some(class) = current {
            if !visited.insert(class) {
                return true;
            }
            current = self.entries[class.index()].base;
        }
        false
    }

    /// Number of registered classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.entries.len()
    }
}

struct BaseChain<'a> {
    index: &'a ProgramIndex,
    current: Option<ClassId>,
    visited: HashSet<ClassId>,
}

impl Iterator for BaseChain<'_> {
    type Item = ClassId;

    fn next(&mut self) -> Option<ClassId> {
        let class = self.current?;
        if !self.visited.insert(class) {
            self.current = None;
            return None;
        }
        self.current = self.index.entries[class.index()].base;
        Some(class)
    }
}
