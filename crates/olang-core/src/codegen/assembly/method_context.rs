// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Per-method emission state.
//!
//! A [`MethodContext`] bundles the three pieces of bookkeeping a method
//! body needs while it is lowered:
//!
//! - **Local slots** - slot 0 is the instance reference in non-static
//!   methods; parameters and locals take the next free slot(s) in source
//!   order, two for wide types. The high-water mark becomes the emitted
//!   locals limit.
//! - **Symbolic stack depth** - maintained exactly alongside every emitted
//!   instruction; the maximum becomes the emitted stack limit. A pop below
//!   zero is an internal error, never a wrap.
//! - **Labels** - unique per method, tagged with class, method, and purpose
//!   so generated control flow reads back to its source.

use std::collections::HashMap;

use ecow::EcoString;

use crate::codegen::{CodeGenError, Result};

/// State tracked while generating code for a single method.
#[derive(Debug)]
pub struct MethodContext {
    class_name: EcoString,
    method_name: EcoString,
    is_static: bool,

    slots: HashMap<EcoString, u32>,
    next_slot: u32,

    depth: u32,
    max_depth: u32,

    label_counter: u32,
}

impl MethodContext {
    /// Creates a context. Non-static methods reserve slot 0 for the
    /// instance reference (`this`).
    #[must_use]
    pub fn new(class_name: impl Into<EcoString>, method_name: impl Into<EcoString>, is_static: bool) -> Self {
        let mut slots = HashMap::new();
        let next_slot = if is_static { 0 } else { 1 };
        if !is_static {
            slots.insert(EcoString::from("this"), 0);
        }
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            is_static,
            slots,
            next_slot,
            depth: 0,
            max_depth: 0,
            label_counter: 0,
        }
    }

    /// `Class.method`, for error messages.
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}.{}", self.class_name, self.method_name)
    }

    /// Whether this context is for a static method.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    // ========================================================================
    // Local slots
    // ========================================================================

    /// Allocates the next slot(s) for a parameter or local. Re-requesting
    /// an already-allocated name returns its existing slot.
    pub fn allocate(&mut self, name: &str, is_wide: bool) -> u32 {
        if let Some(&slot) = self.slots.get(name) {
            return slot;
        }
        let slot = self.next_slot;
        self.slots.insert(EcoString::from(name), slot);
        self.next_slot += if is_wide { 2 } else { 1 };
        slot
    }

    /// Looks up the slot for a name.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<u32> {
        self.slots.get(name).copied()
    }

    /// The locals limit: one past the highest slot allocated.
    #[must_use]
    pub const fn max_locals(&self) -> u32 {
        self.next_slot
    }

    // ========================================================================
    // Symbolic stack depth
    // ========================================================================

    /// Records `count` slots pushed.
    pub fn push(&mut self, count: u32) {
        self.depth += count;
        if self.depth > self.max_depth {
            self.max_depth = self.depth;
        }
    }

    /// Records `count` slots popped. Going below zero is an emitter bug.
    pub fn pop(&mut self, count: u32) -> Result<()> {
        if count > self.depth {
            return Err(CodeGenError::StackUnderflow {
                location: self.location(),
                depth: i64::from(self.depth) - i64::from(count),
            });
        }
        self.depth -= count;
        Ok(())
    }

    /// Resets the depth at a control-flow merge where an alternative path
    /// left the same values on the stack (already accounted for once).
    pub fn set_depth(&mut self, depth: u32) {
        self.depth = depth;
        if self.depth > self.max_depth {
            self.max_depth = self.depth;
        }
    }

    /// Current symbolic depth.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// The stack limit: the highest depth reached.
    #[must_use]
    pub const fn max_depth(&self) -> u32 {
        self.max_depth
    }

    // ========================================================================
    // Stack shorthands for common instruction shapes
    // ========================================================================

    /// Two single-slot operands in, one out (`iadd`, `iand`, …).
    pub fn binary_op(&mut self) -> Result<()> {
        self.pop(2)?;
        self.push(1);
        Ok(())
    }

    /// `count` slots in, `count` out (`ineg`, `dneg`).
    pub fn unary_op(&mut self, count: u32) -> Result<()> {
        self.pop(count)?;
        self.push(count);
        Ok(())
    }

    // ========================================================================
    // Labels
    // ========================================================================

    /// Produces the next unique label for the given purpose, e.g.
    /// `Label_0_Counter_increment_IfElse`.
    pub fn next_label(&mut self, purpose: &str) -> String {
        let label = format!(
            "Label_{}_{}_{}_{}",
            self.label_counter, self.class_name, self.method_name, purpose
        );
        self.label_counter += 1;
        label
    }
}
