// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Assembly text construction.
//!
//! A thin writer over a string buffer that knows the target's directive
//! shapes and keeps instructions indented one level inside method bodies.
//! Labels sit at column zero. The constant-push helpers pick the most
//! compact instruction form for the value.

/// Indentation unit for instructions inside a method.
const INDENT: &str = "    ";

/// Writes assembly text with directive-aware formatting.
#[derive(Debug, Default)]
pub struct AssemblyWriter {
    code: String,
    indent: usize,
}

impl AssemblyWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer starting at one indent level (method-body depth).
    #[must_use]
    pub fn body() -> Self {
        Self {
            code: String::new(),
            indent: 1,
        }
    }

    // ========================================================================
    // Raw emission
    // ========================================================================

    /// Emits a line at column zero (directives such as `.class`).
    pub fn raw(&mut self, line: &str) {
        self.code.push_str(line);
        self.code.push('\n');
    }

    /// Emits an instruction at the current indent level.
    pub fn instr(&mut self, instruction: &str) {
        for _ in 0..self.indent {
            self.code.push_str(INDENT);
        }
        self.code.push_str(instruction);
        self.code.push('\n');
    }

    /// Emits a label at column zero.
    pub fn label(&mut self, label: &str) {
        self.code.push_str(label);
        self.code.push_str(":\n");
    }

    /// Emits a blank line.
    pub fn blank(&mut self) {
        self.code.push('\n');
    }

    /// Appends pre-rendered text verbatim.
    pub fn splice(&mut self, text: &str) {
        self.code.push_str(text);
    }

    // ========================================================================
    // Class structure
    // ========================================================================

    /// Emits the class header with its superclass (the default root when
    /// the class has no declared base).
    pub fn class_header(&mut self, class_name: &str, parent: Option<&str>) {
        self.raw(&format!(".class public {class_name}"));
        self.raw(&format!(".super {}", parent.unwrap_or(super::ROOT_CLASS)));
        self.blank();
    }

    /// Emits a field declaration.
    pub fn field(&mut self, name: &str, descriptor: &str) {
        self.raw(&format!(".field private {name} {descriptor}"));
    }

    // ========================================================================
    // Method structure
    // ========================================================================

    /// Emits a method header and enters body indentation.
    pub fn method_header(&mut self, name: &str, descriptor: &str, is_static: bool) {
        self.blank();
        let modifier = if is_static { "static " } else { "" };
        self.raw(&format!(".method public {modifier}{name}{descriptor}"));
        self.indent += 1;
    }

    /// Emits the stack/locals limit directives.
    pub fn limits(&mut self, stack: u32, locals: u32) {
        self.instr(&format!(".limit stack {stack}"));
        self.instr(&format!(".limit locals {locals}"));
        self.blank();
    }

    /// Emits the method footer and leaves body indentation.
    pub fn method_footer(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.raw(".end method");
    }

    // ========================================================================
    // Instructions
    // ========================================================================

    /// Pushes an integer constant using the most compact form:
    /// `iconst_N` in `[-1, 5]` (`iconst_m1` for -1), `bipush` for bytes,
    /// `sipush` for shorts, and a constant-pool `ldc` otherwise.
    pub fn push_int(&mut self, value: i32) {
        if value == -1 {
            self.instr("iconst_m1");
        } else if (0..=5).contains(&value) {
            self.instr(&format!("iconst_{value}"));
        } else if (-128..=127).contains(&value) {
            self.instr(&format!("bipush {value}"));
        } else if (-32768..=32767).contains(&value) {
            self.instr(&format!("sipush {value}"));
        } else {
            self.instr(&format!("ldc {value}"));
        }
    }

    /// Pushes a wide (two-slot) real constant; `0.0` and `1.0` use their
    /// compact constant forms.
    pub fn push_double(&mut self, value: f64) {
        if value == 0.0 {
            self.instr("dconst_0");
        } else if value == 1.0 {
            self.instr("dconst_1");
        } else {
            self.instr(&format!("ldc2_w {value:?}"));
        }
    }

    /// Pushes a boolean as `iconst_1`/`iconst_0`.
    pub fn push_boolean(&mut self, value: bool) {
        self.instr(if value { "iconst_1" } else { "iconst_0" });
    }

    /// Emits a typed load from a local slot.
    pub fn load(&mut self, slot: u32, type_char: char) {
        self.instr(&format!("{type_char}load {slot}"));
    }

    /// Emits a typed store to a local slot.
    pub fn store(&mut self, slot: u32, type_char: char) {
        self.instr(&format!("{type_char}store {slot}"));
    }

    /// Emits a typed arithmetic instruction (`iadd`, `dmul`, …).
    pub fn arithmetic(&mut self, op: &str, type_char: char) {
        self.instr(&format!("{type_char}{op}"));
    }

    /// Emits a typed return; `v` is the bare `return`.
    pub fn return_op(&mut self, type_char: char) {
        if type_char == 'v' {
            self.instr("return");
        } else {
            self.instr(&format!("{type_char}return"));
        }
    }

    /// Emits a field get or put.
    pub fn field_access(&mut self, class: &str, field: &str, descriptor: &str, is_get: bool) {
        let op = if is_get { "getfield" } else { "putfield" };
        self.instr(&format!("{op} {class}/{field} {descriptor}"));
    }

    /// Emits a method invocation (`kind` is `virtual`, `special`, or
    /// `static`).
    pub fn invoke(&mut self, class: &str, method: &str, descriptor: &str, kind: &str) {
        self.instr(&format!("invoke{kind} {class}/{method}{descriptor}"));
    }

    /// Emits the allocate-and-duplicate pair preceding a constructor call.
    pub fn new_and_dup(&mut self, class: &str) {
        self.instr(&format!("new {class}"));
        self.instr("dup");
    }

    /// Emits a two-operand integer comparison branch (`if_icmpgt L`).
    pub fn if_icmp(&mut self, comparison: &str, label: &str) {
        self.instr(&format!("if_icmp{comparison} {label}"));
    }

    /// Emits a compare-to-zero branch (`ifeq L`, `ifgt L`, …).
    pub fn if_zero(&mut self, comparison: &str, label: &str) {
        self.instr(&format!("if{comparison} {label}"));
    }

    /// Emits an unconditional jump.
    pub fn goto(&mut self, label: &str) {
        self.instr(&format!("goto {label}"));
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Returns the text produced so far.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Consumes the writer and returns the text.
    #[must_use]
    pub fn into_code(self) -> String {
        self.code
    }
}
