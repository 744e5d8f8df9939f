// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Removal of statements after `return`.
//!
//! Works per straight-line block: method bodies, constructor bodies,
//! if-branches, and loop bodies are each truncated after their first
//! `return`. The pass is purely local - it does not reason across control
//! flow joins, and a loop whose body returns keeps the loop itself.

use crate::ast::{MemberDecl, Program, Statement};

/// Removes unreachable statements after `return` in every block.
/// Returns the number of statements removed.
pub fn eliminate_dead_code(program: &mut Program) -> usize {
    let mut removed = 0;
    for class in &mut program.classes {
        for member in &mut class.members {
            match member {
                MemberDecl::Method(method) => {
                    if let Some(body) = &mut method.body {
                        removed += prune_block(body);
                    }
                }
                MemberDecl::Constructor(ctor) => {
                    removed += prune_block(&mut ctor.body);
                }
                MemberDecl::Variable(_) => {}
            }
        }
    }
    removed
}

/// Truncates `statements` after its first `return`, then recurses into the
/// nested blocks of the statements that remain.
fn prune_block(statements: &mut Vec<Statement>) -> usize {
    let mut removed = 0;

    if let Some(position) = statements
        .iter()
        .position(|s| matches!(s, Statement::Return(_)))
    {
        removed += statements.len() - position - 1;
        statements.truncate(position + 1);
    }

    for statement in statements.iter_mut() {
        match statement {
            Statement::If(if_stmt) => {
                removed += prune_block(&mut if_stmt.then_branch);
                if let Some(else_branch) = &mut if_stmt.else_branch {
                    removed += prune_block(else_branch);
                }
            }
            Statement::While(while_loop) => {
                removed += prune_block(&mut while_loop.body);
            }
            _ => {}
        }
    }

    removed
}
