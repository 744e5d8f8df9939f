// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommands.

pub mod compile;
