// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend-agnostic mutation modules.
//!
//! This module contains all state-changing operations for the persistence layer.
//! Most mutations use Diesel DSL and are backend-agnostic, with minimal use of
//! backend-specific helpers (e.g., `last_insert_rowid()` for `SQLite`).
//!
//! ## Module Organization
//!
//! - `organisation`: Branch, team and volunteer mutations
//! - `catalog`: Donation program and payment method mutations
//! - `transactions`: Recording, editing, deciding and deleting transactions
//! - `rates`: Rate propagation batch
//! - `operators`: Operator and session mutations

pub mod catalog;
pub mod operators;
pub mod organisation;
pub mod rates;
pub mod transactions;
