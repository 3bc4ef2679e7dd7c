// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for storage and API.

pub mod user;

pub use fit_test::{FitTestRecord, FitTestUpdate, FormDraft};
pub use user::{SessionUser, UserTokens};
