// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod card;
pub mod email;
pub mod form;
pub mod grouping;
pub mod identity;
pub mod signature;

pub use email::{CardEmail, EmailClient};
pub use form::{CardDispatcher, FitTestStore, FormController, FormStatus};
pub use grouping::{group_by_month, MonthBucket};
pub use identity::{IdentityClient, ProviderUser};
pub use signature::{PointerInput, SignaturePad, SurfaceLayout};
