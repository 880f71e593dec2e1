// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Auth category contract.

use crate::operation::Operation;
use crate::traits::plugin::Plugin;
use crate::types::{AuthSession, SignInRequest};

/// Plugin contract for the Auth category.
pub trait AuthPlugin: Plugin {
    fn sign_in(&self, request: SignInRequest) -> Operation<AuthSession>;

    fn sign_out(&self) -> Operation<()>;

    /// The signed-in session, if any.
    fn current_session(&self) -> Option<AuthSession>;
}
