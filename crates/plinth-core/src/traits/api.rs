// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! API category contract (GraphQL query, mutation, and subscription).

use crate::operation::{Operation, Subscription};
use crate::traits::plugin::Plugin;
use crate::types::{GraphQlRequest, GraphQlResponse};

/// Plugin contract for the API category.
pub trait ApiPlugin: Plugin {
    fn query(&self, request: GraphQlRequest) -> Operation<GraphQlResponse>;

    fn mutate(&self, request: GraphQlRequest) -> Operation<GraphQlResponse>;

    /// Opens a live subscription. The returned stream starts in `Connecting`;
    /// the plugin reports establishment once its handshake completes.
    fn subscribe(&self, request: GraphQlRequest) -> Subscription<GraphQlResponse>;
}
