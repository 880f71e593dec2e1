// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analytics category contract.

use crate::error::PlinthError;
use crate::operation::Operation;
use crate::traits::plugin::Plugin;
use crate::types::AnalyticsEvent;

/// Plugin contract for the Analytics category.
///
/// Events are buffered by the plugin; `flush` submits the buffer and
/// resolves to the number of events sent.
pub trait AnalyticsPlugin: Plugin {
    fn record_event(&self, event: AnalyticsEvent) -> Result<(), PlinthError>;

    fn flush(&self) -> Operation<usize>;
}
