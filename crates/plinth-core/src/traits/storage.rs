// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage category contract (object upload and removal).

use crate::operation::Operation;
use crate::traits::plugin::Plugin;
use crate::types::{
    StorageRemoveRequest, StorageRemoveResult, StorageUploadFileRequest, StorageUploadFileResult,
};

/// Plugin contract for the Storage category.
///
/// Uploads are long transfers and come back as resumable operations;
/// removal is a one-shot operation.
pub trait StoragePlugin: Plugin {
    /// Uploads a local file under `request.key`.
    fn upload_file(&self, request: StorageUploadFileRequest) -> Operation<StorageUploadFileResult>;

    /// Removes the object stored under `request.key`.
    fn remove(&self, request: StorageRemoveRequest) -> Operation<StorageRemoveResult>;
}
