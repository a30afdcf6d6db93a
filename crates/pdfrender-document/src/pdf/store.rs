// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Owned copy of the bytes a document was opened from.

use std::sync::Arc;

/// Immutable document bytes, shared with the engine for the lifetime of the
/// engine document. Never handed to callers.
#[derive(Clone)]
pub(crate) struct RawByteStore {
    bytes: Arc<[u8]>,
}

impl RawByteStore {
    /// Copy `content` into a new store.
    pub(crate) fn copy_from(content: &[u8]) -> Self {
        Self {
            bytes: Arc::from(content),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    /// A reference to the bytes for the engine to hold while it loads and
    /// renders.
    pub(crate) fn share(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }
}

impl std::fmt::Debug for RawByteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawByteStore")
            .field("len", &self.len())
            .finish()
    }
}
