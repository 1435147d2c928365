//! Per-build classification of modules as CommonJS or not
//!
//! Classification is published as a future so a dependent's proxy can be
//! requested while the module itself is still being transformed. Each module
//! is registered exactly once per build.

use crate::error::{CommonJsError, Result};
use crate::memo::{MemoMap, MemoState};
use std::future::Future;

/// Observable classification of one module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationState {
    /// Definitively not CommonJS; the module was skipped or passed through
    Null,
    /// Registered or awaited, not settled yet
    Pending,
    /// `true` for CommonJS, `false` for ES modules and failed classifications
    Settled(bool),
}

/// Maps module ids to their (possibly pending) classification
///
/// A registered future yields `None` for "not CommonJS, no transform needed"
/// and `Some(is_commonjs)` otherwise.
#[derive(Debug, Default)]
pub struct ClassificationRegistry {
    classifications: MemoMap<String, Option<bool>>,
}

impl ClassificationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the classification future for `id`.
    ///
    /// Fails with [`CommonJsError::DuplicateClassification`] if `id` was
    /// already registered in this build.
    pub fn set_classification<F>(&self, id: &str, classification: F) -> Result<()>
    where
        F: Future<Output = Option<bool>> + Send + 'static,
    {
        self.classifications
            .set(id.to_string(), classification)
            .map_err(|_| CommonJsError::DuplicateClassification { id: id.to_string() })
    }

    /// Resolve to whether `id` is CommonJS.
    ///
    /// `null` classifications, failures and registrations abandoned with
    /// the build all resolve to `false`. If `id` has not been registered yet
    /// the returned future waits for the registration.
    pub fn get_classification(&self, id: &str) -> impl Future<Output = bool> + Send + use<> {
        let classification = self.classifications.get(id);
        async move { classification.await.flatten().unwrap_or(false) }
    }

    /// Current state of `id` without awaiting; `None` if it was never seen
    pub fn state(&self, id: &str) -> Option<ClassificationState> {
        match self.classifications.state(id) {
            MemoState::Vacant => None,
            MemoState::Pending => Some(ClassificationState::Pending),
            MemoState::Ready(None) => Some(ClassificationState::Null),
            MemoState::Ready(Some(is_commonjs)) => Some(ClassificationState::Settled(is_commonjs)),
        }
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.classifications.is_registered(id)
    }
}
