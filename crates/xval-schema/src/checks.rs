//! # Extra Checks
//!
//! Named user-supplied validation functions run after an array or dataset
//! schema's structural checks. A check's error is not a schema mismatch:
//! it aborts validation as [`ValidationError::Check`] in both modes.
//!
//! Checks are code, so they are not part of a schema's plain-data form.

use std::fmt;
use std::sync::Arc;

use xval_core::{ArrayLike, CheckError, DatasetLike, ValidationContext, ValidationError};

/// A named check over values of type `F`'s argument.
pub struct Check<F: ?Sized> {
    name: String,
    func: Arc<F>,
}

/// Check run against an array.
pub type ArrayCheck = Check<dyn Fn(&dyn ArrayLike) -> Result<(), CheckError> + Send + Sync>;

/// Check run against a dataset.
pub type DatasetCheck = Check<dyn Fn(&dyn DatasetLike) -> Result<(), CheckError> + Send + Sync>;

impl<F: ?Sized> Check<F> {
    /// The name the check was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn failed(&self, ctx: &ValidationContext, source: CheckError) -> ValidationError {
        tracing::debug!(check = %self.name, path = %ctx.path_string(), "extra check failed");
        ValidationError::Check {
            name: self.name.clone(),
            path: ctx.path_string(),
            source,
        }
    }
}

impl ArrayCheck {
    /// Wrap `func` as a check reported under `name`.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&dyn ArrayLike) -> Result<(), CheckError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub(crate) fn run(
        &self,
        array: &dyn ArrayLike,
        ctx: &ValidationContext,
    ) -> Result<(), ValidationError> {
        (self.func)(array).map_err(|e| self.failed(ctx, e))
    }
}

impl DatasetCheck {
    /// Wrap `func` as a check reported under `name`.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&dyn DatasetLike) -> Result<(), CheckError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub(crate) fn run(
        &self,
        dataset: &dyn DatasetLike,
        ctx: &ValidationContext,
    ) -> Result<(), ValidationError> {
        (self.func)(dataset).map_err(|e| self.failed(ctx, e))
    }
}

impl<F: ?Sized> Clone for Check<F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Check<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check").field("name", &self.name).finish_non_exhaustive()
    }
}
