//! # Validation Context
//!
//! Per-call state threaded through every composite `validate` call: the
//! path from the root schema to the component currently being checked, the
//! [`ValidationMode`], and, in lazy mode, the sink collecting violations.
//!
//! Descending into a sub-schema goes through [`ValidationContext::push`],
//! which copies the path and shares the sink. Sibling branches never see
//! each other's path segments, and every branch reports into one sink.
//!
//! A context holds an `Rc<RefCell<..>>` and is therefore `!Send`: a lazy
//! context must stay on the thread that created it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, ValidationError};

/// Path rendered for the root of the schema tree.
pub const ROOT_PATH: &str = "<root>";

/// How a validation call reports schema mismatches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Fail on the first mismatch.
    #[default]
    Eager,
    /// Record every mismatch and keep going.
    Lazy,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eager => "eager",
            Self::Lazy => "lazy",
        })
    }
}

/// A single recorded mismatch with the path it was raised at.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Dotted path through the schema tree.
    pub path: String,
    /// The mismatch.
    pub error: SchemaError,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}: {}", self.path, self.error)
    }
}

/// Aggregate outcome of a validation call. Empty iff the candidate is valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns true if no violation was recorded.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations, in the order they were recorded.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }

    /// Iterates over the paths of all violations.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.path.as_str())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

type Sink = Rc<RefCell<Vec<Violation>>>;

/// Path-tracking, error-aggregating state for one validation call.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    path: Vec<String>,
    mode: ValidationMode,
    sink: Option<Sink>,
}

impl ValidationContext {
    /// A fresh root context in the given mode.
    pub fn new(mode: ValidationMode) -> Self {
        let sink = match mode {
            ValidationMode::Eager => None,
            ValidationMode::Lazy => Some(Sink::default()),
        };
        Self {
            path: Vec::new(),
            mode,
            sink,
        }
    }

    /// A fresh fail-fast root context.
    pub fn eager() -> Self {
        Self::new(ValidationMode::Eager)
    }

    /// A fresh aggregating root context.
    pub fn lazy() -> Self {
        Self::new(ValidationMode::Lazy)
    }

    /// The active mode.
    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// The path segments from the root to this context.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// A child context with `segment` appended to the path. The error sink
    /// is shared with `self`.
    pub fn push(&self, segment: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(segment.into());
        Self {
            path,
            mode: self.mode,
            sink: self.sink.clone(),
        }
    }

    /// The path joined with `.`, or [`ROOT_PATH`] at the root.
    pub fn path_string(&self) -> String {
        if self.path.is_empty() {
            ROOT_PATH.to_string()
        } else {
            self.path.join(".")
        }
    }

    /// Route a mismatch according to the mode: eager returns it as an
    /// error attributed to this path, lazy records it and returns `Ok`.
    pub fn handle_error(&self, error: SchemaError) -> Result<(), ValidationError> {
        let path = self.path_string();
        match &self.sink {
            Some(sink) => {
                tracing::debug!(%path, %error, "recorded schema violation");
                sink.borrow_mut().push(Violation { path, error });
                Ok(())
            }
            None => Err(ValidationError::Schema {
                path,
                source: error,
            }),
        }
    }

    /// Apply [`handle_error`](Self::handle_error) to a leaf result.
    pub fn check(&self, result: Result<(), SchemaError>) -> Result<(), ValidationError> {
        match result {
            Ok(()) => Ok(()),
            Err(e) => self.handle_error(e),
        }
    }

    /// Returns true if any violation has been recorded.
    pub fn has_errors(&self) -> bool {
        self.sink.as_ref().is_some_and(|s| !s.borrow().is_empty())
    }

    /// A snapshot of every violation recorded so far. Always empty in
    /// eager mode.
    pub fn report(&self) -> ValidationReport {
        let violations = self
            .sink
            .as_ref()
            .map(|s| s.borrow().clone())
            .unwrap_or_default();
        ValidationReport { violations }
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::eager()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch() -> SchemaError {
        SchemaError::Name {
            actual: "foo".into(),
            expected: "bar".into(),
        }
    }

    #[test]
    fn test_root_path_string() {
        assert_eq!(ValidationContext::eager().path_string(), "<root>");
    }

    #[test]
    fn test_push_does_not_leak_into_siblings() {
        let root = ValidationContext::eager();
        let left = root.push("data_vars.foo");
        let right = root.push("attrs");
        let deep = left.push("dims");
        assert_eq!(deep.path_string(), "data_vars.foo.dims");
        assert_eq!(right.path_string(), "attrs");
        assert!(root.path().is_empty());
    }

    #[test]
    fn test_eager_handle_error_returns_error_with_path() {
        let ctx = ValidationContext::eager().push("name");
        let err = ctx.handle_error(mismatch()).unwrap_err();
        match err {
            ValidationError::Schema { path, source } => {
                assert_eq!(path, "name");
                assert_eq!(source, mismatch());
            }
            other => panic!("Expected Schema error, got: {other}"),
        }
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_lazy_sink_is_shared_across_pushes() {
        let root = ValidationContext::lazy();
        root.push("a").handle_error(mismatch()).unwrap();
        root.push("b").push("c").handle_error(mismatch()).unwrap();
        assert!(root.has_errors());
        let report = root.report();
        assert_eq!(report.len(), 2);
        assert_eq!(report.paths().collect::<Vec<_>>(), vec!["a", "b.c"]);
    }

    #[test]
    fn test_check_passes_ok_through() {
        let ctx = ValidationContext::lazy();
        ctx.check(Ok(())).unwrap();
        assert!(ctx.report().is_valid());
    }

    #[test]
    fn test_report_display() {
        let ctx = ValidationContext::lazy();
        ctx.push("name").handle_error(mismatch()).unwrap();
        ctx.handle_error(mismatch()).unwrap();
        let display = ctx.report().to_string();
        assert_eq!(display, "  name: name foo != bar\n  <root>: name foo != bar");
    }

    #[test]
    fn test_mode_serde_format() {
        assert_eq!(serde_json::to_string(&ValidationMode::Lazy).unwrap(), "\"lazy\"");
        assert_eq!(ValidationMode::default(), ValidationMode::Eager);
    }
}
