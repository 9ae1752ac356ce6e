//! The failure classifier: one place where remote error text gets a name.

use std::borrow::Cow;

use crate::error::{Error, ErrorKind};

use super::{ClassifyContext, Operation};

/// What the state machine should do with a failed mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Transient server fault on a brand-new resource; retry with backoff.
    Retryable,
    /// The create failed because the desired state already exists; resolve
    /// the authoritative instance and treat the operation as a success.
    ConflictAsSuccess,
    /// The target is already gone; deleting or reading it is a success.
    Absent,
    /// Surface to the caller with the underlying message preserved.
    Fatal,
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disposition::Retryable => write!(f, "retryable"),
            Disposition::ConflictAsSuccess => write!(f, "conflict-as-success"),
            Disposition::Absent => write!(f, "absent"),
            Disposition::Fatal => write!(f, "fatal"),
        }
    }
}

/// Classifies failures from mutating calls into a stable local taxonomy.
///
/// Thin control planes report "already exists", "already gone" and
/// "server hiccup" through unstructured error text or coarse status codes
/// rather than a typed channel. The matching that turns that text into
/// a [`Disposition`] lives here and nowhere else, so when the remote
/// service changes its phrasing there is exactly one place to fix.
///
/// Rules, evaluated in order:
///
/// 1. On delete or read, a not-found signal is [`Disposition::Absent`].
/// 2. On create, a duplicate signal is [`Disposition::ConflictAsSuccess`].
/// 3. For a brand-new resource, a transient signal (structured transient
///    [`ErrorKind`] or an embedded 5xx status token) is
///    [`Disposition::Retryable`].
/// 4. Everything else is [`Disposition::Fatal`].
///
/// Text matching is case-insensitive, which covers both the `"not found"`
/// and `"Not found"` spellings remote services have been observed to emit.
///
/// ## Example
///
/// ```rust
/// use thinplane::classify::{ClassifyContext, Disposition, FailureClassifier};
/// use thinplane::{Error, ErrorKind};
///
/// let classifier = FailureClassifier::new()
///     .with_conflict_marker("already a member of");
///
/// let err = Error::new(ErrorKind::Unknown, "user is already a member of team 9");
/// assert_eq!(
///     classifier.classify(&err, ClassifyContext::create(true)),
///     Disposition::ConflictAsSuccess,
/// );
/// ```
#[derive(Debug, Clone)]
pub struct FailureClassifier {
    conflict_markers: Vec<Cow<'static, str>>,
    absent_markers: Vec<Cow<'static, str>>,
    transient_markers: Vec<Cow<'static, str>>,
}

impl Default for FailureClassifier {
    fn default() -> Self {
        Self {
            conflict_markers: vec![Cow::Borrowed("already has access")],
            absent_markers: vec![Cow::Borrowed("not found")],
            transient_markers: vec![
                Cow::Borrowed("500"),
                Cow::Borrowed("502"),
                Cow::Borrowed("503"),
                Cow::Borrowed("504"),
            ],
        }
    }
}

impl FailureClassifier {
    /// Creates a classifier with the default markers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an additional duplicate-create phrase for this
    /// relationship type.
    #[must_use]
    pub fn with_conflict_marker(mut self, marker: impl Into<Cow<'static, str>>) -> Self {
        self.conflict_markers.push(marker.into());
        self
    }

    /// Registers an additional not-found phrase.
    #[must_use]
    pub fn with_absent_marker(mut self, marker: impl Into<Cow<'static, str>>) -> Self {
        self.absent_markers.push(marker.into());
        self
    }

    /// Registers an additional transient-fault token.
    #[must_use]
    pub fn with_transient_marker(mut self, marker: impl Into<Cow<'static, str>>) -> Self {
        self.transient_markers.push(marker.into());
        self
    }

    /// Classifies a failure from a mutating call.
    pub fn classify(&self, err: &Error, ctx: ClassifyContext) -> Disposition {
        let disposition = self.classify_inner(err, ctx);
        tracing::debug!(
            operation = %ctx.operation,
            new_resource = ctx.new_resource,
            kind = ?err.kind(),
            %disposition,
            "classified failure"
        );
        disposition
    }

    fn classify_inner(&self, err: &Error, ctx: ClassifyContext) -> Disposition {
        if matches!(ctx.operation, Operation::Delete | Operation::Read)
            && self.is_absent(err)
        {
            return Disposition::Absent;
        }
        if ctx.operation == Operation::Create && self.is_conflict(err) {
            return Disposition::ConflictAsSuccess;
        }
        if ctx.new_resource && self.is_transient(err) {
            return Disposition::Retryable;
        }
        Disposition::Fatal
    }

    /// Returns `true` if the error signals the target no longer exists.
    pub fn is_absent(&self, err: &Error) -> bool {
        err.kind() == ErrorKind::NotFound || self.matches(err, &self.absent_markers)
    }

    /// Returns `true` if the error signals the target already exists.
    pub fn is_conflict(&self, err: &Error) -> bool {
        err.kind() == ErrorKind::Conflict || self.matches(err, &self.conflict_markers)
    }

    /// Returns `true` if the error signals a transient server fault.
    pub fn is_transient(&self, err: &Error) -> bool {
        err.kind().is_transient() || self.matches(err, &self.transient_markers)
    }

    fn matches(&self, err: &Error, markers: &[Cow<'static, str>]) -> bool {
        let message = err.message().to_ascii_lowercase();
        markers
            .iter()
            .any(|marker| message.contains(&marker.to_ascii_lowercase()))
    }
}
