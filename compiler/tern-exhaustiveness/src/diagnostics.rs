//! All diagnostics related to exhaustiveness and reachability checking, plus
//! the internal error type the analysis traversals thread through.
use std::{error::Error, fmt};

use tern_source::location::Span;
use tern_utils::printing::SequenceDisplay;

/// A failure of the analysis itself, as opposed to a finding about the
/// checked program. These arise when the handed-in patterns are broken in a
/// way earlier stages should have rejected, like two tuple widths sharing a
/// column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// A join of two patterns with no common instance was requested.
    IncompatiblePatterns,

    /// Patterns of different shape met in one column.
    ShapeMismatch { expected: usize, found: usize },

    /// Constants of different kinds met in one column.
    ConstantMismatch,

    /// A record pattern listed a field its type does not declare.
    UnknownTag { name: String },

    /// An or-pattern reached a position that requires a plain head.
    UnresolvedOr,
}

pub type Result<T, E = CheckError> = std::result::Result<T, E>;

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::IncompatiblePatterns => {
                write!(f, "cannot join patterns that share no instance")
            }
            CheckError::ShapeMismatch { expected, found } => {
                write!(f, "mismatched pattern shapes: expected {expected} sub-patterns, found {found}")
            }
            CheckError::ConstantMismatch => {
                write!(f, "constants of different kinds share a column")
            }
            CheckError::UnknownTag { name } => write!(f, "unknown field or tag `{name}`"),
            CheckError::UnresolvedOr => {
                write!(f, "or-pattern in a position that requires a plain constructor")
            }
        }
    }
}

impl Error for CheckError {}

/// Errors that can be emitted during exhaustiveness checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExhaustivenessError {
    /// A match block fails to cover every value of its subject type. The
    /// uncovered patterns come pre-rendered so that diagnostics outlive the
    /// pattern arena they were built in.
    NonExhaustiveMatch {
        /// The location of the match subject.
        location: Span,

        /// Rendered witness patterns that no arm covers.
        uncovered: Vec<String>,

        /// Whether a guarded arm would have matched the witness; the match
        /// still counts as partial, but the message should say why.
        may_be_guarded: bool,
    },

    /// A pattern in a binding position (declaration, for-loop) does not
    /// cover every value of its type.
    RefutablePat {
        /// The location of the binding pattern.
        location: Span,

        /// Rendered witness patterns the binding does not cover.
        uncovered: Vec<String>,
    },
}

impl ExhaustivenessError {
    pub fn location(&self) -> Span {
        match self {
            ExhaustivenessError::NonExhaustiveMatch { location, .. }
            | ExhaustivenessError::RefutablePat { location, .. } => *location,
        }
    }
}

impl fmt::Display for ExhaustivenessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhaustivenessError::NonExhaustiveMatch { uncovered, may_be_guarded, .. } => {
                write!(f, "non-exhaustive patterns: {} not covered", SequenceDisplay::all(uncovered))?;
                if *may_be_guarded {
                    write!(f, "; a guarded arm may match such values, but guards can fail")?;
                }
                Ok(())
            }
            ExhaustivenessError::RefutablePat { uncovered, .. } => {
                write!(
                    f,
                    "refutable pattern in binding: {} not covered",
                    SequenceDisplay::all(uncovered)
                )
            }
        }
    }
}

/// Warnings that can be emitted by the exhaustiveness checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExhaustivenessWarning {
    /// The match case is fully shadowed by the cases before it and will
    /// never be the one that matches.
    UnusedMatchCase {
        /// The location of the unused case.
        location: Span,

        /// The rendered pattern of the case.
        pat: String,
    },

    /// One alternative of an or-pattern can never be the matching one, even
    /// though the case as a whole is reachable.
    UnusedOrAlternative {
        /// The location of the dead alternative.
        location: Span,

        /// The rendered alternative.
        pat: String,
    },

    /// The match ends in cases that would absorb any newly declared
    /// constructor of a sum type it names, so growing the type later will
    /// not resurface the match for review.
    FragileMatch {
        /// The location of the latest absorbing case.
        location: Span,

        /// The rendered name of the type whose constructors are matched.
        ty: String,
    },
}

impl ExhaustivenessWarning {
    pub fn location(&self) -> Span {
        match self {
            ExhaustivenessWarning::UnusedMatchCase { location, .. }
            | ExhaustivenessWarning::UnusedOrAlternative { location, .. }
            | ExhaustivenessWarning::FragileMatch { location, .. } => *location,
        }
    }
}

impl fmt::Display for ExhaustivenessWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhaustivenessWarning::UnusedMatchCase { pat, .. } => {
                write!(f, "match case `{pat}` is never reached")
            }
            ExhaustivenessWarning::UnusedOrAlternative { pat, .. } => {
                write!(f, "alternative `{pat}` of this or-pattern is never reached")
            }
            ExhaustivenessWarning::FragileMatch { ty, .. } => {
                write!(f, "fragile match: it will stay total when new `{ty}` constructors are declared")
            }
        }
    }
}

/// The diagnostics accumulated over one checker run, split into hard errors
/// and advisory warnings.
#[derive(Debug, Default)]
pub struct ExhaustivenessDiagnostics {
    errors: Vec<ExhaustivenessError>,
    warnings: Vec<ExhaustivenessWarning>,
}

impl ExhaustivenessDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error into the store.
    pub fn add_error(&mut self, error: ExhaustivenessError) {
        self.errors.push(error);
    }

    /// Add a warning into the store.
    pub fn add_warning(&mut self, warning: ExhaustivenessWarning) {
        self.warnings.push(warning);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn errors(&self) -> &[ExhaustivenessError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[ExhaustivenessWarning] {
        &self.warnings
    }

    /// Convert the store into its respective parts.
    pub fn into_diagnostics(self) -> (Vec<ExhaustivenessError>, Vec<ExhaustivenessWarning>) {
        (self.errors, self.warnings)
    }
}
