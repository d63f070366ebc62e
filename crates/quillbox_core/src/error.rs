//! Shared failure classification exposed to the request-handling layer.
//!
//! Every service error maps itself onto one of these kinds via `kind()`,
//! so the transport boundary can translate failures without matching on
//! service-specific variants. The expected correspondence is `NotFound` →
//! 404, `Forbidden` → 403, `Conflict`/`Invalid` → 400 and `Internal` → 500;
//! the actual mapping is owned by the boundary, not by this crate.

/// Coarse classification of a failed core operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A referenced entity is absent.
    NotFound,
    /// The acting user is authenticated but not authorized for this action.
    Forbidden,
    /// The operation is well-formed but violates a state invariant.
    Conflict,
    /// The input is malformed.
    Invalid,
    /// Unexpected persistence-layer failure; never retried inside the core.
    Internal,
}
