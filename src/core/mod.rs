//! In-memory catalog store and recommendation ranking.

/// Per-user libraries and every catalog operation.
pub mod catalog;
/// Co-rating recommendation ranking.
pub mod recommend;
