// ============================================================================
// Review Domain - Per-Product Reviews and Rating Aggregation
// ============================================================================
//
// One review per (user, product). Every write recomputes the product's
// average rating from the full review set, so the cached average on the
// product row never drifts.
//
// ============================================================================

pub mod errors;
pub mod review;
pub mod service;

pub use errors::*;
pub use review::*;
pub use service::*;
