// ============================================================================
// Cart Domain - Per-User Line Items
// ============================================================================
//
// A cart is the set of (product, quantity) pairs a user intends to purchase.
// Line subtotals are cached at the unit price current at the last write.
// Stock is only checked here, never decremented; the decrement happens at
// order commit.
//
// ============================================================================

pub mod cart;
pub mod errors;
pub mod service;

pub use cart::*;
pub use errors::*;
pub use service::*;
