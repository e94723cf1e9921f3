// ============================================================================
// Payment Gateway - External Confirmation of Payments
// ============================================================================
//
// The gateway is the ground truth for "was this payment actually made".
// The client distinguishes "payment does not exist" (4xx, permanent) from
// "gateway unavailable" (5xx / timeout, transient and retryable).
//
// ============================================================================

pub mod payment;

pub use payment::*;
