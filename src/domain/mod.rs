// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Aggregates and their invariants. Nothing in here knows about HTTP,
// configuration or metrics; services drive the aggregates and report what
// happened.
//
// ============================================================================

pub mod order;
