// ============================================================================
// Order Domain - the order/pancake aggregate
// ============================================================================
//
// - Value objects (ids, OrderState and its transition table)
// - Errors (OrderError taxonomy shared by every service)
// - Pancake and Ingredient
// - Order aggregate (atomic state + copy-on-write pancake list)
// - Events reported to the audit log
//
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod pancake;
pub mod aggregate;
pub mod events;

// Re-export for convenience
pub use value_objects::*;
pub use errors::*;
pub use pancake::*;
pub use aggregate::*;
pub use events::*;
