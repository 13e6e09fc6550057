//! Small, dependency-free helpers shared across features.

mod cancellation;
mod id_allocator;

pub use cancellation::CancellationToken;
pub use id_allocator::{IdAllocator, INVALID};
