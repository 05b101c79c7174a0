//! Internal implementation details.

pub(crate) mod circular;

pub use circular::CircularPanic;
pub(crate) use circular::with_circular_catch;
