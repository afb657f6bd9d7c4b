pub mod bounds;
pub mod time;
pub mod viewport;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use time::*;
pub use viewport::*;
