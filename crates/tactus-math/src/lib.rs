//! Tactus tracking math utilities.

pub mod math;

pub use math::regress::*;
pub use math::special::*;
pub use math::truncnorm::*;
pub use math::weights::*;
