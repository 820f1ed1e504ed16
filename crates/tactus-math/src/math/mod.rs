//! Core math modules.

pub mod regress;
pub mod special;
pub mod truncnorm;
pub mod weights;
