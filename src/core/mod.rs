pub mod curator;
pub mod discovery;
pub mod hash;
pub mod pipeline;
pub mod predicate;
pub mod saturation;
