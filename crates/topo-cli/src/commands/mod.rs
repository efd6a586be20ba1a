pub mod instantiate;
pub mod kinds;
pub mod plan;
