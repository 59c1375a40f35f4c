pub mod engine;
pub mod interp;
pub mod strategies;

pub use engine::MockEngine;
