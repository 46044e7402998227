pub mod controller;
pub mod engine;
pub mod fallback;

pub use controller::*;
pub use engine::*;
pub use fallback::*;
