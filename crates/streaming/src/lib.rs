pub mod cache;
pub mod capabilities;
pub mod loader;
pub mod request;
pub mod residency;
pub mod source;

pub use cache::*;
pub use capabilities::*;
pub use loader::*;
pub use request::*;
pub use residency::*;
pub use source::*;
