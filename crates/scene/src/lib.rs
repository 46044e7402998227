pub mod compare;
pub mod controller;
pub mod hierarchy;
pub mod overlay;
pub mod region;
pub mod view_state;

pub use compare::*;
pub use controller::*;
pub use hierarchy::*;
pub use overlay::*;
pub use region::*;
pub use view_state::*;
