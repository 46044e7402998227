pub mod boundary;
pub mod profile;
pub mod topology;

pub use boundary::*;
pub use profile::*;
pub use topology::*;
