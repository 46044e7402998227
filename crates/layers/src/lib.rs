pub mod metrics;
pub mod region_layer;
pub mod symbology;

pub use metrics::*;
pub use region_layer::*;
pub use symbology::*;
