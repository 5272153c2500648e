pub mod constants;
pub mod event_bus;
pub mod sort_order;
pub mod util;
pub mod value;

pub use constants::*;
pub use event_bus::*;
pub use sort_order::*;
pub use util::*;
pub use value::*;
