pub mod address;
pub mod money;
pub mod serial;
pub mod value;

pub use money::Money;
pub use serial::SerialDate;
pub use value::{Cell, Value};
