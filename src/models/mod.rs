//! ServiceNow data shapes.

mod attachment;
mod record;
mod sync;
mod table;

pub use attachment::*;
pub use record::*;
pub use sync::*;
pub use table::*;
