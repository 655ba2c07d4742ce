pub mod deadline;
pub mod month;
pub mod pagination;

pub use deadline::with_deadline;
pub use month::{format_month, month_start, parse_month};
pub use pagination::PageWindow;
