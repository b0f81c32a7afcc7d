pub mod api;
pub mod result_item;

pub use api::*;
pub use result_item::*;
