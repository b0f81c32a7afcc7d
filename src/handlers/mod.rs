pub mod health;
pub mod widgets;

pub use health::*;
pub use widgets::*;
