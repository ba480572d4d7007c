pub mod chart;
pub mod pattern;
pub mod qualitative;
pub mod sentiment;
pub mod signals;

pub use chart::*;
pub use pattern::*;
pub use qualitative::*;
pub use sentiment::*;
pub use signals::*;
