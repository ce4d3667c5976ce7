//! Console helpers - progress spinners and styled output

pub mod progress;
pub mod styling;

pub use progress::*;
pub use styling::*;
