//! Domain models for the valuation report system.

mod layout;
mod report;
mod user;

pub use layout::*;
pub use report::*;
pub use user::*;
