//! Plain data for one bootstrap run: the dependencies, the broker channels and
//! the final health report. Nothing here is persisted.

pub mod channel;
pub mod dependency;
pub mod report;

pub use channel::*;
pub use dependency::*;
pub use report::*;
