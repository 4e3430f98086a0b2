//! Typed clients for the external collaborators.
//!
//! Each client wraps the shared [`CommandRunner`](crate::framework::CommandRunner)
//! (or [`HttpProbe`](crate::framework::HttpProbe)) and knows the exact command
//! lines its service understands. None of them decide whether a failure is fatal.

pub mod app_client;
pub mod broker_client;
pub mod runtime_client;
pub mod service_client;
pub mod store_client;

pub use app_client::*;
pub use broker_client::*;
pub use runtime_client::*;
pub use service_client::ServiceClient;
pub use store_client::*;
