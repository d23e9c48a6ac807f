//! Publishing Module
//!
//! Everything that happens after a palindrome is confirmed.
//!
//! ## Workflow
//! 1. **Resolve**: The author's identifier is turned into a display handle by an
//!    `IdentityResolver`. Failure falls back to the raw identifier.
//! 2. **Compose**: A `Reply` is built with the quoted palindrome, a link back to the
//!    original post and a mention of the author.
//! 3. **Publish**: The reply is handed to a `Publisher`. Failures are logged and
//!    counted, never retried.
//!
//! ## Submodules
//! - **`reply`**: Reply text and link composition.
//! - **`resolver`**: `IdentityResolver` trait plus the PLC directory and static resolvers.
//! - **`publisher`**: `Publisher` trait plus the logging and null publishers.
//! - **`xrpc`**: The Bluesky publisher (session login, post record with facets).

pub mod publisher;
pub mod reply;
pub mod resolver;
pub mod xrpc;

pub use publisher::{LogPublisher, NullPublisher, Publisher};
pub use reply::{ByteSpan, Reply};
pub use resolver::{IdentityResolver, PlcDirectoryResolver, StaticResolver};
pub use xrpc::XrpcPublisher;
