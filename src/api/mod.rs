//! Endpoint wrappers.
//!
//! Each wrapper owns a [`NowClient`](crate::NowClient) bound to its API path
//! and maps one method to one endpoint.

mod attachment;
mod sync;
mod table;

pub use attachment::{AttachmentApi, DEFAULT_ATTACHMENT_URL};
pub use sync::{SyncApi, DEFAULT_SYNC_URL};
pub use table::{TableApi, DEFAULT_TABLE_URL};
