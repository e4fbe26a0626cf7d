//! Storage abstractions for the seen-set.
//!
//! The state is a single JSON file holding an array of identifiers:
//!
//! ```text
//! seen_announcements.json   # ["Title_Date", ...]
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::SeenSet;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for seen-set storage backends.
#[async_trait]
pub trait SeenStorage: Send + Sync {
    /// Load the delivered identifiers.
    ///
    /// A missing or unreadable backing resource yields an empty set.
    async fn load(&self) -> SeenSet;

    /// Replace the persisted identifiers with `seen`.
    async fn save(&self, seen: &SeenSet) -> Result<()>;
}
