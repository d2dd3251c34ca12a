use async_trait::async_trait;
use serde_json::Value;

use crate::errors::CoreError;

/// Read access to a hierarchical document store (Dependency Inversion).
///
/// Paths are `/`-joined keys, e.g. `electricity_usage/1112/2024-03-01/13`.
/// A value is whatever lives at that node: a scalar, an array or an object
/// holding the whole subtree. Missing nodes read as `Ok(None)`.
#[async_trait]
pub trait StoreReader: Send + Sync {
    /// Human-readable name of this backend (for logs/errors).
    fn name(&self) -> &str;

    /// Read the subtree at `path`.
    async fn get(&self, path: &str) -> Result<Option<Value>, CoreError>;
}

/// Write access, for the account side of the system.
#[async_trait]
pub trait StoreWriter: StoreReader {
    /// Replace the subtree at `path` with `value`.
    async fn set(&self, path: &str, value: Value) -> Result<(), CoreError>;

    /// Whether a node exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool, CoreError> {
        Ok(self.get(path).await?.is_some())
    }
}
