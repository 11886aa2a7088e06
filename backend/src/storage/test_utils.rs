/// Test utilities module for automatic cleanup and consistent test infrastructure
///
/// This module provides RAII-based cleanup that guarantees test data is removed
/// even if tests panic or fail.

use anyhow::Result;
use std::sync::Arc;
use tempfile::TempDir;

use super::json_file::JsonFileStorage;
use super::memory::MemoryStorage;
use super::traits::KeyValueStorage;

/// Test environment that provides a temporary directory that will be
/// automatically cleaned up when the environment is dropped.
pub struct TestEnvironment {
    /// Base directory path for manual inspection if needed
    pub base_path: std::path::PathBuf,
    _temp_dir: TempDir, // Keep alive to prevent cleanup
}

impl TestEnvironment {
    /// Create a new test environment with a temporary directory
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        Ok(Self {
            base_path: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        })
    }

    /// File-backed storage rooted in this environment
    pub fn file_storage(&self) -> Result<Arc<dyn KeyValueStorage>> {
        Ok(Arc::new(JsonFileStorage::new(&self.base_path)?))
    }
}

/// Fresh in-memory storage
pub fn memory_storage() -> Arc<dyn KeyValueStorage> {
    Arc::new(MemoryStorage::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_cleanup() {
        let base_path = {
            let env = TestEnvironment::new().unwrap();
            let storage = env.file_storage().unwrap();
            storage.set("k", "v").unwrap();
            assert!(env.base_path.exists());
            env.base_path.clone()
        };

        // Directory is removed once the environment is dropped
        assert!(!base_path.exists());
    }
}
