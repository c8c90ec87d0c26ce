//! 物品清单持久化
//!
//! 将快照写入/从 JSON 文件加载，外层键为物体名，顺序与快照一致。

use std::path::{Path, PathBuf};

use crate::grounding::{InventoryError, InventorySnapshot};

/// 单文件 JSON 持久化
#[derive(Debug, Clone)]
pub struct InventoryPersistence {
    path: PathBuf,
}

impl InventoryPersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 从 JSON 文件加载快照；文件不存在时返回 Io 错误（NotFound）
    pub fn load(&self) -> Result<InventorySnapshot, InventoryError> {
        let data = std::fs::read_to_string(&self.path)?;
        let snapshot = InventorySnapshot::from_json(&data)?;
        tracing::info!("Loaded {} objects from {}", snapshot.len(), self.path.display());
        Ok(snapshot)
    }

    /// 写入 JSON 文件；父目录不存在时自动创建
    pub fn save(&self, snapshot: &InventorySnapshot) -> Result<(), InventoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, snapshot.to_json()?)?;
        tracing::info!("Saved {} objects to {}", snapshot.len(), self.path.display());
        Ok(())
    }
}

impl InventorySnapshot {
    /// 等价于 `InventoryPersistence::new(path).save(self)`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), InventoryError> {
        InventoryPersistence::new(path).save(self)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, InventoryError> {
        InventoryPersistence::new(path).load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grounding::inventory::tests::snapshot;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = InventoryPersistence::new(dir.path().join("nested/inventory.json"));
        let inv = snapshot(&["sofa", "lamp", "遥控器"]);

        store.save(&inv).unwrap();
        let back = store.load().unwrap();
        assert_eq!(back, inv);
        assert_eq!(InventorySnapshot::load(store.path()).unwrap(), inv);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = InventoryPersistence::new(dir.path().join("absent.json"));
        assert!(matches!(store.load(), Err(InventoryError::Io(_))));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            InventoryPersistence::new(&path).load(),
            Err(InventoryError::Json(_))
        ));
    }
}
