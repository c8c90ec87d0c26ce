//! 场景物品清单：有序的 名称 → SceneObject 映射
//!
//! 会话开始时构建一次（独占写入），之后通过 `Arc<InventorySnapshot>` 只读共享。
//! 插入顺序即快照顺序，模糊匹配按此顺序扫描；JSON 导出/导入保持顺序且无损。

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Duplicate object id: {0}")]
    DuplicateId(String),

    #[error("Invalid object '{id}': {reason}")]
    InvalidObject { id: String, reason: String },

    #[error("Object not in inventory: {0}")]
    Missing(String),

    #[error("Inventory I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Inventory JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid image pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// 图像中的像素包围框
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// 场景物体：位置、置信度、来源图像与可选包围框；创建后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub id: String,
    pub position: [f64; 3],
    /// 检测置信度，[0, 1]
    pub confidence: f64,
    pub image_file: String,
    pub image_id: String,
    pub bounding_box: Option<BoundingBox>,
}

impl SceneObject {
    fn validate(&self) -> Result<(), InventoryError> {
        let invalid = |reason: &str| InventoryError::InvalidObject {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.trim().is_empty() {
            return Err(invalid("empty id"));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(invalid("confidence outside [0, 1]"));
        }
        if self.position.iter().any(|v| !v.is_finite()) {
            return Err(invalid("non-finite position"));
        }
        Ok(())
    }
}

/// 导出格式中的单条记录（名称作为外层键）
#[derive(Serialize)]
struct ObjectRecordRef<'a> {
    position: &'a [f64; 3],
    image_file: &'a str,
    image_id: &'a str,
    confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    bounding_box: Option<&'a BoundingBox>,
}

#[derive(Deserialize)]
struct ObjectRecord {
    position: [f64; 3],
    image_file: String,
    image_id: String,
    confidence: f64,
    #[serde(default)]
    bounding_box: Option<BoundingBox>,
}

/// 物品清单快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventorySnapshot {
    objects: Vec<SceneObject>,
    index: HashMap<String, usize>,
}

impl InventorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加物体；id 重复或字段非法时拒绝
    pub fn insert(&mut self, object: SceneObject) -> Result<(), InventoryError> {
        object.validate()?;
        if self.index.contains_key(&object.id) {
            return Err(InventoryError::DuplicateId(object.id));
        }
        self.index.insert(object.id.clone(), self.objects.len());
        self.objects.push(object);
        Ok(())
    }

    /// 精确（大小写敏感）查找
    pub fn get(&self, id: &str) -> Option<&SceneObject> {
        self.index.get(id).map(|&i| &self.objects[i])
    }

    /// 精确查找，不存在时返回 [`InventoryError::Missing`]
    pub fn require(&self, id: &str) -> Result<&SceneObject, InventoryError> {
        self.get(id)
            .ok_or_else(|| InventoryError::Missing(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// 按快照顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|o| o.id.as_str())
    }

    /// 前 n 个物体名（编排层的兜底策略使用）
    pub fn first_n(&self, n: usize) -> Vec<String> {
        self.names().take(n).map(String::from).collect()
    }

    pub fn to_json(&self) -> Result<String, InventoryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self, InventoryError> {
        Ok(serde_json::from_str(data)?)
    }
}

impl Serialize for InventorySnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.objects.len()))?;
        for obj in &self.objects {
            map.serialize_entry(
                &obj.id,
                &ObjectRecordRef {
                    position: &obj.position,
                    image_file: &obj.image_file,
                    image_id: &obj.image_id,
                    confidence: obj.confidence,
                    bounding_box: obj.bounding_box.as_ref(),
                },
            )?;
        }
        map.end()
    }
}

struct SnapshotVisitor;

impl<'de> Visitor<'de> for SnapshotVisitor {
    type Value = InventorySnapshot;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of object name to object record")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut snapshot = InventorySnapshot::new();
        while let Some((id, record)) = access.next_entry::<String, ObjectRecord>()? {
            snapshot
                .insert(SceneObject {
                    id,
                    position: record.position,
                    confidence: record.confidence,
                    image_file: record.image_file,
                    image_id: record.image_id,
                    bounding_box: record.bounding_box,
                })
                .map_err(de::Error::custom)?;
        }
        Ok(snapshot)
    }
}

impl<'de> Deserialize<'de> for InventorySnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SnapshotVisitor)
    }
}
