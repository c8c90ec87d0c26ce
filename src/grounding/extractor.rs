//! 模拟感知：为每个物品类别生成一条 SceneObject
//!
//! **这不是检测器。** 位置、置信度与包围框均为随机采样，只用来在没有真实感知系统时
//! 搭出一份结构完整的物品清单，结果不能当作场景真值。
//!
//! - 图像：按类别序号循环分配（`images[i % len]`）；没有图像时图像字段留空
//! - 位置：图像 id 有位姿数据时取位姿位置加小幅偏移（x/y ±0.5，z ±0.2），否则在 x,y∈[-2,2]、z∈[0,1.5] 内均匀采样
//! - 置信度：[0.7, 0.95] 均匀采样
//! - 包围框：x,y∈[50,300)，width,height∈[80,200)

use std::collections::HashMap;
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use crate::grounding::{BoundingBox, InventoryError, InventorySnapshot, SceneObject};

const IMAGE_PREFIX: &str = "color_";
const IMAGE_SUFFIX: &str = ".jpg";

/// 一张彩色图像：文件名与 id（去掉 `color_` 前缀与 `.jpg` 后缀）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub file: String,
    pub id: String,
}

impl ImageRecord {
    pub fn from_file_name(file: impl Into<String>) -> Self {
        let file = file.into();
        let id = file.strip_prefix(IMAGE_PREFIX).unwrap_or(&file);
        let id = id.strip_suffix(IMAGE_SUFFIX).unwrap_or(id).to_string();
        Self { file, id }
    }
}

/// 扫描目录下的 `color_*.jpg`，按文件名排序
pub fn scan_image_files(dir: &Path) -> Result<Vec<ImageRecord>, InventoryError> {
    let pattern = format!(
        "{}/{}*{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        IMAGE_PREFIX,
        IMAGE_SUFFIX
    );
    let paths = glob::glob(&pattern)?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| InventoryError::Io(e.into_error()))?;
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            files.push(name.to_string());
        }
    }
    files.sort();
    tracing::info!("Found {} color images in {}", files.len(), dir.display());
    Ok(files.into_iter().map(ImageRecord::from_file_name).collect())
}

/// 解析 `;` 分隔的类别串
pub fn parse_categories(list: &str) -> Vec<String> {
    list.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Deserialize)]
struct PoseRecord {
    position: [f64; 3],
}

/// 读取位姿 JSON：`{ "<image_id>": { "position": [x, y, z], ... } }`
pub fn load_pose_file(path: &Path) -> Result<HashMap<String, [f64; 3]>, InventoryError> {
    let data = std::fs::read_to_string(path)?;
    let records: HashMap<String, PoseRecord> = serde_json::from_str(&data)?;
    tracing::info!("Loaded {} poses from {}", records.len(), path.display());
    Ok(records
        .into_iter()
        .map(|(id, r)| (id, r.position))
        .collect())
}

/// 模拟物品提取器
#[derive(Debug, Clone, Default)]
pub struct StubExtractor {
    categories: Vec<String>,
    images: Vec<ImageRecord>,
    poses: HashMap<String, [f64; 3]>,
    seed: Option<u64>,
}

impl StubExtractor {
    pub fn new(categories: Vec<String>) -> Self {
        Self {
            categories,
            ..Default::default()
        }
    }

    pub fn with_images(mut self, images: Vec<ImageRecord>) -> Self {
        self.images = images;
        self
    }

    pub fn with_poses(mut self, poses: HashMap<String, [f64; 3]>) -> Self {
        self.poses = poses;
        self
    }

    /// 固定随机种子，使清单可复现
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// ChaCha8 的输出序列跨 rand 版本稳定，同一种子总能复现同一份清单
    fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// 生成物品清单；重复类别只保留第一次出现
    pub fn extract(&self) -> Result<InventorySnapshot, InventoryError> {
        let mut rng = self.rng();
        let mut inventory = InventorySnapshot::new();

        for (i, category) in self.categories.iter().enumerate() {
            if inventory.contains(category) {
                tracing::warn!("Duplicate category '{}' skipped", category);
                continue;
            }

            let image = (!self.images.is_empty()).then(|| &self.images[i % self.images.len()]);
            let pose = image.and_then(|img| self.poses.get(&img.id));

            let position = match pose {
                Some(p) => [
                    p[0] + rng.gen_range(-0.5..=0.5),
                    p[1] + rng.gen_range(-0.5..=0.5),
                    p[2] + rng.gen_range(-0.2..=0.2),
                ],
                None => [
                    rng.gen_range(-2.0..=2.0),
                    rng.gen_range(-2.0..=2.0),
                    rng.gen_range(0.0..=1.5),
                ],
            };

            let object = SceneObject {
                id: category.clone(),
                position,
                confidence: rng.gen_range(0.7..=0.95),
                image_file: image.map(|img| img.file.clone()).unwrap_or_default(),
                image_id: image.map(|img| img.id.clone()).unwrap_or_default(),
                bounding_box: Some(BoundingBox {
                    x: rng.gen_range(50..300),
                    y: rng.gen_range(50..300),
                    width: rng.gen_range(80..200),
                    height: rng.gen_range(80..200),
                }),
            };
            inventory.insert(object)?;
        }

        tracing::info!(
            "Simulated inventory: {} objects from {} categories, {} images, {} poses",
            inventory.len(),
            self.categories.len(),
            self.images.len(),
            self.poses.len()
        );
        Ok(inventory)
    }
}
