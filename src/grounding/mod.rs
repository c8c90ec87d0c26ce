//! 落地层：场景物品清单、物体匹配、模拟感知、预置场景与清单持久化

pub mod extractor;
pub mod inventory;
pub mod matcher;
pub mod persistence;
pub mod scenes;

pub use extractor::{load_pose_file, parse_categories, scan_image_files, ImageRecord, StubExtractor};
pub use inventory::{BoundingBox, InventoryError, InventorySnapshot, SceneObject};
pub use matcher::{ground_objects, grounded_names, GroundedMatch, MatchKind};
pub use persistence::InventoryPersistence;
pub use scenes::{find_scene, ScenePreset, BEDROOM, KITCHEN, LIVING_ROOM, OFFICE, SCENE_PRESETS};
