//! 预置场景：厨房 / 客厅 / 办公室 / 卧室
//!
//! 每个场景给出描述、物品类别与示例任务；未配置类别时作为模拟感知的输入。

/// 预置场景
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenePreset {
    /// 配置中使用的键（如 `kitchen`）
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub objects: &'static [&'static str],
    pub sample_tasks: &'static [&'static str],
}

pub const KITCHEN: ScenePreset = ScenePreset {
    key: "kitchen",
    title: "厨房环境",
    description: "家庭厨房场景，包含各种烹饪和用餐相关物品",
    objects: &[
        "coffee machine", "cup", "mug", "table", "chair", "apple", "banana",
        "water bottle", "microwave", "fridge", "sink", "sponge", "towel",
        "bread", "butter", "knife", "plate", "bowl", "stove", "pot", "pan",
        "cutting board", "spoon", "fork", "glass", "milk", "sugar", "coffee beans",
    ],
    sample_tasks: &["帮我准备咖啡", "清理厨房桌子", "准备简单早餐", "洗碗收拾餐具", "制作水果沙拉"],
};

pub const LIVING_ROOM: ScenePreset = ScenePreset {
    key: "living_room",
    title: "客厅环境",
    description: "家庭客厅场景，包含娱乐和休闲相关物品",
    objects: &[
        "sofa", "tv", "remote control", "coffee table", "lamp", "book",
        "magazine", "cushion", "blanket", "plant", "vase", "picture frame",
        "speaker", "game controller", "laptop", "phone", "charger", "tissue box",
        "candle", "decorative item", "carpet", "curtain",
    ],
    sample_tasks: &["整理客厅桌子", "打开电视看新闻", "调节客厅灯光", "收拾沙发上的物品", "给植物浇水"],
};

pub const OFFICE: ScenePreset = ScenePreset {
    key: "office",
    title: "办公室环境",
    description: "办公室工作场景，包含办公和学习相关物品",
    objects: &[
        "desk", "chair", "computer", "keyboard", "mouse", "monitor", "printer",
        "paper", "pen", "pencil", "notebook", "folder", "stapler", "calculator",
        "phone", "lamp", "trash can", "water bottle", "coffee cup", "calendar",
        "whiteboard", "marker", "eraser", "filing cabinet",
    ],
    sample_tasks: &["整理办公桌", "打印重要文件", "准备会议材料", "清空垃圾桶", "整理文件夹"],
};

pub const BEDROOM: ScenePreset = ScenePreset {
    key: "bedroom",
    title: "卧室环境",
    description: "卧室休息场景，包含睡眠和个人护理相关物品",
    objects: &[
        "bed", "pillow", "blanket", "nightstand", "lamp", "alarm clock",
        "wardrobe", "clothes", "shoes", "mirror", "brush", "towel",
        "book", "phone", "charger", "tissue", "water glass", "curtain",
        "laundry basket", "hangers", "jewelry box", "perfume",
    ],
    sample_tasks: &["整理床铺", "收拾衣物", "设置闹钟", "关闭窗帘", "准备睡前用品"],
};

pub const SCENE_PRESETS: [ScenePreset; 4] = [KITCHEN, LIVING_ROOM, OFFICE, BEDROOM];

/// 按键或中文标题查找场景（键大小写不敏感，`-` 与 `_` 等价）
pub fn find_scene(name: &str) -> Option<&'static ScenePreset> {
    let key = name.trim().to_lowercase().replace('-', "_");
    SCENE_PRESETS
        .iter()
        .find(|s| s.key == key || s.title == name.trim())
}

impl ScenePreset {
    pub fn categories(&self) -> Vec<String> {
        self.objects.iter().map(|s| s.to_string()).collect()
    }
}
