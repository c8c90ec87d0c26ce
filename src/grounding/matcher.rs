//! 物体落地：把提议的物体名匹配到场景物品清单
//!
//! 对每个提议依次：
//! 1. 精确匹配（大小写敏感）→ Exact，不再做模糊扫描
//! 2. 按快照顺序扫描，提议与物品名（均转小写）互为子串即命中，取第一个 → Fuzzy
//! 3. 否则 None
//!
//! 只读清单，无副作用；结果与提议一一对应、顺序一致。兜底替换不在这里做。

use serde::Serialize;

use crate::grounding::InventorySnapshot;

/// 匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    None,
}

/// 单个提议的落地结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroundedMatch {
    pub proposal: String,
    /// 命中的清单物体 id
    pub matched_object: Option<String>,
    pub kind: MatchKind,
}

impl GroundedMatch {
    pub fn is_grounded(&self) -> bool {
        self.matched_object.is_some()
    }
}

/// 对提议列表逐个落地，返回等长、同序的结果
pub fn ground_objects(proposals: &[String], inventory: &InventorySnapshot) -> Vec<GroundedMatch> {
    proposals
        .iter()
        .map(|proposal| ground_one(proposal, inventory))
        .collect()
}

fn ground_one(proposal: &str, inventory: &InventorySnapshot) -> GroundedMatch {
    if inventory.contains(proposal) {
        return GroundedMatch {
            proposal: proposal.to_string(),
            matched_object: Some(proposal.to_string()),
            kind: MatchKind::Exact,
        };
    }

    match fuzzy_match(proposal, inventory) {
        Some(name) => GroundedMatch {
            proposal: proposal.to_string(),
            matched_object: Some(name.to_string()),
            kind: MatchKind::Fuzzy,
        },
        None => GroundedMatch {
            proposal: proposal.to_string(),
            matched_object: None,
            kind: MatchKind::None,
        },
    }
}

/// 首个命中优先（不是最佳匹配）：并列时靠前登记的物品胜出
fn fuzzy_match<'a>(proposal: &str, inventory: &'a InventorySnapshot) -> Option<&'a str> {
    // 空串是任何字符串的子串，不能参与模糊匹配
    let needle = proposal.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    inventory.names().find(|name| {
        let candidate = name.to_lowercase();
        candidate.contains(&needle) || needle.contains(&candidate)
    })
}

/// 已落地物体的清单名，按首次出现顺序去重
pub fn grounded_names(matches: &[GroundedMatch]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in matches.iter().filter_map(|m| m.matched_object.as_ref()) {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grounding::inventory::tests::snapshot;

    fn proposals(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scenario_cup_and_coffee_machine() {
        let inv = snapshot(&["mug", "Coffee Machine"]);
        let matches = ground_objects(&proposals(&["cup", "coffee machine"]), &inv);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].proposal, "cup");
        assert_eq!(matches[0].kind, MatchKind::None);
        assert_eq!(matches[0].matched_object, None);
        assert_eq!(matches[1].kind, MatchKind::Fuzzy);
        assert_eq!(matches[1].matched_object.as_deref(), Some("Coffee Machine"));
    }

    #[test]
    fn test_exact_match_wins_over_earlier_fuzzy() {
        // "cup" 是 "cupboard" 的子串，但精确命中时不做模糊扫描
        let inv = snapshot(&["cupboard", "cup"]);
        let matches = ground_objects(&proposals(&["cup"]), &inv);
        assert_eq!(matches[0].kind, MatchKind::Exact);
        assert_eq!(matches[0].matched_object.as_deref(), Some("cup"));
    }

    #[test]
    fn test_fuzzy_first_match_in_snapshot_order() {
        let inv = snapshot(&["water bottle", "bottle opener", "bottle"]);
        let matches = ground_objects(&proposals(&["Bottle"]), &inv);
        assert_eq!(matches[0].kind, MatchKind::Fuzzy);
        assert_eq!(matches[0].matched_object.as_deref(), Some("water bottle"));
    }

    #[test]
    fn test_fuzzy_candidate_inside_proposal() {
        let inv = snapshot(&["table", "sink"]);
        let matches = ground_objects(&proposals(&["kitchen table"]), &inv);
        assert_eq!(matches[0].matched_object.as_deref(), Some("table"));
        assert_eq!(matches[0].kind, MatchKind::Fuzzy);
    }

    #[test]
    fn test_blank_proposal_never_matches() {
        let inv = snapshot(&["table"]);
        let matches = ground_objects(&proposals(&["", "  "]), &inv);
        assert!(matches.iter().all(|m| m.kind == MatchKind::None));
    }

    #[test]
    fn test_order_and_length_preserved_with_duplicates() {
        let inv = snapshot(&["sponge", "towel"]);
        let input = proposals(&["towel", "soap", "towel", "Sponge"]);
        let matches = ground_objects(&input, &inv);
        assert_eq!(matches.len(), input.len());
        let seen: Vec<&str> = matches.iter().map(|m| m.proposal.as_str()).collect();
        assert_eq!(seen, vec!["towel", "soap", "towel", "Sponge"]);
        assert_eq!(grounded_names(&matches), vec!["towel", "sponge"]);
    }

    #[test]
    fn test_empty_inputs() {
        let inv = snapshot(&["table"]);
        assert!(ground_objects(&[], &inv).is_empty());

        let empty = InventorySnapshot::new();
        let matches = ground_objects(&proposals(&["table"]), &empty);
        assert_eq!(matches[0].kind, MatchKind::None);
    }

    #[test]
    fn test_deterministic() {
        let inv = snapshot(&["mug", "cup holder", "plate"]);
        let input = proposals(&["cup", "plates", "fork"]);
        assert_eq!(ground_objects(&input, &inv), ground_objects(&input, &inv));
    }
}
