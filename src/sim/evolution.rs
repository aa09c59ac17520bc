//! Evolution paths and stage selection

use serde::{Deserialize, Serialize};

use super::attribute::AttributeKind;
use super::events::StageInfo;

/// A leveled variant of the player cube
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionStage {
    pub name: String,
    pub required_level: u32,
    pub stat_multiplier: f32,
}

impl EvolutionStage {
    pub fn new(name: &str, required_level: u32, stat_multiplier: f32) -> Self {
        Self {
            name: name.to_string(),
            required_level,
            stat_multiplier,
        }
    }
}

/// Ordered stages available to one attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionPath {
    pub name: String,
    pub attribute: AttributeKind,
    pub stages: Vec<EvolutionStage>,
}

impl EvolutionPath {
    /// The stock path table: one path per attribute
    pub fn defaults() -> Vec<EvolutionPath> {
        let path = |name: &str, attribute, stages: [(&str, u32, f32); 3]| EvolutionPath {
            name: name.to_string(),
            attribute,
            stages: stages
                .iter()
                .map(|(n, lvl, mult)| EvolutionStage::new(n, *lvl, *mult))
                .collect(),
        };
        vec![
            path(
                "Basic",
                AttributeKind::None,
                [("Cube", 1, 1.0), ("Hardened Cube", 5, 1.1), ("Hypercube", 15, 1.3)],
            ),
            path(
                "Inferno",
                AttributeKind::Fire,
                [("Ember Cube", 1, 1.0), ("Blaze Cube", 5, 1.2), ("Inferno Cube", 10, 1.5)],
            ),
            path(
                "Glacier",
                AttributeKind::Ice,
                [("Frost Cube", 1, 1.0), ("Glacier Cube", 5, 1.2), ("Permafrost Cube", 10, 1.5)],
            ),
            path(
                "Storm",
                AttributeKind::Lightning,
                [("Spark Cube", 1, 1.0), ("Volt Cube", 5, 1.2), ("Storm Cube", 10, 1.5)],
            ),
            path(
                "Mountain",
                AttributeKind::Earth,
                [("Pebble Cube", 1, 1.0), ("Boulder Cube", 5, 1.2), ("Mountain Cube", 10, 1.5)],
            ),
        ]
    }

    /// Index of the stage active at `level`: the highest `required_level <= level`.
    ///
    /// Ties keep the earliest stage; `None` when nothing qualifies.
    pub fn active_stage(&self, level: u32) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, stage) in self.stages.iter().enumerate() {
            if stage.required_level > level {
                continue;
            }
            match best {
                Some(b) if self.stages[b].required_level >= stage.required_level => {}
                _ => best = Some(i),
            }
        }
        best
    }

    pub fn stage_info(&self, index: usize) -> Option<StageInfo> {
        self.stages.get(index).map(|stage| StageInfo {
            attribute: self.attribute,
            index,
            name: stage.name.clone(),
            stat_multiplier: stage.stat_multiplier,
        })
    }
}

/// Index of the path for `attribute`
pub fn find_path(paths: &[EvolutionPath], attribute: AttributeKind) -> Option<usize> {
    paths.iter().position(|p| p.attribute == attribute)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> EvolutionPath {
        EvolutionPath {
            name: "test".into(),
            attribute: AttributeKind::Fire,
            // deliberately unsorted
            stages: vec![
                EvolutionStage::new("c", 10, 1.5),
                EvolutionStage::new("a", 1, 1.0),
                EvolutionStage::new("b", 5, 1.2),
            ],
        }
    }

    #[test]
    fn test_active_stage_picks_highest_qualifying() {
        let p = path();
        assert_eq!(p.active_stage(1), Some(1));
        assert_eq!(p.active_stage(7), Some(2));
        assert_eq!(p.active_stage(10), Some(0));
        assert_eq!(p.active_stage(99), Some(0));
    }

    #[test]
    fn test_no_stage_below_first_requirement() {
        let mut p = path();
        p.stages.retain(|s| s.required_level >= 5);
        assert_eq!(p.active_stage(4), None);
    }

    #[test]
    fn test_default_paths_cover_every_attribute() {
        let paths = EvolutionPath::defaults();
        for kind in AttributeKind::ALL {
            assert!(find_path(&paths, kind).is_some(), "missing path for {kind}");
        }
    }
}
