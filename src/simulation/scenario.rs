//! Battle setup descriptions
//!
//! A scenario lists the formations that start a battle. Scenarios are plain
//! data and load from TOML:
//!
//! ```toml
//! [[formations]]
//! name = "Vanguard"
//! side = 0
//! position = 2
//! skill = 4
//!
//! [[formations.units]]
//! elements = [{ armor = 12, structure = 4, short = 5, medium = 3, long = 2 }]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::battle::hex::HexCoord;
use crate::battle::units::{DamageProfile, Element, Formation, RangeDamage, Unit};
use crate::core::error::{Result, SimulationError};
use crate::core::types::{ElementId, EntityId, FormationId, SideId, UnitId};
use crate::core::SimulationConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub armor: u32,
    pub structure: u32,
    #[serde(default)]
    pub short: Option<u32>,
    #[serde(default)]
    pub medium: Option<u32>,
    #[serde(default)]
    pub long: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    #[serde(default)]
    pub name: String,
    pub elements: Vec<ElementSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationSpec {
    pub name: String,
    pub side: u32,
    /// Column on the board's first row
    pub position: i32,
    #[serde(default = "default_skill")]
    pub skill: i32,
    pub units: Vec<UnitSpec>,
}

fn default_skill() -> i32 {
    Formation::DEFAULT_SKILL
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub formations: Vec<FormationSpec>,
}

impl Scenario {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        for formation in &self.formations {
            if formation.units.iter().all(|u| u.elements.is_empty()) {
                return Err(SimulationError::InvalidConfig(format!(
                    "formation '{}' has no elements",
                    formation.name
                )));
            }
        }
        Ok(())
    }

    /// Two equal sides facing each other from opposite ends of the board
    pub fn skirmish(config: &SimulationConfig) -> Self {
        let far = config.board_width.saturating_sub(3) as i32;
        let line = |name: &str, side: u32, position: i32| FormationSpec {
            name: name.to_string(),
            side,
            position,
            skill: Formation::DEFAULT_SKILL,
            units: (0..3)
                .map(|i| UnitSpec {
                    name: format!("{} {}", name, i + 1),
                    elements: vec![
                        ElementSpec {
                            armor: 8,
                            structure: 3,
                            short: Some(3),
                            medium: Some(2),
                            long: Some(1),
                        };
                        2
                    ],
                })
                .collect(),
        };

        Self {
            formations: vec![line("Blue", 0, 2), line("Red", 1, far)],
        }
    }

    /// Build the formations. Entity ids are numbered in scenario order, so
    /// the same scenario always yields the same ids.
    pub fn build(&self) -> Vec<Formation> {
        let mut next_entity = 1u64;
        self.formations
            .iter()
            .map(|spec| {
                let mut formation = Formation::new(FormationId(0), SideId(spec.side));
                formation.name = spec.name.clone();
                formation.skill = spec.skill;
                formation.position = HexCoord::new(spec.position, 0);

                for (unit_index, unit_spec) in spec.units.iter().enumerate() {
                    let elements = unit_spec
                        .elements
                        .iter()
                        .enumerate()
                        .map(|(index, e)| {
                            let entity = EntityId::from_index(next_entity);
                            next_entity += 1;
                            Element::new(ElementId(index as u32), entity, e.armor, e.structure)
                                .with_damage(DamageProfile {
                                    flat: RangeDamage {
                                        short: e.short,
                                        medium: e.medium,
                                        long: e.long,
                                        extreme: None,
                                    },
                                    ..DamageProfile::default()
                                })
                        })
                        .collect();
                    let mut unit = Unit::from_elements(UnitId(unit_index as u32), elements);
                    unit.name = unit_spec.name.clone();
                    formation.units.push(unit);
                }
                formation
            })
            .collect()
    }
}
