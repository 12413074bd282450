//! Unit and model templates plus the battlefield roles they are filed under.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::{Armoury, CatalogError};

/// Force-organisation slot a unit is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BattlefieldRole {
    #[serde(rename = "HQ")]
    Hq,
    Troops,
    Elites,
    #[serde(rename = "Fast Attack")]
    FastAttack,
    #[serde(rename = "Heavy Support")]
    HeavySupport,
    #[serde(rename = "Dedicated Transport")]
    DedicatedTransport,
    Fortification,
    #[serde(rename = "Lord of War")]
    LordOfWar,
    #[serde(rename = "Named Characters")]
    NamedCharacters,
}

impl BattlefieldRole {
    pub const ALL: [BattlefieldRole; 9] = [
        Self::Hq,
        Self::Troops,
        Self::Elites,
        Self::FastAttack,
        Self::HeavySupport,
        Self::DedicatedTransport,
        Self::Fortification,
        Self::LordOfWar,
        Self::NamedCharacters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hq => "HQ",
            Self::Troops => "Troops",
            Self::Elites => "Elites",
            Self::FastAttack => "Fast Attack",
            Self::HeavySupport => "Heavy Support",
            Self::DedicatedTransport => "Dedicated Transport",
            Self::Fortification => "Fortification",
            Self::LordOfWar => "Lord of War",
            Self::NamedCharacters => "Named Characters",
        }
    }
}

impl fmt::Display for BattlefieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BattlefieldRole {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "hq" => Ok(Self::Hq),
            "troops" | "tr" => Ok(Self::Troops),
            "elites" | "el" => Ok(Self::Elites),
            "fastattack" | "fa" => Ok(Self::FastAttack),
            "heavysupport" | "hs" => Ok(Self::HeavySupport),
            "dedicatedtransport" | "dt" => Ok(Self::DedicatedTransport),
            "fortification" | "fort" => Ok(Self::Fortification),
            "lordofwar" | "low" => Ok(Self::LordOfWar),
            "namedcharacters" | "named" => Ok(Self::NamedCharacters),
            _ => Err(format!("unknown battlefield role '{}'", raw.trim())),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn default_size() -> [u32; 2] {
    [1, 1]
}

/// Catalog entry for a unit: cost per model, size range and the raw strings its
/// loadout and options are parsed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTemplate {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "base_pts")]
    pub base_points: u32,
    #[serde(default = "default_size")]
    pub size: [u32; 2],
    #[serde(default, deserialize_with = "null_as_empty")]
    pub wargear: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub models: Vec<String>,
}

impl UnitTemplate {
    pub fn new(name: impl Into<String>, base_points: u32, size: [u32; 2]) -> Self {
        Self {
            name: name.into(),
            base_points,
            size,
            wargear: Vec::new(),
            options: Vec::new(),
            models: Vec::new(),
        }
    }

    pub fn with_wargear(mut self, wargear: &[&str]) -> Self {
        self.wargear = wargear.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn min_size(&self) -> u32 {
        self.size[0]
    }

    pub fn max_size(&self) -> u32 {
        self.size[1]
    }
}

/// Extra model type a unit may field alongside its default models
/// (e.g. a Heavy Destroyer in a Destroyer unit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTemplate {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "pts")]
    pub points: u32,
    /// Maximum number of this model per unit, if capped.
    #[serde(default, alias = "no_per_unit")]
    pub limit: Option<u32>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub wargear: Vec<String>,
    #[serde(default, alias = "indep")]
    pub independent: bool,
}

impl ModelTemplate {
    pub fn new(name: impl Into<String>, points: u32) -> Self {
        Self {
            name: name.into(),
            points,
            limit: None,
            wargear: Vec::new(),
            independent: false,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_wargear(mut self, wargear: &[&str]) -> Self {
        self.wargear = wargear.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// A loaded faction: armoury plus unit and model templates.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub faction: String,
    armoury: Armoury,
    units: BTreeMap<BattlefieldRole, BTreeMap<String, Arc<UnitTemplate>>>,
    models: BTreeMap<String, Arc<ModelTemplate>>,
}

impl Catalog {
    pub fn new(faction: impl Into<String>, armoury: Armoury) -> Self {
        Self {
            faction: faction.into(),
            armoury,
            units: BTreeMap::new(),
            models: BTreeMap::new(),
        }
    }

    pub fn add_unit(&mut self, role: BattlefieldRole, template: UnitTemplate) {
        self.units
            .entry(role)
            .or_default()
            .insert(template.name.clone(), Arc::new(template));
    }

    pub fn add_model(&mut self, template: ModelTemplate) {
        self.models.insert(template.name.clone(), Arc::new(template));
    }

    pub fn with_unit(mut self, role: BattlefieldRole, template: UnitTemplate) -> Self {
        self.add_unit(role, template);
        self
    }

    pub fn with_model(mut self, template: ModelTemplate) -> Self {
        self.add_model(template);
        self
    }

    pub fn armoury(&self) -> &Armoury {
        &self.armoury
    }

    /// Unit template by role and name. Named characters are also reachable through the
    /// role they are fielded in.
    pub fn unit(&self, role: BattlefieldRole, name: &str) -> Result<Arc<UnitTemplate>, CatalogError> {
        let found = self
            .units
            .get(&role)
            .and_then(|units| units.get(name))
            .or_else(|| {
                self.units
                    .get(&BattlefieldRole::NamedCharacters)
                    .and_then(|units| units.get(name))
            });
        found.cloned().ok_or_else(|| CatalogError::MissingCatalogEntry {
            kind: "unit",
            name: format!("{role}/{name}"),
        })
    }

    pub fn model(&self, name: &str) -> Result<Arc<ModelTemplate>, CatalogError> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::MissingCatalogEntry {
                kind: "model",
                name: name.to_string(),
            })
    }

    /// All unit templates in role order, then by name.
    pub fn units(&self) -> impl Iterator<Item = (BattlefieldRole, &Arc<UnitTemplate>)> + '_ {
        self.units
            .iter()
            .flat_map(|(role, units)| units.values().map(move |unit| (*role, unit)))
    }

    pub fn models(&self) -> impl Iterator<Item = &Arc<ModelTemplate>> + '_ {
        self.models.values()
    }

    pub fn unit_count(&self) -> usize {
        self.units.values().map(BTreeMap::len).sum()
    }
}
