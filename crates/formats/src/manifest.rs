use serde::{Deserialize, Serialize};
use terrain::SceneSettings;

pub const MANIFEST_VERSION: &str = "1.0";

/// Describes a terrain package: one height map, three material layers and
/// optional scene settings. Paths are relative to the package directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerrainManifest {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub height_map: String,
    pub layers: LayerPaths,
    #[serde(default)]
    pub settings: SceneSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerPaths {
    pub grass: String,
    pub rock: String,
    pub snow: String,
}

impl TerrainManifest {
    pub fn new(height_map: impl Into<String>, layers: LayerPaths) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            name: None,
            height_map: height_map.into(),
            layers,
            settings: SceneSettings::default(),
        }
    }
}
