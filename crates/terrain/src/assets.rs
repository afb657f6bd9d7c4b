use crate::error::AssetError;
use crate::heightmap::HeightMap;
use crate::settings::SceneSettings;
use crate::shading::MaterialLayers;

/// Supplies the resources a terrain scene is built from.
///
/// Every failure names the offending resource so initialisation can report it.
pub trait AssetSource {
    fn height_map(&self) -> Result<HeightMap, AssetError>;

    fn material_layers(&self) -> Result<MaterialLayers, AssetError>;

    fn settings(&self) -> SceneSettings {
        SceneSettings::default()
    }
}

/// Assets already decoded in memory; used by tests and procedural scenes.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryAssets {
    pub height_map: HeightMap,
    pub layers: MaterialLayers,
    pub settings: SceneSettings,
}

impl InMemoryAssets {
    pub fn new(height_map: HeightMap, layers: MaterialLayers) -> Self {
        Self {
            height_map,
            layers,
            settings: SceneSettings::default(),
        }
    }
}

impl AssetSource for InMemoryAssets {
    fn height_map(&self) -> Result<HeightMap, AssetError> {
        Ok(self.height_map.clone())
    }

    fn material_layers(&self) -> Result<MaterialLayers, AssetError> {
        Ok(self.layers.clone())
    }

    fn settings(&self) -> SceneSettings {
        self.settings.clone()
    }
}
