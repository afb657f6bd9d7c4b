use std::fs;
use std::path::{Path, PathBuf};

use terrain::{AssetError, AssetSource, HeightMap, MaterialLayers, SceneSettings};
use tracing::info;

use crate::error::FormatError;
use crate::images::{load_height_map, load_material};
use crate::manifest::{MANIFEST_VERSION, TerrainManifest};

pub const MANIFEST_FILE_NAME: &str = "terrain.manifest.json";

/// A terrain package directory: `terrain.manifest.json` plus the images it
/// names.
#[derive(Debug, Clone)]
pub struct TerrainPackage {
    root: PathBuf,
    manifest: TerrainManifest,
}

impl TerrainPackage {
    pub fn load(root: impl AsRef<Path>) -> Result<Self, FormatError> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE_NAME);
        let payload = fs::read_to_string(&manifest_path).map_err(|source| FormatError::Io {
            path: manifest_path.clone(),
            source,
        })?;
        let manifest: TerrainManifest =
            serde_json::from_str(&payload).map_err(|source| FormatError::Parse {
                path: manifest_path,
                source,
            })?;

        if manifest.version != MANIFEST_VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: manifest.version,
            });
        }

        info!(root = %root.display(), name = ?manifest.name, "terrain package loaded");
        Ok(Self { root, manifest })
    }

    pub fn manifest(&self) -> &TerrainManifest {
        &self.manifest
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn load_height_map(&self) -> Result<HeightMap, FormatError> {
        load_height_map(&self.resolve(&self.manifest.height_map))
    }

    pub fn load_layers(&self) -> Result<MaterialLayers, FormatError> {
        let layers = &self.manifest.layers;
        Ok(MaterialLayers {
            grass: load_material("grass", &self.resolve(&layers.grass))?,
            rock: load_material("rock", &self.resolve(&layers.rock))?,
            snow: load_material("snow", &self.resolve(&layers.snow))?,
        })
    }
}

impl AssetSource for TerrainPackage {
    fn height_map(&self) -> Result<HeightMap, AssetError> {
        self.load_height_map()
            .map_err(|e| e.into_asset_error(self.manifest.height_map.as_str()))
    }

    fn material_layers(&self) -> Result<MaterialLayers, AssetError> {
        self.load_layers()
            .map_err(|e| e.into_asset_error("material layers"))
    }

    fn settings(&self) -> SceneSettings {
        self.manifest.settings.clone()
    }
}
