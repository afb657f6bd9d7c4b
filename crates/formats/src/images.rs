//! Decoding of height maps and material layers from any format the `image`
//! crate reads.

use std::path::Path;

use image::DynamicImage;
use terrain::{HeightMap, MaterialImage, TerrainError};
use tracing::debug;

use crate::error::FormatError;

fn open(path: &Path) -> Result<DynamicImage, FormatError> {
    image::open(path).map_err(|source| FormatError::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Heights normalized to `[0, 1]`. Decoding goes through 16-bit luma so
/// 16-bit sources keep their precision; 8-bit sources are widened exactly.
pub fn height_map_from_image(image: &DynamicImage) -> Result<HeightMap, TerrainError> {
    let luma = image.to_luma16();
    let (width, height) = luma.dimensions();
    let samples = luma
        .into_raw()
        .into_iter()
        .map(|v| v as f32 / u16::MAX as f32)
        .collect();
    HeightMap::new(width, height, samples)
}

pub fn material_from_image(
    layer: &'static str,
    image: &DynamicImage,
) -> Result<MaterialImage, TerrainError> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    MaterialImage::from_srgba8(layer, width, height, rgba.as_raw())
}

pub fn load_height_map(path: &Path) -> Result<HeightMap, FormatError> {
    let map = height_map_from_image(&open(path)?).map_err(|source| FormatError::Terrain {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), width = map.width(), height = map.height(), "height map decoded");
    Ok(map)
}

pub fn load_material(layer: &'static str, path: &Path) -> Result<MaterialImage, FormatError> {
    let image = material_from_image(layer, &open(path)?).map_err(|source| FormatError::Terrain {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(layer, path = %path.display(), width = image.width(), height = image.height(), "material layer decoded");
    Ok(image)
}
