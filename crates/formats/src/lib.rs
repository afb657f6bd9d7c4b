//! On-disk terrain packages: a JSON manifest naming a height map and three
//! material layer images.

pub mod error;
pub mod images;
pub mod manifest;
pub mod package;

pub use error::FormatError;
pub use images::{height_map_from_image, load_height_map, load_material, material_from_image};
pub use manifest::*;
pub use package::*;
