use slotmap::{new_key_type, SlotMap};

use crate::error::SceneError;

new_key_type! {
    /// Generational id of a material in the registry.
    pub struct MaterialId;
}

/// A linear RGB color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    /// Creates a color from a packed `0xRRGGBB` value.
    #[must_use]
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: f64::from((hex >> 16) & 0xff) / 255.0,
            g: f64::from((hex >> 8) & 0xff) / 255.0,
            b: f64::from(hex & 0xff) / 255.0,
        }
    }
}

/// Renderer-facing material parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub base_color: Color,
    pub emissive: Option<Color>,
    pub emissive_intensity: f64,
    pub opacity: f64,
    /// Whether the scene clipping frustum applies to this material.
    pub clipped: bool,
}

impl Material {
    /// An opaque, non-emissive material.
    #[must_use]
    pub fn opaque(base_color: Color) -> Self {
        Self {
            base_color,
            emissive: None,
            emissive_intensity: 0.0,
            opacity: 1.0,
            clipped: true,
        }
    }

    /// Same material at the given opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

/// The shared site palette, registered once at scene creation.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub building: MaterialId,
    pub selected: MaterialId,
    pub hovered: MaterialId,
    pub water: MaterialId,
    pub green: MaterialId,
    pub road: MaterialId,
    pub path: MaterialId,
    pub open_space: MaterialId,
    pub plate: MaterialId,
}

/// Owns every material. Volumes refer to materials by id only, so restoring
/// an original appearance is a key swap, never a mutation of shared state.
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    materials: SlotMap<MaterialId, Material>,
}

impl MaterialRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the fixed site palette.
    pub fn register_palette(&mut self) -> Palette {
        let mut plate = Material::opaque(Color::from_hex(0xD2B4_8C));
        plate.clipped = false;

        Palette {
            building: self.add(Material::opaque(Color::from_hex(0xffff_ff))),
            selected: self.add(Material::opaque(Color::from_hex(0xff55_00)).with_opacity(0.9)),
            hovered: self.add(Material::opaque(Color::from_hex(0xffd7_00)).with_opacity(0.8)),
            water: self.add(Material::opaque(Color::from_hex(0x44B0_C7)).with_opacity(0.9)),
            green: self.add(Material::opaque(Color::from_hex(0x4caf_50))),
            road: self.add(Material::opaque(Color::from_hex(0xCCCC_CC))),
            path: self.add(Material::opaque(Color::from_hex(0xDDDD_DD))),
            open_space: self.add(Material::opaque(Color::from_hex(0xffff_ff)).with_opacity(0.0)),
            plate: self.add(plate),
        }
    }

    /// Inserts a material and returns its id.
    pub fn add(&mut self, material: Material) -> MaterialId {
        self.materials.insert(material)
    }

    /// Looks up a material.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MaterialNotFound`] for a stale id.
    pub fn get(&self, id: MaterialId) -> Result<&Material, SceneError> {
        self.materials.get(id).ok_or(SceneError::MaterialNotFound)
    }

    /// Mutable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MaterialNotFound`] for a stale id.
    pub fn get_mut(&mut self, id: MaterialId) -> Result<&mut Material, SceneError> {
        self.materials
            .get_mut(id)
            .ok_or(SceneError::MaterialNotFound)
    }

    /// Derives a glow material from an original: same base color, emissive
    /// highlight on top. The original is left untouched, so clearing a
    /// highlight is lossless.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MaterialNotFound`] for a stale original id.
    pub fn derive_highlight(
        &mut self,
        original: MaterialId,
        glow: Color,
        opacity: f64,
    ) -> Result<MaterialId, SceneError> {
        let base = *self.get(original)?;
        Ok(self.add(Material {
            base_color: base.base_color,
            emissive: Some(glow),
            emissive_intensity: 0.5,
            opacity,
            clipped: base.clipped,
        }))
    }

    /// Removes a derived material once its highlight is cleared.
    pub fn remove(&mut self, id: MaterialId) {
        self.materials.remove(id);
    }

    /// Iterates over all materials mutably (clip-set fan-out).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (MaterialId, &mut Material)> {
        self.materials.iter_mut()
    }

    /// Number of registered materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn hex_unpacks_channels() {
        let c = Color::from_hex(0xff8000);
        assert_relative_eq!(c.r, 1.0);
        assert_relative_eq!(c.g, 128.0 / 255.0);
        assert_relative_eq!(c.b, 0.0);
    }

    #[test]
    fn derived_highlight_keeps_original_untouched() {
        let mut registry = MaterialRegistry::new();
        let original = registry.add(Material::opaque(Color::from_hex(0xffffff)));
        let glow = registry
            .derive_highlight(original, Color::from_hex(0x00AAFF), 1.0)
            .unwrap();

        assert_ne!(original, glow);
        assert!(registry.get(original).unwrap().emissive.is_none());
        assert!(registry.get(glow).unwrap().emissive.is_some());

        registry.remove(glow);
        assert!(registry.get(glow).is_err());
        assert!(registry.get(original).is_ok());
    }

    #[test]
    fn palette_plate_is_unclipped() {
        let mut registry = MaterialRegistry::new();
        let palette = registry.register_palette();
        assert!(!registry.get(palette.plate).unwrap().clipped);
        assert!(registry.get(palette.building).unwrap().clipped);
    }
}
