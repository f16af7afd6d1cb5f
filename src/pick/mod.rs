pub mod plot;

pub use plot::{Masterplan, PlotIndex, PlotInfo};

use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::layer::LayerKind;
use crate::math::{Ray, TOLERANCE};
use crate::scene::{Color, SceneState, VolumeId};

/// Emissive glow applied to every member of a selected plot.
const GROUP_GLOW: u32 = 0x00AA_FF;
/// Highlight for a selected water body.
const WATER_GLOW: u32 = 0x00FF_FF;
/// Highlight for a selected open-space parcel.
const OPEN_SPACE_GLOW: u32 = 0x4CAF_50;

/// Result of resolving a pick ray against the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The hit volume's id belongs to a masterplan plot; the whole plot is
    /// selected.
    Group {
        plot_key: String,
        members: Vec<VolumeId>,
    },
    /// A lone clickable volume with no plot membership.
    Single(VolumeId),
    /// The ray hit nothing clickable.
    None,
}

/// Resolves a pick ray to a selection.
///
/// Tests every clickable volume: a cheap world-AABB rejection first, then
/// exact triangle intersection under the volume's pose. The nearest hit
/// wins; at equal distance the lower metadata id wins so repeated picks on
/// coincident surfaces are stable.
pub struct Pick {
    ray: Ray,
}

impl Pick {
    /// Creates a pick for the given scene-space ray.
    #[must_use]
    pub fn new(ray: Ray) -> Self {
        Self { ray }
    }

    /// Executes the pick.
    #[must_use]
    pub fn execute(&self, scene: &SceneState) -> Selection {
        let Some(hit) = self.nearest_hit(scene, scene.clickable()) else {
            return Selection::None;
        };

        let Ok(volume) = scene.volume(hit) else {
            return Selection::None;
        };
        if let Some(plot_key) = scene.plot_index().plot_key(&volume.meta.id) {
            let members = plot_members(scene, plot_key);
            debug!(plot_key, members = members.len(), "plot pick");
            return Selection::Group {
                plot_key: plot_key.to_owned(),
                members,
            };
        }
        Selection::Single(hit)
    }

    /// The nearest hit building, for the hover state. Flat clickables never
    /// hover.
    #[must_use]
    pub fn execute_hover(&self, scene: &SceneState) -> Option<VolumeId> {
        self.nearest_hit(scene, scene.buildings())
    }

    fn nearest_hit(&self, scene: &SceneState, candidates: &[VolumeId]) -> Option<VolumeId> {
        let mut best: Option<(f64, VolumeId)> = None;
        for &id in candidates {
            let Ok(volume) = scene.volume(id) else {
                continue;
            };
            if self.ray.hit_aabb(&volume.world_aabb()).is_none() {
                continue;
            }
            let matrix = volume.pose.matrix();
            let mesh = &volume.mesh;
            for [a, b, c] in &mesh.indices {
                let a = matrix.transform_point(&mesh.vertices[*a as usize]);
                let b = matrix.transform_point(&mesh.vertices[*b as usize]);
                let c = matrix.transform_point(&mesh.vertices[*c as usize]);
                let Some(t) = self.ray.hit_triangle(&a, &b, &c) else {
                    continue;
                };
                best = match best {
                    None => Some((t, id)),
                    Some((bt, bid)) => {
                        if t < bt - TOLERANCE {
                            Some((t, id))
                        } else if (t - bt).abs() <= TOLERANCE && tie_breaks(scene, id, bid) {
                            Some((t, id))
                        } else {
                            Some((bt, bid))
                        }
                    }
                };
            }
        }
        best.map(|(_, id)| id)
    }
}

/// `true` when `challenger` beats the incumbent at equal ray distance.
fn tie_breaks(scene: &SceneState, challenger: VolumeId, incumbent: VolumeId) -> bool {
    match (scene.volume(challenger), scene.volume(incumbent)) {
        (Ok(a), Ok(b)) => a.meta.id < b.meta.id,
        _ => false,
    }
}

/// Clickable volumes belonging to a plot, in the plot's id order.
fn plot_members(scene: &SceneState, plot_key: &str) -> Vec<VolumeId> {
    let Some(plot) = scene.masterplan().plot(plot_key) else {
        return Vec::new();
    };
    let mut by_id: HashMap<&str, VolumeId> = HashMap::with_capacity(scene.clickable().len());
    for &id in scene.clickable() {
        if let Ok(volume) = scene.volume(id) {
            by_id.entry(volume.meta.id.as_str()).or_insert(id);
        }
    }
    plot.ids
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).copied())
        .collect()
}

/// Applies a selection's visual state to the scene.
///
/// The previous selection is cleared first, so applying is idempotent and
/// never leaks derived materials. Plot groups glow as a whole; single
/// volumes take a per-kind treatment.
///
/// # Errors
///
/// Returns an error for stale volume ids inside the selection.
pub fn apply_selection(scene: &mut SceneState, selection: &Selection) -> Result<()> {
    scene.clear_selection();
    match selection {
        Selection::Group { plot_key, members } => {
            for &id in members {
                scene.highlight(id, Color::from_hex(GROUP_GLOW), 1.0)?;
            }
            scene.set_selection(Some(plot_key.clone()), None);
        }
        Selection::Single(id) => {
            let kind = scene.volume(*id)?.kind;
            match kind {
                LayerKind::Building => {
                    let selected = scene.palette.selected;
                    scene.apply_shared_material(*id, selected)?;
                    scene.set_selection(None, Some(*id));
                }
                LayerKind::Water => {
                    scene.highlight(*id, Color::from_hex(WATER_GLOW), 0.5)?;
                    scene.set_selection(None, None);
                }
                _ => {
                    scene.highlight(*id, Color::from_hex(OPEN_SPACE_GLOW), 0.3)?;
                    scene.set_selection(None, None);
                }
            }
        }
        Selection::None => {}
    }
    Ok(())
}

/// Distinguishes a click from a camera drag by screen-space displacement
/// between press and release.
#[derive(Debug, Default)]
pub struct ClickGuard {
    pressed_at: Option<(f64, f64)>,
    slop_px: f64,
}

impl ClickGuard {
    /// Creates a guard with the given slop radius in pixels.
    #[must_use]
    pub fn new(slop_px: f64) -> Self {
        Self {
            pressed_at: None,
            slop_px,
        }
    }

    /// Records a pointer press.
    pub fn press(&mut self, x: f64, y: f64) {
        self.pressed_at = Some((x, y));
    }

    /// Consumes the press. Returns `true` when the release lands within the
    /// slop radius, i.e. the gesture was a click rather than a drag.
    pub fn release(&mut self, x: f64, y: f64) -> bool {
        let Some((px, py)) = self.pressed_at.take() else {
            return false;
        };
        (x - px).hypot(y - py) <= self.slop_px
    }
}
