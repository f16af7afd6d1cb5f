pub mod material;
pub mod volume;

pub use material::{Color, Material, MaterialId, MaterialRegistry, Palette};
pub use volume::{Meta, Pose, Volume, VolumeId};

use slotmap::SlotMap;
use tracing::debug;

use crate::bounds::plate::BasePlate;
use crate::bounds::SceneBounds;
use crate::error::SceneError;
use crate::lamps::Lamp;
use crate::pick::plot::{Masterplan, PlotIndex};

/// Proof that a layer load began against the current scene generation.
///
/// Layer loads are asynchronous and unordered; a response that arrives after
/// a scene rebuild must not write into the new graph. Integration entry
/// points take the ticket issued when the load started and reject it if the
/// generation has moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerTicket(u64);

/// Volumes currently highlighted, with the derived material to drop when
/// the highlight clears.
#[derive(Debug, Default)]
struct SelectionState {
    plot_key: Option<String>,
    single: Option<VolumeId>,
    highlighted: Vec<(VolumeId, MaterialId)>,
}

/// Single owner of all mutable scene state.
///
/// Every mutation funnels through methods here; collaborators hold typed
/// ids, never references into the arena.
#[derive(Debug)]
pub struct SceneState {
    volumes: SlotMap<VolumeId, Volume>,
    buildings: Vec<VolumeId>,
    clickable: Vec<VolumeId>,
    lamps: Vec<Lamp>,
    pub materials: MaterialRegistry,
    pub palette: Palette,
    base_plate: Option<BasePlate>,
    bounds: Option<SceneBounds>,
    masterplan: Masterplan,
    plot_index: PlotIndex,
    selection: SelectionState,
    hovered: Option<VolumeId>,
    generation: u64,
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneState {
    /// Creates an empty scene with the site palette registered.
    #[must_use]
    pub fn new() -> Self {
        let mut materials = MaterialRegistry::new();
        let palette = materials.register_palette();
        Self {
            volumes: SlotMap::with_key(),
            buildings: Vec::new(),
            clickable: Vec::new(),
            lamps: Vec::new(),
            materials,
            palette,
            base_plate: None,
            bounds: None,
            masterplan: Masterplan::default(),
            plot_index: PlotIndex::default(),
            selection: SelectionState::default(),
            hovered: None,
            generation: 0,
        }
    }

    // --- Generation guard ---

    /// Ticket for loads starting against the current generation.
    #[must_use]
    pub fn ticket(&self) -> LayerTicket {
        LayerTicket(self.generation)
    }

    /// Discards all volumes, lamps and derived state and bumps the
    /// generation so in-flight layer loads become stale.
    pub fn begin_rebuild(&mut self) -> LayerTicket {
        self.clear_selection();
        self.clear_hover();
        self.volumes.clear();
        self.buildings.clear();
        self.clickable.clear();
        self.lamps.clear();
        self.base_plate = None;
        self.bounds = None;
        self.generation += 1;
        debug!(generation = self.generation, "scene rebuild started");
        LayerTicket(self.generation)
    }

    /// Checks a layer ticket against the current generation.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleLayer`] when the scene was rebuilt after
    /// the ticket was issued.
    pub fn ensure_fresh(&self, ticket: LayerTicket) -> Result<(), SceneError> {
        if ticket.0 == self.generation {
            Ok(())
        } else {
            Err(SceneError::StaleLayer {
                current: self.generation,
                ticket: ticket.0,
            })
        }
    }

    // --- Volume arena ---

    /// Inserts a volume, indexing it as building/clickable per its kind.
    pub fn insert_volume(&mut self, volume: Volume) -> VolumeId {
        let is_building = volume.kind == crate::layer::LayerKind::Building;
        let clickable = volume.clickable;
        let id = self.volumes.insert(volume);
        if is_building {
            self.buildings.push(id);
        }
        if clickable {
            self.clickable.push(id);
        }
        id
    }

    /// Returns a volume, or an error for a stale id.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::VolumeNotFound`] if the id is not in the arena.
    pub fn volume(&self, id: VolumeId) -> Result<&Volume, SceneError> {
        self.volumes
            .get(id)
            .ok_or_else(|| SceneError::VolumeNotFound(format!("{id:?}")))
    }

    /// Mutable volume lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::VolumeNotFound`] if the id is not in the arena.
    pub fn volume_mut(&mut self, id: VolumeId) -> Result<&mut Volume, SceneError> {
        self.volumes
            .get_mut(id)
            .ok_or_else(|| SceneError::VolumeNotFound(format!("{id:?}")))
    }

    /// Building volume ids, in insertion order.
    #[must_use]
    pub fn buildings(&self) -> &[VolumeId] {
        &self.buildings
    }

    /// Clickable volume ids, in insertion order.
    #[must_use]
    pub fn clickable(&self) -> &[VolumeId] {
        &self.clickable
    }

    /// All volumes.
    pub fn iter_volumes(&self) -> impl Iterator<Item = (VolumeId, &Volume)> {
        self.volumes.iter()
    }

    /// All volumes, mutably.
    pub fn iter_volumes_mut(&mut self) -> impl Iterator<Item = (VolumeId, &mut Volume)> {
        self.volumes.iter_mut()
    }

    /// Finds a volume by its metadata id.
    #[must_use]
    pub fn find_by_meta_id(&self, meta_id: &str) -> Option<VolumeId> {
        self.volumes
            .iter()
            .find(|(_, v)| v.meta.id == meta_id)
            .map(|(id, _)| id)
    }

    // --- Lamps ---

    /// Appends street lamps.
    pub fn add_lamps(&mut self, lamps: impl IntoIterator<Item = Lamp>) {
        self.lamps.extend(lamps);
    }

    /// The lamp list.
    #[must_use]
    pub fn lamps(&self) -> &[Lamp] {
        &self.lamps
    }

    /// The lamp list, mutably (solar regime updates).
    pub fn lamps_mut(&mut self) -> &mut [Lamp] {
        &mut self.lamps
    }

    // --- Semantic map ---

    /// Installs the masterplan and rebuilds the id→plot reverse index.
    pub fn set_masterplan(&mut self, masterplan: Masterplan) {
        self.plot_index = PlotIndex::build(&masterplan);
        self.masterplan = masterplan;
    }

    /// The masterplan semantic map.
    #[must_use]
    pub fn masterplan(&self) -> &Masterplan {
        &self.masterplan
    }

    /// The id→plot reverse index.
    #[must_use]
    pub fn plot_index(&self) -> &PlotIndex {
        &self.plot_index
    }

    // --- Bounds & base plate ---

    /// Installs freshly derived bounds.
    pub fn set_bounds(&mut self, bounds: SceneBounds) {
        self.bounds = Some(bounds);
    }

    /// Current derived bounds, if any building has been built.
    #[must_use]
    pub fn bounds(&self) -> Option<&SceneBounds> {
        self.bounds.as_ref()
    }

    /// Replaces the base plate, returning the one removed.
    pub fn replace_base_plate(&mut self, plate: BasePlate) -> Option<BasePlate> {
        self.base_plate.replace(plate)
    }

    /// The current base plate.
    #[must_use]
    pub fn base_plate(&self) -> Option<&BasePlate> {
        self.base_plate.as_ref()
    }

    // --- Selection & hover ---

    /// Applies a derived-glow highlight to a volume.
    ///
    /// # Errors
    ///
    /// Returns an error for stale volume or material ids.
    pub fn highlight(
        &mut self,
        id: VolumeId,
        glow: Color,
        opacity: f64,
    ) -> Result<(), SceneError> {
        let original = self.volume(id)?.original_material;
        let derived = self.materials.derive_highlight(original, glow, opacity)?;
        self.volume_mut(id)?.material = derived;
        self.selection.highlighted.push((id, derived));
        Ok(())
    }

    /// Swaps a volume onto a shared (non-derived) material, tracked so the
    /// original is restored on clear. Used for the building select state.
    ///
    /// # Errors
    ///
    /// Returns an error for a stale volume id.
    pub fn apply_shared_material(
        &mut self,
        id: VolumeId,
        material: MaterialId,
    ) -> Result<(), SceneError> {
        self.volume_mut(id)?.material = material;
        Ok(())
    }

    /// Records the current selection result.
    pub fn set_selection(&mut self, plot_key: Option<String>, single: Option<VolumeId>) {
        self.selection.plot_key = plot_key;
        self.selection.single = single;
    }

    /// The selected plot key, for the tooltip collaborator.
    #[must_use]
    pub fn selected_plot_key(&self) -> Option<&str> {
        self.selection.plot_key.as_deref()
    }

    /// The single selected volume, when the last pick fell back.
    #[must_use]
    pub fn selected_volume(&self) -> Option<VolumeId> {
        self.selection.single
    }

    /// Restores every highlighted volume's original material and drops the
    /// derived glow materials. Never touches originals, so repeated
    /// select/clear cycles are lossless.
    pub fn clear_selection(&mut self) {
        for (id, derived) in std::mem::take(&mut self.selection.highlighted) {
            if let Some(volume) = self.volumes.get_mut(id) {
                volume.material = volume.original_material;
            }
            self.materials.remove(derived);
        }
        if let Some(id) = self.selection.single.take() {
            if let Some(volume) = self.volumes.get_mut(id) {
                volume.material = volume.original_material;
            }
        }
        self.selection.plot_key = None;
    }

    /// Applies the hover material to a building, restoring the previous
    /// hover first. The selected volume is never hover-overridden.
    pub fn set_hover(&mut self, id: Option<VolumeId>) {
        if self.hovered == id {
            return;
        }
        self.clear_hover();
        let Some(id) = id else { return };
        if self.selection.single == Some(id) {
            return;
        }
        let hovered_material = self.palette.hovered;
        if let Some(volume) = self.volumes.get_mut(id) {
            volume.material = hovered_material;
            self.hovered = Some(id);
        }
    }

    /// Restores the hovered volume's original material.
    pub fn clear_hover(&mut self) {
        if let Some(id) = self.hovered.take() {
            if let Some(volume) = self.volumes.get_mut(id) {
                if volume.material == self.palette.hovered {
                    volume.material = volume.original_material;
                }
            }
        }
    }

    /// Currently hovered volume.
    #[must_use]
    pub fn hovered(&self) -> Option<VolumeId> {
        self.hovered
    }
}
