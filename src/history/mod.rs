use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::build::UpdateHeight;
use crate::error::Result;
use crate::math::Vector3;
use crate::scene::SceneState;

/// One building's recorded state inside a history frame.
///
/// Keyed by the stable metadata id, not the arena id, so a frame survives
/// scene rebuilds and serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEntry {
    pub id: String,
    pub position: [f64; 3],
    pub yaw: f64,
    pub scale: [f64; 3],
    pub height: Option<f64>,
}

/// A full snapshot of every building's editable state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryFrame {
    pub entries: Vec<FrameEntry>,
}

impl HistoryFrame {
    /// Captures the current building set, in stable build order.
    #[must_use]
    pub fn capture(scene: &SceneState) -> Self {
        let mut entries = Vec::with_capacity(scene.buildings().len());
        for &id in scene.buildings() {
            let Ok(volume) = scene.volume(id) else {
                continue;
            };
            let pose = volume.pose;
            entries.push(FrameEntry {
                id: volume.meta.id.clone(),
                position: [pose.position.x, pose.position.y, pose.position.z],
                yaw: pose.yaw,
                scale: [pose.scale.x, pose.scale.y, pose.scale.z],
                height: volume.meta.current_height,
            });
        }
        Self { entries }
    }

    /// Restores the frame onto the scene. Buildings the frame knows but the
    /// scene no longer holds are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns a geometry error if a recorded height cannot be re-extruded.
    pub fn restore(&self, scene: &mut SceneState) -> Result<()> {
        for entry in &self.entries {
            let Some(id) = scene.find_by_meta_id(&entry.id) else {
                warn!(id = %entry.id, "history entry refers to a missing building");
                continue;
            };

            let needs_height = {
                let volume = scene.volume(id)?;
                entry.height.is_some() && volume.meta.current_height != entry.height
            };
            if needs_height {
                if let Some(height) = entry.height {
                    UpdateHeight::new(id, height).execute(scene)?;
                }
            }

            let volume = scene.volume_mut(id)?;
            volume.pose.position = Vector3::new(entry.position[0], entry.position[1], entry.position[2]);
            volume.pose.yaw = entry.yaw;
            volume.pose.scale = Vector3::new(entry.scale[0], entry.scale[1], entry.scale[2]);
        }
        Ok(())
    }
}

/// Undo/redo stacks over history frames.
///
/// The bottom frame is the baseline scene and is never popped, so undo
/// always has a state to land on. Pushing a new frame after an undo drops
/// the redo branch.
#[derive(Debug, Default)]
pub struct HistoryStack {
    undo: Vec<HistoryFrame>,
    redo: Vec<HistoryFrame>,
    preview_return: Option<HistoryFrame>,
}

impl HistoryStack {
    /// Creates empty stacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a committed frame and invalidates the redo branch.
    ///
    /// In-progress drags must not be pushed; capture once on commit.
    pub fn push(&mut self, frame: HistoryFrame) {
        self.undo.push(frame);
        self.redo.clear();
    }

    /// Steps back one frame, restoring the previous state.
    ///
    /// Returns `false` when already at the baseline.
    ///
    /// # Errors
    ///
    /// Returns a geometry error if restoring fails.
    pub fn undo(&mut self, scene: &mut SceneState) -> Result<bool> {
        if self.undo.len() <= 1 {
            return Ok(false);
        }
        let Some(current) = self.undo.pop() else {
            return Ok(false);
        };
        self.redo.push(current);
        if let Some(target) = self.undo.last() {
            target.restore(scene)?;
        }
        Ok(true)
    }

    /// Steps forward one undone frame.
    ///
    /// Returns `false` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns a geometry error if restoring fails.
    pub fn redo(&mut self, scene: &mut SceneState) -> Result<bool> {
        let Some(frame) = self.redo.pop() else {
            return Ok(false);
        };
        frame.restore(scene)?;
        self.undo.push(frame);
        Ok(true)
    }

    /// Temporarily shows the baseline (as-built) state without touching the
    /// undo/redo stacks. The current state is stashed for [`end_preview`].
    ///
    /// No-op when already previewing or when no baseline exists.
    ///
    /// # Errors
    ///
    /// Returns a geometry error if restoring the baseline fails.
    ///
    /// [`end_preview`]: Self::end_preview
    pub fn begin_preview(&mut self, scene: &mut SceneState) -> Result<()> {
        if self.preview_return.is_some() {
            return Ok(());
        }
        let Some(baseline) = self.undo.first() else {
            return Ok(());
        };
        let current = HistoryFrame::capture(scene);
        baseline.restore(scene)?;
        self.preview_return = Some(current);
        Ok(())
    }

    /// Ends a preview, restoring the state from before [`begin_preview`].
    ///
    /// # Errors
    ///
    /// Returns a geometry error if restoring fails.
    ///
    /// [`begin_preview`]: Self::begin_preview
    pub fn end_preview(&mut self, scene: &mut SceneState) -> Result<()> {
        if let Some(frame) = self.preview_return.take() {
            frame.restore(scene)?;
        }
        Ok(())
    }

    /// Whether a preview excursion is active.
    #[must_use]
    pub fn is_previewing(&self) -> bool {
        self.preview_return.is_some()
    }

    /// Number of committed frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.undo.len()
    }

    /// Whether a redo branch exists.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
