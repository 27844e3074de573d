use crate::camera::CameraRig;
use crate::exhibit::{ContentStore, Exhibit};
use crate::input::InputState;
use crate::scene::{NodeId, SceneGraph};
use crate::viewport::Viewport;
use tracing::info;

/// Which exhibit, if any, has its detail panel showing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExhibitUiState {
    #[default]
    Closed,
    Open(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorAffordance {
    #[default]
    Default,
    /// Pointer captured for look; a crosshair stands in for it
    Crosshair,
}

/// Turns clicks and taps into exhibit selections and owns the panel state
#[derive(Debug, Clone)]
pub struct ExhibitResolver {
    state: ExhibitUiState,
    cursor: CursorAffordance,
    /// Top-level hit volumes, one per exhibit
    targets: Vec<NodeId>,
}

impl ExhibitResolver {
    pub fn new(targets: Vec<NodeId>) -> Self {
        ExhibitResolver {
            state: ExhibitUiState::Closed,
            cursor: CursorAffordance::Default,
            targets,
        }
    }

    pub fn state(&self) -> &ExhibitUiState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ExhibitUiState::Open(_))
    }

    pub fn cursor(&self) -> CursorAffordance {
        self.cursor
    }

    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    /// Casts a ray through a screen point and returns the exhibit it lands on.
    ///
    /// The ray may first meet a decorative child; the bound exhibit is always
    /// read from the top-level group.
    pub fn resolve_click<'a>(
        &self,
        screen_x: f64,
        screen_y: f64,
        viewport: &Viewport,
        rig: &CameraRig,
        scene: &SceneGraph,
        store: &'a ContentStore,
    ) -> Option<&'a Exhibit> {
        let ndc = viewport.to_ndc(screen_x, screen_y);
        let ray = rig.ray_through(ndc, viewport.aspect());
        let hit = scene.intersect_nearest(&ray, &self.targets)?;
        let root = scene.get(scene.root_of(hit.node))?;
        if !root.interactive {
            return None;
        }
        root.exhibit.and_then(|index| store.get(index))
    }

    /// Shows an exhibit's panel and gives up pointer capture
    pub fn open(&mut self, exhibit: &Exhibit, input: &mut InputState) {
        info!(id = %exhibit.id, title = %exhibit.title, "exhibit opened");
        self.state = ExhibitUiState::Open(exhibit.id.clone());
        input.exhibit_open = true;
        input.pointer_locked = false;
        self.cursor = CursorAffordance::Default;
    }

    pub fn close(&mut self, input: &mut InputState) {
        if let ExhibitUiState::Open(id) = &self.state {
            info!(id = %id, "exhibit closed");
        }
        self.state = ExhibitUiState::Closed;
        input.exhibit_open = false;
        self.cursor = CursorAffordance::Default;
    }

    /// Enters look mode unless a panel is showing
    pub fn engage_pointer(&mut self, input: &mut InputState) -> bool {
        if self.is_open() || input.pointer_locked {
            return false;
        }
        input.pointer_locked = true;
        self.cursor = CursorAffordance::Crosshair;
        true
    }

    pub fn release_pointer(&mut self, input: &mut InputState) {
        input.pointer_locked = false;
        self.cursor = CursorAffordance::Default;
    }
}
