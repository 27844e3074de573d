//! The hall: every piece of runtime state in one owner, advanced one tick at a time.

use crate::camera::{CameraRig, CameraTween, OrbitCameraController};
use crate::config::{DeviceTier, HallConfig};
use crate::error::HallResult;
use crate::exhibit::{ContentStore, Exhibit};
use crate::input::{EventQueue, InputEvent, InputState, PinchTracker, TouchGesture, TouchOutcome};
use crate::nbody::{NBodySimulator, PHYSICS_DT};
use crate::panel::{content_lines, MenuLayout, PanelLayout};
use crate::resolver::{ExhibitResolver, ExhibitUiState};
use crate::scene::{Material, Node, NodeId, Rgb, SceneGraph, Shape, Transform};
use crate::scheduler::ResizeDebouncer;
use crate::viewport::Viewport;
use glam::{DVec2, DVec3};
use std::time::Instant;
use tracing::{debug, info, warn};

pub const GROUND_SIZE: f64 = 80.0;
pub const GROUND_COLOR: Rgb = Rgb::hex(0x90ee90);
pub const BOARD_COLOR: Rgb = Rgb::hex(0xffffff);
pub const ACCENT_COLOR: Rgb = Rgb::hex(0x64ffda);
pub const ICON_COLOR: Rgb = Rgb::hex(0x00bcd4);
pub const SUN_COLOR: Rgb = Rgb::hex(0xfff7b2);
pub const SUN_POSITION: DVec3 = DVec3::new(40.0, 80.0, 40.0);
/// Navigation stops this far in front of an exhibit
pub const VIEWING_DISTANCE: f64 = 5.0;

/// Builds one exhibit's group and returns the top-level node used as its hit volume
pub fn place_exhibit(scene: &mut SceneGraph, exhibit: &Exhibit, segments: u32) -> NodeId {
    let origin = DVec3::new(exhibit.position.x, 0.0, exhibit.position.z);
    let group = scene.place(Node::group(Transform::at(origin)).bound_to(exhibit.index));

    let parts = [
        Node::mesh(
            Shape::Panel {
                half_width: 1.25,
                half_height: 1.0,
            },
            Material::lit(BOARD_COLOR),
            DVec3::new(0.0, 2.0, 0.0),
        ),
        Node::mesh(
            Shape::Panel {
                half_width: 1.15,
                half_height: 0.2,
            },
            Material::unlit(ACCENT_COLOR),
            DVec3::new(0.0, 2.7, 0.01),
        ),
        Node::mesh(
            Shape::Sphere {
                radius: 0.3,
                segments,
            },
            Material::unlit(ICON_COLOR),
            DVec3::new(0.0, 1.3, 0.01),
        ),
        Node::mesh(
            Shape::Cuboid {
                half_extents: DVec3::new(1.6, 0.15, 1.1),
            },
            Material::unlit(ACCENT_COLOR).with_opacity(0.3),
            DVec3::new(0.0, 0.6, 0.0),
        ),
    ];
    for part in parts {
        scene.place(part.child_of(group));
    }
    group
}

/// Ground plane and sun; neither takes part in hit testing
fn place_backdrop(scene: &mut SceneGraph) {
    let half = GROUND_SIZE / 2.0;
    scene.place(Node::mesh(
        Shape::Cuboid {
            half_extents: DVec3::new(half, 0.01, half),
        },
        Material::lit(GROUND_COLOR),
        DVec3::new(0.0, -0.01, 0.0),
    ));
    scene.place(Node::mesh(
        Shape::Sphere {
            radius: 6.0,
            segments: 12,
        },
        Material::unlit(SUN_COLOR),
        SUN_POSITION,
    ));
}

/// Idle bob and sway of exhibit `index` at time `t`
pub fn sway(origin: DVec3, index: usize, t: f64) -> Transform {
    let phase = index as f64 * 0.5;
    Transform {
        translation: origin + DVec3::new(0.0, (t * 2.0 + phase).sin() * 0.1, 0.0),
        yaw: (t + phase).sin() * 0.05,
    }
}

#[derive(Debug)]
pub struct Hall {
    config: HallConfig,
    viewport: Viewport,
    input: InputState,
    rig: CameraRig,
    controller: OrbitCameraController,
    resolver: ExhibitResolver,
    store: ContentStore,
    scene: SceneGraph,
    sim: NBodySimulator,
    tween: Option<CameraTween>,
    touch: Option<TouchGesture>,
    pinch: PinchTracker,
    resize: ResizeDebouncer,
    queue: EventQueue,
    menu_open: bool,
    panel_scroll: usize,
    debug: bool,
    paused: bool,
    quit: bool,
    elapsed: f64,
}

impl Hall {
    pub fn new(config: HallConfig, viewport: Viewport) -> Self {
        Self::with_content(config, viewport, ContentStore::builtin())
    }

    pub fn with_content(config: HallConfig, viewport: Viewport, store: ContentStore) -> Self {
        let mut scene = SceneGraph::new();
        place_backdrop(&mut scene);
        let targets = store
            .iter()
            .map(|exhibit| place_exhibit(&mut scene, exhibit, config.settings.geometry_segments))
            .collect();
        info!(
            tier = ?config.tier,
            exhibits = store.len(),
            cols = viewport.cols,
            rows = viewport.rows,
            "hall ready"
        );
        Hall {
            controller: OrbitCameraController::new(&config),
            debug: config.debug,
            config,
            viewport,
            input: InputState::default(),
            rig: CameraRig::spawn(),
            resolver: ExhibitResolver::new(targets),
            store,
            scene,
            sim: NBodySimulator::three_body(),
            tween: None,
            touch: None,
            pinch: PinchTracker::default(),
            resize: ResizeDebouncer::default(),
            queue: EventQueue::default(),
            menu_open: false,
            panel_scroll: 0,
            paused: false,
            quit: false,
            elapsed: 0.0,
        }
    }

    pub fn push_event(&mut self, event: InputEvent) {
        self.queue.push(event);
    }

    /// One frame: drain events, settle resizes, move the camera, step the sky,
    /// animate the exhibits. Rendering follows separately.
    pub fn tick(&mut self, dt: f64, now: Instant) {
        for event in self.queue.drain() {
            self.handle_event(event);
        }

        if let Some(viewport) = self.resize.poll(now) {
            debug!(cols = viewport.cols, rows = viewport.rows, "viewport resized");
            self.viewport = viewport;
        }

        self.rig = self.controller.tick(dt, &mut self.input, self.rig);
        self.advance_tween(dt);

        if !self.paused {
            self.sim.step(PHYSICS_DT);
            if let Err(err) = self.sim.check_finite() {
                warn!(%err, "body state diverged, restarting the sky");
                self.sim.reset();
            }
        }

        self.elapsed += dt;
        self.animate_exhibits();
    }

    /// Glides the camera to stand in front of exhibit `id`
    pub fn navigate_to(&mut self, id: &str) -> HallResult<()> {
        let exhibit = self.store.find(id)?;
        let from = DVec2::new(self.rig.position.x, self.rig.position.z);
        let to = DVec2::new(exhibit.position.x, exhibit.position.z + VIEWING_DISTANCE);
        info!(id, x = to.x, z = to.y, "navigating");
        self.tween = Some(CameraTween::new(from, to, CameraTween::DEFAULT_DURATION));
        self.menu_open = false;
        Ok(())
    }

    fn advance_tween(&mut self, dt: f64) {
        let Some(tween) = self.tween.as_mut() else {
            return;
        };
        let position = tween.advance(dt);
        self.rig.position.x = position.x;
        self.rig.position.z = position.y;
        self.rig = self.controller.clamp(self.rig);
        if tween.is_finished() {
            self.tween = None;
        }
    }

    fn animate_exhibits(&mut self) {
        for (&node, exhibit) in self.resolver.targets().iter().zip(self.store.iter()) {
            let origin = DVec3::new(exhibit.position.x, 0.0, exhibit.position.z);
            self.scene
                .set_transform(node, sway(origin, exhibit.index, self.elapsed));
        }
    }

    fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { name, pressed } => self.input.set_key(&name, pressed),
            InputEvent::PointerMove { dx, dy } => self.input.apply_pointer_delta(dx, dy),
            InputEvent::PointerLockLost => self.resolver.release_pointer(&mut self.input),
            InputEvent::Click { x, y } => self.handle_click(x, y),
            InputEvent::TouchStart { x, y, at } => {
                if !self.handle_overlay_press(x, y) {
                    self.touch = Some(TouchGesture::begin(x, y, at));
                }
            }
            InputEvent::TouchMove { x, y } => {
                if let Some(gesture) = self.touch.as_mut() {
                    if let Some((dx, dy)) = gesture.update(x, y) {
                        self.input.apply_touch_delta(dx, dy);
                    }
                }
            }
            InputEvent::TouchEnd { x, y, at } => {
                if let Some(gesture) = self.touch.take() {
                    if let TouchOutcome::Tap { x, y } = gesture.finish(x, y, at) {
                        self.select_at(x, y);
                    }
                }
            }
            InputEvent::Pinch { spread } => {
                if let Some(delta) = self.pinch.sample(spread) {
                    self.input.apply_pinch_delta(delta);
                }
            }
            InputEvent::PinchEnd => self.pinch.reset(),
            InputEvent::Resize { viewport, at } => self.resize.push(viewport, at),
            InputEvent::ToggleMenu => self.menu_open = !self.menu_open,
            InputEvent::MenuSelect(index) => {
                if self.menu_open {
                    self.select_menu_item(index);
                }
            }
            InputEvent::CloseExhibit => self.close_exhibit(),
            InputEvent::ScrollPanel(lines) => self.scroll_panel(lines),
            InputEvent::ToggleDebug => self.debug = !self.debug,
            InputEvent::TogglePause => {
                self.paused = !self.paused;
                info!(paused = self.paused, "sky simulation toggled");
            }
            InputEvent::Quit => self.quit = true,
        }
    }

    /// Desktop click: engage look mode if needed, then pick what is under the
    /// crosshair (or under the pointer when look mode was not yet engaged)
    fn handle_click(&mut self, x: f64, y: f64) {
        if self.handle_overlay_press(x, y) {
            return;
        }
        let was_locked = self.input.pointer_locked;
        if self.config.tier == DeviceTier::Desktop {
            self.resolver.engage_pointer(&mut self.input);
        }
        let (x, y) = if was_locked {
            self.viewport.center()
        } else {
            (x, y)
        };
        self.select_at(x, y);
    }

    /// Menu and panel swallow presses that land on them
    fn handle_overlay_press(&mut self, x: f64, y: f64) -> bool {
        if self.resolver.is_open() {
            if PanelLayout::for_viewport(&self.viewport).hits_close(&self.viewport, x, y) {
                self.close_exhibit();
            }
            return true;
        }
        if self.menu_open {
            let layout = MenuLayout::for_viewport(&self.viewport, self.store.len());
            if let Some(index) = layout.item_at(&self.viewport, x, y) {
                self.select_menu_item(index);
                return true;
            }
        }
        false
    }

    fn select_at(&mut self, x: f64, y: f64) {
        if self.resolver.is_open() {
            return;
        }
        let hit = self.resolver.resolve_click(
            x,
            y,
            &self.viewport,
            &self.rig,
            &self.scene,
            &self.store,
        );
        if let Some(exhibit) = hit {
            self.resolver.open(exhibit, &mut self.input);
            self.panel_scroll = 0;
        }
    }

    fn select_menu_item(&mut self, index: usize) {
        let Some(id) = self.store.get(index).map(|exhibit| exhibit.id.clone()) else {
            return;
        };
        if let Err(err) = self.navigate_to(&id) {
            warn!(%err, "menu entry has no exhibit");
        }
    }

    fn close_exhibit(&mut self) {
        if self.resolver.is_open() {
            self.resolver.close(&mut self.input);
            self.panel_scroll = 0;
        }
    }

    fn scroll_panel(&mut self, lines: i32) {
        let Some(exhibit) = self.open_exhibit() else {
            return;
        };
        let layout = PanelLayout::for_viewport(&self.viewport);
        let total = content_lines(exhibit, layout.body.width as usize).len();
        let max = layout.max_scroll(total) as i64;
        self.panel_scroll = (self.panel_scroll as i64 + lines as i64).clamp(0, max) as usize;
    }

    pub fn open_exhibit(&self) -> Option<&Exhibit> {
        match self.resolver.state() {
            ExhibitUiState::Open(id) => self.store.find(id).ok(),
            ExhibitUiState::Closed => None,
        }
    }

    pub fn config(&self) -> &HallConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn resolver(&self) -> &ExhibitResolver {
        &self.resolver
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn sim(&self) -> &NBodySimulator {
        &self.sim
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn panel_scroll(&self) -> usize {
        self.panel_scroll
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn is_navigating(&self) -> bool {
        self.tween.is_some()
    }
}
