use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use arvore::family::{FamilyProvider, JsonFamilySource};
use arvore::tree::{ExpansionController, LayoutConfig, TreeState};
use eframe::egui::{self, Context, Vec2};
use futures::executor::LocalPool;
use tracing::{error, info};

mod graph;
mod render_utils;
mod ui;

/// Command-line settings the app was started with.
#[derive(Clone, Debug)]
pub struct Launch {
    pub data: PathBuf,
    pub layout: Option<PathBuf>,
    pub start: Option<String>,
    pub latency: Duration,
}

struct Loaded {
    source: JsonFamilySource,
    config: LayoutConfig,
}

pub struct ArvoreApp {
    launch: Launch,
    state: AppState,
}

enum AppState {
    Loading { rx: Receiver<Result<Loaded, String>> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    pool: LocalPool,
    controller: ExpansionController,
    people: usize,
    search: String,
    pan: Vec2,
    zoom: f32,
    hovered: Option<String>,
}

impl ArvoreApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, launch: Launch) -> Self {
        let state = Self::start_load(&launch);
        Self { launch, state }
    }

    fn load(launch: &Launch) -> Result<Loaded> {
        let source = JsonFamilySource::load(&launch.data)?.with_latency(launch.latency);
        let config = match &launch.layout {
            Some(path) => LayoutConfig::load(path)?,
            None => LayoutConfig::default(),
        };
        Ok(Loaded { source, config })
    }

    fn spawn_load(launch: Launch) -> Receiver<Result<Loaded, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = Self::load(&launch).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(launch: &Launch) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(launch.clone()),
        }
    }
}

impl eframe::App for ArvoreApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(loaded) => {
                            info!(people = loaded.source.dataset().len(), "family dataset loaded");
                            AppState::Ready(Box::new(ViewModel::new(
                                loaded,
                                self.launch.start.as_deref(),
                            )))
                        }
                        Err(error) => {
                            error!(%error, "could not load family dataset");
                            AppState::Error(error)
                        }
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading family dataset...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the family dataset");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.launch));
                    }
                });
            }
            AppState::Ready(model) => model.show(ctx),
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn new(loaded: Loaded, start: Option<&str>) -> Self {
        let pool = LocalPool::new();
        let people = loaded.source.dataset().len();
        let state = Rc::new(RefCell::new(TreeState::new(loaded.config)));
        let provider: Rc<dyn FamilyProvider> = Rc::new(loaded.source);
        let controller = ExpansionController::new(state, provider, pool.spawner());

        let mut model = Self {
            pool,
            controller,
            people,
            search: start.unwrap_or_default().to_owned(),
            pan: Vec2::ZERO,
            zoom: 1.0,
            hovered: None,
        };
        if let Some(term) = start {
            model.seed(term);
        }
        model
    }

    fn seed(&mut self, term: &str) {
        self.hovered = None;
        self.pan = Vec2::ZERO;
        self.controller.seed(term);
    }

    /// Drives the engine for one frame: finished lookups, the frame clock and the forces.
    fn tick(&mut self, ctx: &Context) {
        self.pool.run_until_stalled();
        self.controller.advance(ctx.input(|input| input.time));
        self.controller.step_physics();

        let state = self.controller.state().borrow();
        let waiting = state.loading_count() > 0 || state.is_animating();
        let simulating = state.physics_enabled() && !state.store().is_empty();
        if waiting || simulating {
            ctx.request_repaint();
        }
    }
}
