//! The map engine.
//!
//! [`MapEngine`] owns the map surface and every component drawn on it: the point views, the
//! overlays, the popup and the spiderfied cluster. The page talks to the engine through its
//! public methods, the host forwards renderer events with [`MapEngine::handle_event`] and drives
//! time with [`MapEngine::advance`].
//!
//! Until the engine is ready (see [`Readiness`]) operations that draw something are queued and
//! run in the order they were requested once it is.

use std::collections::HashMap;

use wayfarer_types::{LngLat, LngLatBounds};
use web_time::Instant;

use crate::cluster::{ClusterDetail, LegTimings, Spiderfier};
use crate::config::MapConfig;
use crate::error::MapError;
use crate::feature::{LocationCollection, PointFeature};
use crate::interaction::InputMode;
use crate::layout::Breakpoint;
use crate::messenger::{Label, LocationSource, Localizer, Navigator};
use crate::overlay::{Highlights, Overlay, Tour, TourStop, UserLocation};
use crate::popup::{Popup, PopupState, PopupTimings};
use crate::scheduler::{Task, TimerQueue};
use crate::surface::{CameraMove, FitOptions, MapSurface, MotionOrigin};
use crate::view::{ClusteredView, PointView, UnclusteredView, ViewKind};

mod builder;
mod events;
mod jobs;

pub use builder::MapEngineBuilder;
pub use events::MapEvent;
pub use jobs::Readiness;
use jobs::JobQueue;

/// Controller of the map.
pub struct MapEngine {
    config: MapConfig,
    surface: Option<Box<dyn MapSurface>>,
    navigator: Box<dyn Navigator>,
    localizer: Box<dyn Localizer>,
    location_source: Box<dyn LocationSource>,

    readiness: Readiness,
    jobs: JobQueue,
    timers: TimerQueue<Task>,
    fetch_attempts: u32,

    full_data: LocationCollection,
    current_data: Option<LocationCollection>,
    default_view: ViewKind,
    current_view: Option<ViewKind>,
    views: Vec<Box<dyn PointView>>,

    highlights: Highlights,
    tour: Tour,
    user_location: UserLocation,
    popup: Popup,
    cluster_detail: ClusterDetail,

    input: InputMode,
    drawer_open: bool,
    is_animating: bool,
}

impl MapEngine {
    /// Returns a builder of the engine.
    pub fn builder() -> MapEngineBuilder {
        MapEngineBuilder::default()
    }

    pub(crate) fn new(
        config: MapConfig,
        navigator: Box<dyn Navigator>,
        localizer: Box<dyn Localizer>,
        location_source: Box<dyn LocationSource>,
        now: Instant,
    ) -> Self {
        let timings = config.timings;
        let views: Vec<Box<dyn PointView>> = vec![
            Box::new(ClusteredView::new(config.cluster, config.max_zoom)),
            Box::new(UnclusteredView::new()),
        ];

        Self {
            navigator,
            localizer,
            location_source,
            surface: None,
            readiness: Readiness::default(),
            jobs: JobQueue::default(),
            timers: TimerQueue::new(now),
            fetch_attempts: 0,
            full_data: LocationCollection::default(),
            current_data: None,
            default_view: config.default_view,
            current_view: None,
            views,
            highlights: Highlights::new(),
            tour: Tour::new(),
            user_location: UserLocation::new(),
            popup: Popup::new(PopupTimings {
                fade_in: timings.popup_fade_in,
                hide_delay: timings.popup_hide_delay,
                fade_out: timings.popup_fade_out,
            }),
            cluster_detail: ClusterDetail::new(
                Spiderfier::new(config.spiderfier),
                LegTimings {
                    fade_in: timings.legs_fade_in,
                    fade: timings.legs_fade,
                },
            ),
            input: InputMode::default(),
            drawer_open: false,
            is_animating: false,
            config,
        }
    }

    /// Binds the engine to the map surface and starts fetching the locations.
    ///
    /// The surface should be created with [`MapConfig::map_options`]. The engine becomes ready
    /// once the surface reports [`MapEvent::StyleLoaded`] and the locations are delivered through
    /// [`MapEngine::on_locations_loaded`].
    pub fn init(&mut self, surface: Box<dyn MapSurface>) {
        if self.surface.is_some() {
            log::warn!("Map engine is already initialized");
            return;
        }

        self.surface = Some(surface);
        self.request_locations();
    }

    /// Delivers the result of a locations request.
    ///
    /// A failed request is retried with exponential backoff. When no attempts are left, the
    /// engine stays not ready.
    pub fn on_locations_loaded(&mut self, result: Result<LocationCollection, MapError>) {
        match result {
            Ok(data) => {
                log::debug!("Loaded {} locations", data.len());
                self.full_data = data;
                if self.readiness.data_loaded() {
                    self.process();
                } else if self.is_ready() && self.current_data.is_none() {
                    self.set_current_view_data(None);
                }
            }
            Err(err) => {
                let fetch = self.config.fetch;
                if self.fetch_attempts < fetch.max_attempts {
                    let delay = fetch.backoff(self.fetch_attempts);
                    log::warn!(
                        "Failed to load locations (attempt {}/{}): {err}. Retrying in {delay:?}",
                        self.fetch_attempts,
                        fetch.max_attempts
                    );
                    self.timers.schedule(delay, Task::RetryFetch);
                } else {
                    log::error!(
                        "Failed to load locations after {} attempts: {err}",
                        self.fetch_attempts
                    );
                }
            }
        }
    }

    /// Switches the point view.
    ///
    /// Does nothing if the view is already active. Before the engine is ready, the last
    /// requested view becomes the view activated on readiness.
    pub fn set_view(&mut self, kind: ViewKind) {
        if self.current_view == Some(kind) {
            return;
        }

        if !self.is_ready() {
            self.default_view = kind;
            self.jobs.push(move |engine| engine.set_view(kind));
            return;
        }

        self.activate_view(kind);
    }

    /// Sets the data of the active view. `None` restores the full collection.
    pub fn set_current_view_data(&mut self, data: Option<LocationCollection>) {
        if !self.is_ready() {
            self.jobs
                .push(move |engine| engine.set_current_view_data(data));
            return;
        }

        self.current_data = data;
        self.hide_transients();

        let Some(kind) = self.current_view else {
            return;
        };
        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };

        let data = self.current_data.as_ref().unwrap_or(&self.full_data);
        if let Some(view) = find_view(&mut self.views, kind) {
            if let Err(err) = view.set_data(surface, data, &self.config.world_bounds) {
                log::warn!("Failed to set data of {} view: {err}", kind.as_str());
            }
        }
    }

    /// Shows only the locations with the given ids in the active view.
    pub fn set_filtered_view_data<S: AsRef<str>>(&mut self, ids: &[S]) {
        if !self.is_ready() {
            let ids: Vec<String> = ids.iter().map(|id| id.as_ref().to_string()).collect();
            self.jobs
                .push(move |engine| engine.set_filtered_view_data(&ids));
            return;
        }

        let filtered = self.full_data.filter_by_ids(ids);
        log::debug!(
            "Filtered {} of {} locations",
            filtered.len(),
            self.full_data.len()
        );
        self.set_current_view_data(Some(filtered));
    }

    /// Moves the camera to show every point of the active view.
    pub fn fit_to_current_view_bounds(&mut self) {
        if !self.is_ready() {
            self.jobs
                .push(|engine| engine.fit_to_current_view_bounds());
            return;
        }

        let Some(bounds) = self.current_bounds() else {
            log::debug!("Active view has no bounds to fit");
            return;
        };
        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };

        let padding = Breakpoint::from_width(surface.container_width()).padding(self.drawer_open);
        surface.fit_bounds(
            bounds,
            FitOptions {
                padding,
                max_zoom: self.config.fit_max_zoom,
                duration: self.config.timings.camera,
                origin: MotionOrigin::Programmatic,
            },
        );
    }

    /// Highlights the given locations.
    pub fn set_highlights(&mut self, items: Vec<PointFeature>) {
        if !self.is_ready() {
            self.jobs.push(move |engine| engine.set_highlights(items));
            return;
        }

        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        if let Err(err) = self.highlights.set_data(surface, &items) {
            log::warn!("Failed to set highlights: {err}");
        }
    }

    /// Removes the highlights.
    pub fn clear_highlights(&mut self) {
        if !self.is_ready() {
            self.jobs.push(|engine| engine.clear_highlights());
            return;
        }

        if let Some(surface) = self.surface.as_deref_mut() {
            self.highlights.teardown(surface);
        }
    }

    /// Shows or hides the highlights without dropping them.
    pub fn set_highlights_visible(&mut self, visible: bool) {
        if !self.is_ready() {
            self.jobs
                .push(move |engine| engine.set_highlights_visible(visible));
            return;
        }

        if let Some(surface) = self.surface.as_deref_mut() {
            self.highlights.set_visible(surface, visible);
        }
    }

    /// Draws the path of a tour.
    pub fn set_tour_path(&mut self, path: Vec<LngLat>) {
        if !self.is_ready() {
            self.jobs.push(move |engine| engine.set_tour_path(path));
            return;
        }

        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        if let Err(err) = self.tour.set_path(surface, &path) {
            log::warn!("Failed to set tour path: {err}");
        }
    }

    /// Draws the stops of a tour.
    pub fn set_tour_stops(&mut self, stops: Vec<TourStop>) {
        if !self.is_ready() {
            self.jobs.push(move |engine| engine.set_tour_stops(stops));
            return;
        }

        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        if let Err(err) = self.tour.set_stops(surface, &stops) {
            log::warn!("Failed to set tour stops: {err}");
        }
    }

    /// Removes the tour path and stops.
    pub fn clear_tour(&mut self) {
        if !self.is_ready() {
            self.jobs.push(|engine| engine.clear_tour());
            return;
        }

        if let Some(surface) = self.surface.as_deref_mut() {
            self.tour.teardown(surface);
        }
    }

    /// Shows or hides the tour without dropping it.
    pub fn set_tour_visible(&mut self, visible: bool) {
        if !self.is_ready() {
            self.jobs
                .push(move |engine| engine.set_tour_visible(visible));
            return;
        }

        if let Some(surface) = self.surface.as_deref_mut() {
            self.tour.set_visible(surface, visible);
        }
    }

    /// Shows the position of the visitor.
    pub fn set_user_location(&mut self, lng: f64, lat: f64) {
        let position = LngLat::new(lng, lat);
        if !position.is_finite() {
            return;
        }

        if !self.is_ready() {
            self.jobs
                .push(move |engine| engine.set_user_location(lng, lat));
            return;
        }

        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        let language = self.localizer.language();
        let title = self.localizer.label(Label::UserLocation);
        if let Err(err) = self
            .user_location
            .set_position(surface, position, &language, &title)
        {
            log::warn!("Failed to set user location: {err}");
        }
    }

    /// Removes the position of the visitor.
    pub fn clear_user_location(&mut self) {
        if !self.is_ready() {
            self.jobs.push(|engine| engine.clear_user_location());
            return;
        }

        if let Some(surface) = self.surface.as_deref_mut() {
            self.user_location.teardown(surface);
        }
    }

    /// Pans the camera to the point. With `with_drawer_offset` the point is centered in the part
    /// of the map not covered by an open drawer. Non-finite coordinates are ignored.
    pub fn pan_to(&mut self, lng: f64, lat: f64, with_drawer_offset: bool) {
        let center = LngLat::new(lng, lat);
        if !center.is_finite() {
            return;
        }

        if !self.is_ready() {
            self.jobs
                .push(move |engine| engine.pan_to(lng, lat, with_drawer_offset));
            return;
        }

        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        let offset = Breakpoint::from_width(surface.container_width())
            .pan_offset(self.drawer_open && with_drawer_offset);
        surface.ease_to(CameraMove {
            center: Some(center),
            zoom: None,
            offset,
            duration: self.config.timings.camera,
            origin: MotionOrigin::Programmatic,
        });
    }

    /// Navigates to the page of a location. Returns the path, or `None` if there is nowhere to
    /// go.
    pub fn on_map_point_navigate(&mut self, slug: &str) -> Option<String> {
        if slug.is_empty() {
            return None;
        }

        self.popup.hide(&mut self.timers);

        let language = self.localizer.language();
        let vars = HashMap::from([
            ("lang".to_string(), language),
            ("slug".to_string(), slug.to_string()),
        ]);
        match strfmt::strfmt(&self.config.navigation.path_template, &vars) {
            Ok(path) => {
                log::debug!("Navigating to {path}");
                self.navigator.navigate(&path);
                Some(path)
            }
            Err(err) => {
                log::warn!("Failed to build location path: {}", MapError::from(err));
                None
            }
        }
    }

    /// Shows the layers of the active view.
    pub fn show_current_view(&mut self) {
        if !self.is_ready() {
            self.jobs.push(|engine| engine.show_current_view());
            return;
        }

        self.set_current_view_visible(true);
    }

    /// Hides the layers of the active view. The data is kept.
    pub fn hide_current_view(&mut self) {
        if !self.is_ready() {
            self.jobs.push(|engine| engine.hide_current_view());
            return;
        }

        self.hide_transients();
        self.set_current_view_visible(false);
    }

    /// Drops the operations queued until readiness.
    pub fn clear_onload_jobs(&mut self) {
        let dropped = self.jobs.len();
        if dropped > 0 {
            log::debug!("Dropping {dropped} queued jobs");
        }
        self.jobs.clear();
    }

    /// Sets the kind of the input device.
    pub fn set_input_mode(&mut self, input: InputMode) {
        self.input = input;
    }

    /// Tells the engine whether the side drawer covers a part of the map.
    pub fn set_drawer_open(&mut self, open: bool) {
        self.drawer_open = open;
    }

    /// Removes everything the engine put on the map and releases the surface.
    pub fn destroy(&mut self) -> Option<Box<dyn MapSurface>> {
        let mut surface = self.surface.take()?;

        self.popup.remove(surface.as_mut(), &mut self.timers);
        self.cluster_detail.remove(surface.as_mut());
        self.highlights.teardown(surface.as_mut());
        self.tour.teardown(surface.as_mut());
        self.user_location.teardown(surface.as_mut());
        for view in &mut self.views {
            view.teardown(surface.as_mut());
        }

        self.timers.clear();
        self.jobs.clear();
        self.readiness = Readiness::default();
        self.current_view = None;
        self.current_data = None;
        self.is_animating = false;
        self.fetch_attempts = 0;

        Some(surface)
    }

    /// Configuration of the engine.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Map surface, if the engine is initialized.
    pub fn surface(&self) -> Option<&dyn MapSurface> {
        self.surface.as_deref()
    }

    /// Mutable map surface, if the engine is initialized.
    pub fn surface_mut(&mut self) -> Option<&mut dyn MapSurface> {
        self.surface
            .as_mut()
            .map(|surface| surface.as_mut() as &mut dyn MapSurface)
    }

    /// Active view. `None` until the engine has both readiness signals.
    pub fn current_view(&self) -> Option<ViewKind> {
        self.current_view
    }

    /// Bounds of the points of the active view within the world bounds.
    pub fn current_bounds(&self) -> Option<LngLatBounds> {
        let kind = self.current_view?;
        self.views
            .iter()
            .find(|view| view.kind() == kind)
            .and_then(|view| view.bounds())
    }

    /// Returns true if the layers of the view are shown.
    pub fn is_view_visible(&self, kind: ViewKind) -> bool {
        self.views
            .iter()
            .any(|view| view.kind() == kind && view.is_visible())
    }

    /// Readiness state.
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// Returns true if operations run immediately.
    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    /// Returns true while the camera is moving.
    pub fn is_animating(&self) -> bool {
        self.is_animating
    }

    /// Number of operations waiting for readiness.
    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// State of the popup.
    pub fn popup_state(&self) -> PopupState {
        self.popup.state()
    }

    /// Returns true if a cluster is spiderfied.
    pub fn is_cluster_open(&self) -> bool {
        self.cluster_detail.is_open()
    }

    fn request_locations(&mut self) {
        self.fetch_attempts += 1;
        log::debug!(
            "Requesting locations from {} (attempt {})",
            self.config.locations_url,
            self.fetch_attempts
        );
        self.location_source
            .request_locations(&self.config.locations_url);
    }

    /// Both readiness signals fired: show the default view and run the queued jobs once the
    /// renderer settles.
    fn process(&mut self) {
        log::info!(
            "Map is ready, running {} queued jobs after settling",
            self.jobs.len()
        );
        self.activate_view(self.default_view);
        self.timers
            .schedule(self.config.timings.settle_delay, Task::FlushJobs);
    }

    fn flush_jobs(&mut self) {
        self.readiness = Readiness::Ready;
        while let Some(job) = self.jobs.pop() {
            job(self);
        }
    }

    fn activate_view(&mut self, kind: ViewKind) {
        self.hide_transients();

        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };

        for view in self.views.iter_mut().filter(|view| view.kind() != kind) {
            view.set_visible(surface, false);
        }

        self.current_view = Some(kind);
        let data = self.current_data.as_ref().unwrap_or(&self.full_data);
        if let Some(view) = find_view(&mut self.views, kind) {
            if let Err(err) = view.set_data(surface, data, &self.config.world_bounds) {
                log::warn!("Failed to set data of {} view: {err}", kind.as_str());
            }
        }

        log::debug!("Switched to {} view", kind.as_str());
        self.timers
            .schedule(self.config.timings.render_delay, Task::RenderView(kind));
    }

    fn render_view(&mut self, kind: ViewKind) {
        if self.current_view != Some(kind) {
            return;
        }

        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        if let Some(view) = find_view(&mut self.views, kind) {
            match view.render(surface) {
                Ok(()) => log::debug!(
                    "Rendered {} view with {} points",
                    kind.as_str(),
                    view.feature_count()
                ),
                Err(err) => log::warn!("Failed to render {} view: {err}", kind.as_str()),
            }
        }
    }

    fn set_current_view_visible(&mut self, visible: bool) {
        let Some(kind) = self.current_view else {
            return;
        };
        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };

        if let Some(view) = find_view(&mut self.views, kind) {
            view.set_visible(surface, visible);
        }
    }

    /// Hides the popup and collapses the spiderfied cluster.
    fn hide_transients(&mut self) {
        self.popup.hide(&mut self.timers);
        if let Some(surface) = self.surface.as_deref_mut() {
            self.cluster_detail.hide(surface, &mut self.timers);
        }
    }
}

fn find_view(views: &mut [Box<dyn PointView>], kind: ViewKind) -> Option<&mut Box<dyn PointView>> {
    views.iter_mut().find(|view| view.kind() == kind)
}
