//! Renderer events and deferred tasks.

use wayfarer_types::{LngLat, ScreenOffset};
use web_time::Instant;

use super::MapEngine;
use crate::feature::PointFeature;
use crate::interaction::{
    point_click, point_hover, point_leave, InputMode, Interaction, InteractionContext, LayerEvent,
    PopupRequest,
};
use crate::messenger::Label;
use crate::overlay::Overlay;
use crate::scheduler::Task;
use crate::surface::{
    CameraMove, Cursor, LayerId, LayerOwner, MarkerId, MotionOrigin, PopupContent, PopupSpec,
};

/// Event reported by the map surface.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The renderer finished loading the style.
    StyleLoaded,
    /// Zoom level changed.
    Zoom,
    /// Camera started moving.
    MoveStart {
        /// Who moves the camera.
        origin: MotionOrigin,
    },
    /// Camera stopped moving.
    MoveEnd {
        /// Who moved the camera.
        origin: MotionOrigin,
    },
    /// Pointer event on a layer.
    Layer {
        /// Layer the event happened on.
        layer: LayerId,
        /// The event.
        event: LayerEvent,
    },
    /// Pointer entered a leg marker of a spiderfied cluster.
    MarkerEnter(MarkerId),
    /// Pointer left a leg marker.
    MarkerLeave(MarkerId),
    /// Click or tap on a leg marker.
    MarkerClick(MarkerId),
    /// Pointer entered the popup content.
    PopupEnter,
    /// Pointer left the popup content.
    PopupLeave,
    /// "View details" affordance of the popup was activated.
    PopupViewDetails,
    /// Close affordance of the popup was activated.
    PopupClose,
}

impl MapEngine {
    /// Handles an event of the map surface.
    ///
    /// Delays started by the event are measured from the time of the last
    /// [`MapEngine::advance`]. Hosts that do not advance every frame must advance to the current
    /// time before forwarding an event, see [`MapEngine::next_deadline`].
    pub fn handle_event(&mut self, event: MapEvent) {
        match event {
            MapEvent::StyleLoaded => {
                if self.readiness.style_loaded() {
                    self.process();
                }
            }
            MapEvent::Zoom => self.on_zoom(),
            MapEvent::MoveStart { .. } => self.is_animating = true,
            MapEvent::MoveEnd { origin } => self.on_move_end(origin),
            MapEvent::Layer { layer, event } => self.on_layer_event(layer, event),
            MapEvent::MarkerEnter(marker) => {
                let interactions = self.on_leg(marker, point_hover);
                self.apply(interactions);
            }
            MapEvent::MarkerLeave(_) => {
                let interactions = point_leave(&self.interaction_context());
                self.apply(interactions);
            }
            MapEvent::MarkerClick(marker) => {
                let interactions = self.on_leg(marker, point_click);
                self.apply(interactions);
            }
            MapEvent::PopupEnter => {
                if self.input == InputMode::Pointer {
                    if let Some(surface) = self.surface.as_deref_mut() {
                        self.popup.pointer_enter(surface, &mut self.timers);
                    }
                }
            }
            MapEvent::PopupLeave => {
                if self.input == InputMode::Pointer {
                    self.popup.hide(&mut self.timers);
                }
            }
            MapEvent::PopupViewDetails => {
                if let Some(slug) = self.popup.target().map(str::to_string) {
                    self.on_map_point_navigate(&slug);
                }
            }
            MapEvent::PopupClose => self.popup.hide(&mut self.timers),
        }
    }

    /// Runs every task that is due at `now`.
    pub fn advance(&mut self, now: Instant) {
        while let Some(task) = self.timers.pop_due(now) {
            self.run_task(task);
        }
        self.timers.set_now(now);
    }

    /// When the next deferred task is due. `None` if nothing is pending, so the host may stop
    /// advancing until the next event.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::FlushJobs => self.flush_jobs(),
            Task::RenderView(kind) => self.render_view(kind),
            Task::RetryFetch => self.request_locations(),
            Task::Popup(task) => {
                if let Some(surface) = self.surface.as_deref_mut() {
                    self.popup.run(surface, &mut self.timers, task);
                }
            }
            Task::Cluster(task) => {
                if let Some(surface) = self.surface.as_deref_mut() {
                    self.cluster_detail.run(surface, &mut self.timers, task);
                }
            }
        }
    }

    pub(super) fn interaction_context(&self) -> InteractionContext {
        InteractionContext {
            input: self.input,
            is_animating: self.is_animating,
            zoom: self
                .surface
                .as_deref()
                .map_or(self.config.zoom, |surface| surface.zoom()),
            popup_zoom: self.popup.zoom(),
            zoom_tolerance: self.config.popup.zoom_tolerance,
            language: self.localizer.language(),
            fallback_language: self.config.fallback_language.clone(),
        }
    }

    fn on_zoom(&mut self) {
        let context = self.interaction_context();
        let mut interactions = vec![];

        if let Some(kind) = self.current_view {
            if let Some(view) = self.views.iter().find(|view| view.kind() == kind) {
                interactions.extend(view.on_zoom(&context));
            }
        }
        interactions.extend(self.highlights.on_zoom(&context));
        interactions.extend(self.tour.on_zoom(&context));
        interactions.extend(self.user_location.on_zoom(&context));

        self.apply(interactions);
    }

    fn on_move_end(&mut self, origin: MotionOrigin) {
        self.is_animating = false;

        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        let zoom = surface.zoom();
        let clamp = self.config.zoom_clamp();
        if origin == MotionOrigin::User && zoom > clamp {
            log::debug!("Zoom {zoom} is over the limit, zooming back to {clamp}");
            surface.ease_to(CameraMove {
                center: None,
                zoom: Some(clamp),
                offset: ScreenOffset::zeros(),
                duration: self.config.timings.camera,
                origin: MotionOrigin::Programmatic,
            });
        }

        self.cluster_detail.collapse_if_strayed(
            surface,
            &mut self.timers,
            zoom,
            self.config.popup.zoom_tolerance,
        );
    }

    fn on_layer_event(&mut self, layer: LayerId, event: LayerEvent) {
        let context = self.interaction_context();
        let Some(surface) = self.surface.as_deref() else {
            return;
        };

        let interactions = match layer.owner() {
            LayerOwner::View(kind) if self.current_view == Some(kind) => self
                .views
                .iter()
                .find(|view| view.kind() == kind)
                .map(|view| view.dispatch(surface, layer, &event, &context))
                .unwrap_or_default(),
            LayerOwner::View(_) => vec![],
            LayerOwner::Highlights => self.highlights.dispatch(layer, &event, &context),
            LayerOwner::Tour => self.tour.dispatch(layer, &event, &context),
            LayerOwner::UserLocation => self.user_location.dispatch(layer, &event, &context),
        };

        self.apply(interactions);
    }

    fn on_leg(
        &self,
        marker: MarkerId,
        handler: impl FnOnce(&PointFeature, ScreenOffset, &InteractionContext) -> Vec<Interaction>,
    ) -> Vec<Interaction> {
        match self.cluster_detail.leg(marker) {
            Some((feature, offset)) => handler(feature, offset, &self.interaction_context()),
            None => vec![],
        }
    }

    fn apply(&mut self, interactions: Vec<Interaction>) {
        for interaction in interactions {
            match interaction {
                Interaction::ShowPopup(request) => self.show_popup(request),
                Interaction::HidePopup => self.popup.hide(&mut self.timers),
                Interaction::Navigate(slug) => {
                    self.on_map_point_navigate(&slug);
                }
                Interaction::SetCursor(cursor) => {
                    if let Some(surface) = self.surface.as_deref_mut() {
                        surface.set_cursor(cursor);
                    }
                }
                Interaction::ZoomIntoCluster { center, zoom } => {
                    self.hide_transients();
                    self.ease_to(center, zoom);
                }
                Interaction::Spiderfy { center, leaves } => {
                    if !self.cluster_detail.accepts(center) {
                        log::debug!("Ignoring click on a cluster that is open or animating");
                        continue;
                    }
                    self.popup.hide(&mut self.timers);
                    let zoom = self.config.cluster.leaf_zoom;
                    self.ease_to(center, zoom);
                    if let Some(surface) = self.surface.as_deref_mut() {
                        surface.set_cursor(Cursor::Default);
                        self.cluster_detail
                            .show(surface, &mut self.timers, center, zoom, leaves);
                    }
                }
            }
        }
    }

    fn ease_to(&mut self, center: LngLat, zoom: f64) {
        if let Some(surface) = self.surface.as_deref_mut() {
            surface.ease_to(CameraMove {
                center: Some(center),
                zoom: Some(zoom),
                offset: ScreenOffset::zeros(),
                duration: self.config.timings.camera,
                origin: MotionOrigin::Programmatic,
            });
        }
    }

    fn show_popup(&mut self, request: PopupRequest) {
        let details_label = request
            .slug
            .as_ref()
            .map(|_| self.localizer.label(Label::ViewDetails));
        let close_label =
            (self.input == InputMode::Touch).then(|| self.localizer.label(Label::Close));

        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        let zoom = surface.zoom();
        let spec = PopupSpec {
            anchor: request.anchor,
            offset: request.offset,
            content: PopupContent {
                title: request.title,
                color: request.color,
                details_label,
                close_label,
            },
        };

        self.popup
            .show(surface, &mut self.timers, spec, request.slug, zoom);
    }
}
