//! Spiderfied clusters.
//!
//! When a cluster cannot be broken up by zooming in any further, its points are drawn as markers
//! on legs around the cluster center. [`ClusterDetail`] keeps the one open session:
//!
//! * showing creates one marker per point, fades the legs in, and marks the session settled
//!   once the fade is over;
//! * hiding fades the legs out and removes the markers once the fade is over.
//!
//! A session is identified by the [`CoordKey`] of the cluster center. While legs are fading
//! in or out the session is `animating` and other clusters cannot be opened.

use std::time::Duration;

use ahash::AHashMap;
use wayfarer_types::{CoordKey, LngLat, ScreenOffset};

use crate::feature::PointFeature;
use crate::scheduler::{Task, TimerQueue};
use crate::surface::{MapSurface, MarkerId, MarkerSpec};

mod spiderfier;

pub use spiderfier::{LegPlacement, Spiderfier};

/// Transition step of the cluster legs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ClusterTask {
    /// Fade the legs of the session in.
    FadeIn { key: CoordKey },
    /// Legs finished fading in.
    Settle { key: CoordKey },
    /// Remove the markers of a retired batch of legs.
    Remove { key: CoordKey, batch: u64 },
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct LegTimings {
    pub fade_in: Duration,
    pub fade: Duration,
}

#[derive(Debug)]
struct Leg {
    marker: MarkerId,
    feature: PointFeature,
    offset: ScreenOffset,
}

#[derive(Debug)]
struct Session {
    key: CoordKey,
    zoom: f64,
    legs: Vec<Leg>,
    open: bool,
    animating: bool,
}

#[derive(Debug)]
pub(crate) struct ClusterDetail {
    spiderfier: Spiderfier,
    timings: LegTimings,
    session: Option<Session>,
    retiring: AHashMap<u64, Vec<MarkerId>>,
    next_batch: u64,
}

impl ClusterDetail {
    pub fn new(spiderfier: Spiderfier, timings: LegTimings) -> Self {
        Self {
            spiderfier,
            timings,
            session: None,
            retiring: AHashMap::new(),
            next_batch: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.as_ref().is_some_and(|session| session.open)
    }

    /// Returns true if [`ClusterDetail::show`] would open the cluster at `center`.
    pub fn accepts(&self, center: LngLat) -> bool {
        self.session
            .as_ref()
            .map_or(true, |session| !session.animating && session.key != center.key())
    }

    /// Spiderfies the cluster at `center`. `zoom` is the zoom the camera settles at.
    pub fn show(
        &mut self,
        surface: &mut dyn MapSurface,
        timers: &mut TimerQueue<Task>,
        center: LngLat,
        zoom: f64,
        leaves: Vec<PointFeature>,
    ) {
        let key = center.key();
        if let Some(session) = &self.session {
            if session.animating {
                log::debug!("Cluster legs are animating, ignoring the click");
                return;
            }
            if session.key == key {
                return;
            }
        }

        if let Some(previous) = self.session.take() {
            self.retire(surface, timers, previous);
        }

        let placements = self.spiderfier.place(leaves.len());
        let legs = leaves
            .into_iter()
            .zip(placements)
            .map(|(feature, placement)| {
                let properties = &feature.properties;
                let marker = surface.add_marker(MarkerSpec {
                    anchor: center,
                    offset: placement.offset,
                    leg_angle: placement.angle,
                    leg_length: placement.length,
                    color: properties.color.clone(),
                    stroke_color: properties.stroke_color.clone(),
                    radius: properties.radius,
                    stroke_width: properties.stroke_width,
                });

                Leg {
                    marker,
                    feature,
                    offset: placement.offset,
                }
            })
            .collect();

        self.session = Some(Session {
            key,
            zoom,
            legs,
            open: true,
            animating: true,
        });
        timers.schedule(
            self.timings.fade_in,
            Task::Cluster(ClusterTask::FadeIn { key }),
        );
    }

    /// Collapses the open session.
    pub fn hide(&mut self, surface: &mut dyn MapSurface, timers: &mut TimerQueue<Task>) {
        let Some(session) = self.session.as_mut().filter(|session| session.open) else {
            return;
        };

        session.open = false;
        session.animating = true;
        let key = session.key;
        let markers: Vec<MarkerId> = session.legs.drain(..).map(|leg| leg.marker).collect();
        self.fade_out(surface, timers, key, markers);
    }

    /// Collapses the session if the camera zoomed away from the legs.
    pub fn collapse_if_strayed(
        &mut self,
        surface: &mut dyn MapSurface,
        timers: &mut TimerQueue<Task>,
        zoom: f64,
        tolerance: f64,
    ) {
        let strayed = self
            .session
            .as_ref()
            .is_some_and(|session| session.open && (zoom - session.zoom).abs() > tolerance);
        if strayed {
            self.hide(surface, timers);
        }
    }

    /// Feature and screen offset of the leg with the marker.
    pub fn leg(&self, marker: MarkerId) -> Option<(&PointFeature, ScreenOffset)> {
        self.session
            .as_ref()?
            .legs
            .iter()
            .find(|leg| leg.marker == marker)
            .map(|leg| (&leg.feature, leg.offset))
    }

    /// Removes every marker without a transition.
    pub fn remove(&mut self, surface: &mut dyn MapSurface) {
        if let Some(session) = self.session.take() {
            for leg in session.legs {
                surface.remove_marker(leg.marker);
            }
        }

        for (_, markers) in self.retiring.drain() {
            for marker in markers {
                surface.remove_marker(marker);
            }
        }
    }

    pub fn run(&mut self, surface: &mut dyn MapSurface, timers: &mut TimerQueue<Task>, task: ClusterTask) {
        match task {
            ClusterTask::FadeIn { key } => {
                let Some(session) = self.session_mut(key).filter(|session| session.open) else {
                    return;
                };

                for leg in &session.legs {
                    surface.set_marker_visible(leg.marker, true);
                }
                timers.schedule(self.timings.fade, Task::Cluster(ClusterTask::Settle { key }));
            }
            ClusterTask::Settle { key } => {
                if let Some(session) = self.session_mut(key).filter(|session| session.open) {
                    session.animating = false;
                }
            }
            ClusterTask::Remove { key, batch } => {
                for marker in self.retiring.remove(&batch).unwrap_or_default() {
                    surface.remove_marker(marker);
                }

                if self.session.as_ref().is_some_and(|s| s.key == key && !s.open) {
                    self.session = None;
                }
            }
        }
    }

    fn session_mut(&mut self, key: CoordKey) -> Option<&mut Session> {
        self.session.as_mut().filter(|session| session.key == key)
    }

    /// Fades out the legs of a session that is being replaced. Its state is dropped right away.
    fn retire(&mut self, surface: &mut dyn MapSurface, timers: &mut TimerQueue<Task>, session: Session) {
        let markers = session.legs.into_iter().map(|leg| leg.marker).collect();
        self.fade_out(surface, timers, session.key, markers);
    }

    fn fade_out(
        &mut self,
        surface: &mut dyn MapSurface,
        timers: &mut TimerQueue<Task>,
        key: CoordKey,
        markers: Vec<MarkerId>,
    ) {
        for marker in &markers {
            surface.set_marker_visible(*marker, false);
        }

        let batch = self.next_batch;
        self.next_batch += 1;
        self.retiring.insert(batch, markers);
        timers.schedule(
            self.timings.fade,
            Task::Cluster(ClusterTask::Remove { key, batch }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::tests::site;
    use crate::surface::RecordingSurface;
    use approx::assert_abs_diff_eq;
    use web_time::Instant;

    struct Harness {
        surface: RecordingSurface,
        timers: TimerQueue<Task>,
        detail: ClusterDetail,
        start: Instant,
    }

    impl Harness {
        fn new() -> Self {
            let start = Instant::now();
            Self {
                surface: RecordingSurface::default(),
                timers: TimerQueue::new(start),
                detail: ClusterDetail::new(
                    Spiderfier::default(),
                    LegTimings {
                        fade_in: Duration::from_millis(10),
                        fade: Duration::from_millis(250),
                    },
                ),
                start,
            }
        }

        fn advance_to(&mut self, millis: u64) {
            let now = self.start + Duration::from_millis(millis);
            while let Some(task) = self.timers.pop_due(now) {
                let Task::Cluster(task) = task else {
                    panic!("unexpected task {task:?}");
                };
                self.detail.run(&mut self.surface, &mut self.timers, task);
            }
            self.timers.set_now(now);
        }

        fn show(&mut self, lng: f64, lat: f64, count: usize) {
            let leaves = (0..count)
                .map(|i| site(&format!("loc-{i}"), lng, lat))
                .collect();
            self.detail.show(
                &mut self.surface,
                &mut self.timers,
                LngLat::new(lng, lat),
                17.0,
                leaves,
            );
        }

        fn visible_markers(&self) -> usize {
            self.surface
                .markers()
                .iter()
                .filter(|(_, _, visible)| *visible)
                .count()
        }
    }

    #[test]
    fn legs_fade_in_and_settle() {
        let mut h = Harness::new();
        h.show(1.0, 2.0, 5);
        assert_eq!(h.surface.markers().len(), 5);
        assert_eq!(h.visible_markers(), 0);

        h.advance_to(10);
        assert_eq!(h.visible_markers(), 5);

        h.advance_to(260);
        assert!(h.detail.is_open());
        assert!(h.timers.is_empty());
    }

    #[test]
    fn circle_legs_are_evenly_spaced() {
        let mut h = Harness::new();
        h.show(1.0, 2.0, 4);

        let markers = h.surface.markers();
        for (i, (_, spec, _)) in markers.iter().enumerate() {
            assert_abs_diff_eq!(spec.leg_angle, i as f64 * std::f64::consts::FRAC_PI_2);
            assert_eq!(spec.anchor, LngLat::new(1.0, 2.0));
        }
    }

    #[test]
    fn clicks_during_animation_are_ignored() {
        let mut h = Harness::new();
        h.show(1.0, 2.0, 3);
        assert!(!h.detail.accepts(LngLat::new(5.0, 6.0)));
        h.show(5.0, 6.0, 3);
        assert_eq!(h.surface.markers().len(), 3);

        h.advance_to(300);
        assert!(!h.detail.accepts(LngLat::new(1.0, 2.0)));
        assert!(h.detail.accepts(LngLat::new(5.0, 6.0)));
    }

    #[test]
    fn other_cluster_replaces_settled_session() {
        let mut h = Harness::new();
        h.show(1.0, 2.0, 3);
        h.advance_to(300);

        h.show(5.0, 6.0, 4);
        assert_eq!(h.surface.markers().len(), 7);

        h.advance_to(1000);
        let markers = h.surface.markers();
        assert_eq!(markers.len(), 4);
        assert!(markers
            .iter()
            .all(|(_, spec, visible)| *visible && spec.anchor == LngLat::new(5.0, 6.0)));
        assert!(h.detail.is_open());
    }

    #[test]
    fn hide_removes_legs_after_fade() {
        let mut h = Harness::new();
        h.show(1.0, 2.0, 3);
        h.advance_to(300);

        h.detail.hide(&mut h.surface, &mut h.timers);
        assert!(!h.detail.is_open());
        assert_eq!(h.visible_markers(), 0);
        assert_eq!(h.surface.markers().len(), 3);

        h.advance_to(550);
        assert!(h.surface.markers().is_empty());

        h.show(1.0, 2.0, 3);
        assert_eq!(h.surface.markers().len(), 3);
    }

    #[test]
    fn legs_resolve_to_features() {
        let mut h = Harness::new();
        h.show(1.0, 2.0, 2);
        let (marker, _, _) = h.surface.markers()[1];
        let (feature, offset) = h.detail.leg(marker).expect("leg exists");
        assert_eq!(feature.id, "loc-1");
        assert!(offset.norm() > 0.0);
    }

    #[test]
    fn zooming_away_collapses() {
        let mut h = Harness::new();
        h.show(1.0, 2.0, 3);
        h.advance_to(300);

        h.detail
            .collapse_if_strayed(&mut h.surface, &mut h.timers, 16.5, 1.0);
        assert!(h.detail.is_open());

        h.detail
            .collapse_if_strayed(&mut h.surface, &mut h.timers, 15.0, 1.0);
        assert!(!h.detail.is_open());
    }
}
