//! The single popup of the map.
//!
//! The popup fades in and out, so showing and hiding it are small timed transitions:
//!
//! ```text
//! Hidden --show--> Showing --fade in--> Shown --hide--> Hiding --fade out, detach--> Hidden
//! ```
//!
//! A popup is identified by the [`CoordKey`] of its anchor, its pixel offset and the location it
//! leads to. Legs of a spiderfied cluster often share the anchor coordinate, the offset and the
//! target tell them apart. Showing the popup that is already shown does not attach it again, it
//! only cancels a pending hide.

use std::time::Duration;

use wayfarer_types::{CoordKey, ScreenOffset};

use crate::scheduler::{Task, TimerHandle, TimerQueue};
use crate::surface::{MapSurface, PopupSpec};

/// Transition step of the popup.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum PopupTask {
    FadeIn,
    FadeOut,
    Detach,
}

/// State of the popup.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PopupState {
    /// No popup is attached.
    Hidden,
    /// Attached, waiting to fade in.
    Showing,
    /// Attached and visible.
    Shown,
    /// Waiting to fade out and detach.
    Hiding,
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct PopupTimings {
    pub fade_in: Duration,
    pub hide_delay: Duration,
    pub fade_out: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PopupKey {
    anchor: CoordKey,
    offset: [i64; 2],
    target: Option<String>,
}

impl PopupKey {
    fn new(spec: &PopupSpec, target: &Option<String>) -> Self {
        Self {
            anchor: spec.anchor.key(),
            offset: pixels(spec.offset),
            target: target.clone(),
        }
    }
}

fn pixels(offset: ScreenOffset) -> [i64; 2] {
    [offset.x.round() as i64, offset.y.round() as i64]
}

#[derive(Debug)]
pub(crate) struct Popup {
    state: PopupState,
    key: Option<PopupKey>,
    zoom: Option<f64>,
    target: Option<String>,
    timer: Option<TimerHandle>,
    timings: PopupTimings,
}

impl Popup {
    pub fn new(timings: PopupTimings) -> Self {
        Self {
            state: PopupState::Hidden,
            key: None,
            zoom: None,
            target: None,
            timer: None,
            timings,
        }
    }

    pub fn state(&self) -> PopupState {
        self.state
    }

    /// Zoom the popup was shown at.
    pub fn zoom(&self) -> Option<f64> {
        self.zoom
    }

    /// Slug the "view details" affordance leads to.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn show(
        &mut self,
        surface: &mut dyn MapSurface,
        timers: &mut TimerQueue<Task>,
        spec: PopupSpec,
        target: Option<String>,
        zoom: f64,
    ) {
        let key = PopupKey::new(&spec, &target);
        if self.state != PopupState::Hidden && self.key.as_ref() == Some(&key) {
            if self.state == PopupState::Hiding {
                self.cancel_timer(timers);
                surface.set_popup_visible(true);
                self.state = PopupState::Shown;
            }
            return;
        }

        self.cancel_timer(timers);
        if self.state != PopupState::Hidden {
            surface.detach_popup();
        }

        surface.attach_popup(spec);
        self.key = Some(key);
        self.zoom = Some(zoom);
        self.target = target;
        self.state = PopupState::Showing;
        self.timer = Some(timers.schedule(self.timings.fade_in, Task::Popup(PopupTask::FadeIn)));
    }

    pub fn hide(&mut self, timers: &mut TimerQueue<Task>) {
        if matches!(self.state, PopupState::Hidden | PopupState::Hiding) {
            return;
        }

        self.cancel_timer(timers);
        self.state = PopupState::Hiding;
        self.timer = Some(timers.schedule(
            self.timings.hide_delay,
            Task::Popup(PopupTask::FadeOut),
        ));
    }

    /// Pointer entered the popup content: keep it open.
    pub fn pointer_enter(&mut self, surface: &mut dyn MapSurface, timers: &mut TimerQueue<Task>) {
        if self.state == PopupState::Hiding {
            self.cancel_timer(timers);
            surface.set_popup_visible(true);
            self.state = PopupState::Shown;
        }
    }

    /// Detaches the popup without a transition.
    pub fn remove(&mut self, surface: &mut dyn MapSurface, timers: &mut TimerQueue<Task>) {
        self.cancel_timer(timers);
        if self.state != PopupState::Hidden {
            surface.detach_popup();
        }
        self.reset();
    }

    pub fn run(&mut self, surface: &mut dyn MapSurface, timers: &mut TimerQueue<Task>, task: PopupTask) {
        self.timer = None;
        match (task, self.state) {
            (PopupTask::FadeIn, PopupState::Showing) => {
                surface.set_popup_visible(true);
                self.state = PopupState::Shown;
            }
            (PopupTask::FadeOut, PopupState::Hiding) => {
                surface.set_popup_visible(false);
                self.timer = Some(timers.schedule(
                    self.timings.fade_out,
                    Task::Popup(PopupTask::Detach),
                ));
            }
            (PopupTask::Detach, PopupState::Hiding) => {
                surface.detach_popup();
                self.reset();
            }
            (task, state) => log::debug!("Stale popup task {task:?} in state {state:?}"),
        }
    }

    fn cancel_timer(&mut self, timers: &mut TimerQueue<Task>) {
        if let Some(handle) = self.timer.take() {
            timers.cancel(handle);
        }
    }

    fn reset(&mut self) {
        self.state = PopupState::Hidden;
        self.key = None;
        self.zoom = None;
        self.target = None;
    }
}
