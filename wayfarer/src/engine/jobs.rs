//! Readiness gate of the engine.

use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};

use super::MapEngine;

/// Operation deferred until the engine is ready.
pub(crate) type Job = Box<dyn FnOnce(&mut MapEngine)>;

/// Readiness of the engine.
///
/// The engine needs both the map style and the base locations before it can draw anything. The
/// two arrive independently and in any order. Once both are there, the engine waits a little
/// more for the renderer to apply the style, then runs the jobs queued so far.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Waiting for the readiness signals.
    Waiting {
        /// The renderer finished loading the style.
        style_loaded: bool,
        /// The base feature collection was fetched.
        data_loaded: bool,
    },
    /// Both signals fired, queued jobs run after the settle delay.
    Settling,
    /// Operations run immediately.
    Ready,
}

impl Default for Readiness {
    fn default() -> Self {
        Self::Waiting {
            style_loaded: false,
            data_loaded: false,
        }
    }
}

impl Readiness {
    /// Records the style load. Returns true if this completes the readiness signals.
    pub(crate) fn style_loaded(&mut self) -> bool {
        match self {
            Readiness::Waiting { style_loaded, .. } => *style_loaded = true,
            _ => return false,
        }
        self.try_settle()
    }

    /// Records the data load. Returns true if this completes the readiness signals.
    pub(crate) fn data_loaded(&mut self) -> bool {
        match self {
            Readiness::Waiting { data_loaded, .. } => *data_loaded = true,
            _ => return false,
        }
        self.try_settle()
    }

    fn try_settle(&mut self) -> bool {
        if *self
            == (Readiness::Waiting {
                style_loaded: true,
                data_loaded: true,
            })
        {
            *self = Readiness::Settling;
            true
        } else {
            false
        }
    }
}

/// FIFO of deferred operations.
#[derive(Default)]
pub(crate) struct JobQueue {
    jobs: VecDeque<Job>,
}

impl Debug for JobQueue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("len", &self.jobs.len())
            .finish()
    }
}

impl JobQueue {
    pub fn push(&mut self, job: impl FnOnce(&mut MapEngine) + 'static) {
        self.jobs.push_back(Box::new(job));
    }

    pub fn pop(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
    }
}
