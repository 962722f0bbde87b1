//! Callbacks into the page that hosts the map.

use maybe_sync::{MaybeSend, MaybeSync};

/// Page router. The engine calls it with a path when the user asks for the details of a
/// location.
pub trait Navigator: MaybeSend + MaybeSync {
    /// Navigates to the path.
    fn navigate(&self, path: &str);
}

impl<T: Fn(&str) + MaybeSend + MaybeSync> Navigator for T {
    fn navigate(&self, path: &str) {
        self(path)
    }
}

/// Display strings provided by the page translation helper.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    /// "View details" affordance of the popup.
    ViewDetails,
    /// Close affordance of the popup on touch devices.
    Close,
    /// Title of the popup over the user position.
    UserLocation,
}

/// Translation helper of the page.
pub trait Localizer: MaybeSend + MaybeSync {
    /// Active language code, e.g. `en`.
    fn language(&self) -> String;
    /// Display string for the label in the active language.
    fn label(&self, label: Label) -> String;
}

/// Data layer that fetches the base feature collection.
///
/// The request is fire-and-forget: the host delivers the result through
/// [`MapEngine::on_locations_loaded`](crate::MapEngine::on_locations_loaded).
pub trait LocationSource: MaybeSend + MaybeSync {
    /// Starts fetching the feature collection from `url`.
    fn request_locations(&mut self, url: &str);
}

/// Localizer with fixed English strings.
#[derive(Debug, Clone, Default)]
pub struct DefaultLocalizer;

impl Localizer for DefaultLocalizer {
    fn language(&self) -> String {
        "en".to_string()
    }

    fn label(&self, label: Label) -> String {
        match label {
            Label::ViewDetails => "View details",
            Label::Close => "Close",
            Label::UserLocation => "You are here",
        }
        .to_string()
    }
}

/// Location source that never requests anything. Useful when the host feeds the data through
/// [`MapEngine::on_locations_loaded`](crate::MapEngine::on_locations_loaded) on its own.
#[derive(Debug, Clone, Default)]
pub struct DummyLocationSource;

impl LocationSource for DummyLocationSource {
    fn request_locations(&mut self, _url: &str) {}
}
