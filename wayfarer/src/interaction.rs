//! Pointer interaction shared by views and overlays.
//!
//! Handlers do not touch the popup, the camera or the router themselves. They return a list of
//! [`Interaction`]s that the engine carries out, which keeps each handler a plain function of the
//! event and the current [`InteractionContext`].

use wayfarer_types::{LngLat, ScreenOffset, ScreenPoint};

use crate::error::MapError;
use crate::feature::PointFeature;
use crate::surface::{Cursor, EventKind, RenderedFeature};

/// Kind of the input device.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Mouse or trackpad. Hovering a point shows its popup and clicking navigates.
    #[default]
    Pointer,
    /// Touch screen. There is no hover, so tapping a point shows its popup.
    Touch,
}

/// Pointer event on one of the engine layers.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    /// Pointer entered a feature.
    Enter(RenderedFeature),
    /// Pointer left the layer.
    Leave,
    /// Click or tap.
    Click {
        /// Screen position of the click.
        point: ScreenPoint,
        /// Topmost feature under the pointer, if any.
        feature: Option<RenderedFeature>,
    },
}

impl LayerEvent {
    /// Kind of the subscription that delivers the event.
    pub fn kind(&self) -> EventKind {
        match self {
            LayerEvent::Enter(_) => EventKind::MouseEnter,
            LayerEvent::Leave => EventKind::MouseLeave,
            LayerEvent::Click { .. } => EventKind::Click,
        }
    }
}

/// State of the engine handlers may look at.
#[derive(Debug, Clone)]
pub(crate) struct InteractionContext {
    pub input: InputMode,
    /// The camera is moving, popups are not shown on hover.
    pub is_animating: bool,
    pub zoom: f64,
    /// Zoom at which the open popup was shown.
    pub popup_zoom: Option<f64>,
    pub zoom_tolerance: f64,
    pub language: String,
    pub fallback_language: String,
}

impl InteractionContext {
    fn popup_strayed(&self) -> bool {
        self.popup_zoom
            .is_some_and(|zoom| (self.zoom - zoom).abs() > self.zoom_tolerance)
    }
}

/// What the engine should show in a popup.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PopupRequest {
    pub anchor: LngLat,
    pub offset: ScreenOffset,
    pub title: String,
    pub color: String,
    /// Localized slug. `None` if the popup does not lead anywhere.
    pub slug: Option<String>,
}

impl PopupRequest {
    pub fn for_feature(
        feature: &PointFeature,
        offset: ScreenOffset,
        context: &InteractionContext,
    ) -> Result<Self, MapError> {
        let properties = &feature.properties;
        let title = properties.localized_title(&context.language, &context.fallback_language)?;
        let slug = if properties.slug.is_empty() {
            None
        } else {
            Some(properties.localized_slug(&context.language, &context.fallback_language)?)
        };

        Ok(Self {
            anchor: feature.position,
            offset,
            title,
            color: properties.color.clone(),
            slug,
        })
    }
}

/// Action requested by a handler.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Interaction {
    ShowPopup(PopupRequest),
    HidePopup,
    /// Navigate to the page of the location with the localized slug.
    Navigate(String),
    SetCursor(Cursor),
    ZoomIntoCluster {
        center: LngLat,
        zoom: f64,
    },
    Spiderfy {
        center: LngLat,
        leaves: Vec<PointFeature>,
    },
}

/// Pointer entered a point: pointer cursor and popup (pointer devices only).
pub(crate) fn point_hover(
    feature: &PointFeature,
    offset: ScreenOffset,
    context: &InteractionContext,
) -> Vec<Interaction> {
    if context.input == InputMode::Touch {
        return vec![];
    }

    let mut interactions = vec![Interaction::SetCursor(Cursor::Pointer)];
    if context.is_animating {
        return interactions;
    }

    match PopupRequest::for_feature(feature, offset, context) {
        Ok(request) => interactions.push(Interaction::ShowPopup(request)),
        Err(err) => log::debug!("No popup for {}: {err}", feature.id),
    }

    interactions
}

/// Pointer left a point layer: default cursor and hide the popup (pointer devices only).
pub(crate) fn point_leave(context: &InteractionContext) -> Vec<Interaction> {
    if context.input == InputMode::Touch {
        return vec![];
    }

    vec![
        Interaction::SetCursor(Cursor::Default),
        Interaction::HidePopup,
    ]
}

/// Click on a point: navigate on pointer devices, show the popup on touch devices.
pub(crate) fn point_click(
    feature: &PointFeature,
    offset: ScreenOffset,
    context: &InteractionContext,
) -> Vec<Interaction> {
    match PopupRequest::for_feature(feature, offset, context) {
        Ok(request) => match context.input {
            InputMode::Touch => vec![Interaction::ShowPopup(request)],
            InputMode::Pointer => request
                .slug
                .map(|slug| vec![Interaction::Navigate(slug)])
                .unwrap_or_default(),
        },
        Err(err) => {
            log::debug!("Ignoring click on {}: {err}", feature.id);
            vec![]
        }
    }
}

/// Zoom changed: hide the popup if the camera strayed from the zoom it was opened at.
pub(crate) fn zoom_changed(context: &InteractionContext) -> Vec<Interaction> {
    if context.popup_strayed() {
        vec![Interaction::HidePopup]
    } else {
        vec![]
    }
}

/// Standard trio of handlers of a point layer.
pub(crate) fn point_layer_event(event: &LayerEvent, context: &InteractionContext) -> Vec<Interaction> {
    match event {
        LayerEvent::Enter(RenderedFeature::Point(feature)) => {
            point_hover(feature, ScreenOffset::zeros(), context)
        }
        LayerEvent::Leave => point_leave(context),
        LayerEvent::Click {
            feature: Some(RenderedFeature::Point(feature)),
            ..
        } => point_click(feature, ScreenOffset::zeros(), context),
        _ => vec![],
    }
}
