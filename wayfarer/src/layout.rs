//! Responsive viewport geometry.
//!
//! The map sits under page chrome: a header, floating controls and, when open, a side drawer
//! (a bottom sheet on phones). When the camera is fitted to bounds or panned to a point, the
//! target must land in the part of the viewport that is not covered. The paddings below were
//! tuned by hand for every breakpoint of the page layout.

use wayfarer_types::{Padding, ScreenOffset};

/// Layout breakpoint of the page.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Breakpoint {
    /// Narrower than 640 px.
    Mobile,
    /// 640 px to 1023 px.
    Tablet,
    /// 1024 px to 1279 px.
    TabletWide,
    /// 1280 px to 1599 px.
    Desktop,
    /// 1600 px and wider.
    WideDesktop,
}

impl Breakpoint {
    /// Breakpoint of a viewport of the given width.
    pub fn from_width(width: f64) -> Self {
        if width < 640.0 {
            Breakpoint::Mobile
        } else if width < 1024.0 {
            Breakpoint::Tablet
        } else if width < 1280.0 {
            Breakpoint::TabletWide
        } else if width < 1600.0 {
            Breakpoint::Desktop
        } else {
            Breakpoint::WideDesktop
        }
    }

    /// Size of the area the open drawer covers. On phones the drawer is a bottom sheet and this
    /// is its height, otherwise it is the drawer width on the left side.
    pub fn drawer_extent(&self) -> f64 {
        match self {
            Breakpoint::Mobile => 320.0,
            Breakpoint::Tablet => 360.0,
            Breakpoint::TabletWide => 400.0,
            Breakpoint::Desktop => 440.0,
            Breakpoint::WideDesktop => 480.0,
        }
    }

    /// Padding used to fit the camera to bounds.
    pub fn padding(&self, drawer_open: bool) -> Padding {
        let base = match self {
            Breakpoint::Mobile => Padding::new(80.0, 24.0, 48.0, 24.0),
            Breakpoint::Tablet => Padding::new(96.0, 40.0, 56.0, 40.0),
            Breakpoint::TabletWide => Padding::new(104.0, 56.0, 64.0, 56.0),
            Breakpoint::Desktop => Padding::new(112.0, 72.0, 72.0, 72.0),
            Breakpoint::WideDesktop => Padding::new(120.0, 96.0, 80.0, 96.0),
        };

        if !drawer_open {
            return base;
        }

        match self {
            Breakpoint::Mobile => Padding {
                bottom: base.bottom + self.drawer_extent(),
                ..base
            },
            _ => Padding {
                left: base.left + self.drawer_extent(),
                ..base
            },
        }
    }

    /// Camera offset that moves a panned-to point into the center of the uncovered area.
    pub fn pan_offset(&self, drawer_open: bool) -> ScreenOffset {
        self.padding(drawer_open).center_offset()
    }
}
