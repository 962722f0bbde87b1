use web_time::Instant;

use super::MapEngine;
use crate::config::MapConfig;
use crate::error::MapError;
use crate::messenger::{DefaultLocalizer, DummyLocationSource, LocationSource, Localizer, Navigator};

/// Convenience type to initialize a [`MapEngine`].
///
/// ```no_run
/// use wayfarer::{MapConfig, MapEngine};
///
/// let engine = MapEngine::builder()
///     .with_config(MapConfig::default())
///     .with_navigator(|path: &str| println!("navigate to {path}"))
///     .build()
///     .expect("valid configuration");
/// ```
#[derive(Default)]
pub struct MapEngineBuilder {
    config: Option<MapConfig>,
    navigator: Option<Box<dyn Navigator>>,
    localizer: Option<Box<dyn Localizer>>,
    location_source: Option<Box<dyn LocationSource>>,
    start_time: Option<Instant>,
}

impl MapEngineBuilder {
    /// Sets the configuration. Defaults to [`MapConfig::default`].
    pub fn with_config(mut self, config: MapConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the page router. Without it navigation requests are only logged.
    pub fn with_navigator(mut self, navigator: impl Navigator + 'static) -> Self {
        self.navigator = Some(Box::new(navigator));
        self
    }

    /// Sets the translation helper. Defaults to [`DefaultLocalizer`].
    pub fn with_localizer(mut self, localizer: impl Localizer + 'static) -> Self {
        self.localizer = Some(Box::new(localizer));
        self
    }

    /// Sets the data layer that fetches the locations. Defaults to [`DummyLocationSource`].
    pub fn with_location_source(mut self, source: impl LocationSource + 'static) -> Self {
        self.location_source = Some(Box::new(source));
        self
    }

    /// Sets the time the engine clock starts at. Defaults to now.
    pub fn with_start_time(mut self, now: Instant) -> Self {
        self.start_time = Some(now);
        self
    }

    /// Consumes the builder and creates the engine.
    ///
    /// Fails if the configuration is invalid.
    pub fn build(self) -> Result<MapEngine, MapError> {
        let MapEngineBuilder {
            config,
            navigator,
            localizer,
            location_source,
            start_time,
        } = self;

        let config = config.unwrap_or_default();
        config.validate()?;

        Ok(MapEngine::new(
            config,
            navigator.unwrap_or_else(|| {
                Box::new(|path: &str| log::info!("No navigator set, ignoring navigation to {path}"))
            }),
            localizer.unwrap_or_else(|| Box::new(DefaultLocalizer)),
            location_source.unwrap_or_else(|| Box::new(DummyLocationSource)),
            start_time.unwrap_or_else(Instant::now),
        ))
    }
}
