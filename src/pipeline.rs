//! Load once, then draw: fetch both documents, join, scale and build the
//! drawable scene. A failure anywhere leaves the map empty.

use crate::config::{ConfigError, MapConfig};
use crate::data::{self, DataSource, Datasets, FetchError, COUNTIES_OBJECT, STATES_OBJECT};
use crate::join::join;
use crate::legend::Legend;
use crate::map::renderer::MapScene;
use crate::scale::{greens, QuantizeScale};
use crate::topology::{interior_borders, mesh};
use glam::DVec2;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything drawn for one successful load
pub struct Choropleth {
    pub scene: MapScene,
    pub legend: Legend,
    pub scale: QuantizeScale,
}

pub enum LoadState {
    Idle,
    Loading,
    Rendered(Box<Choropleth>),
    Failed(String),
}

impl LoadState {
    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Idle => "idle",
            LoadState::Loading => "loading",
            LoadState::Rendered(_) => "rendered",
            LoadState::Failed(_) => "failed",
        }
    }
}

/// Join, scale and lay out the map. Pure: no I/O and no logging above debug.
pub fn build_scene(datasets: &Datasets, config: &MapConfig) -> Result<Choropleth, PipelineError> {
    let topology = &datasets.topology;
    let counties = topology
        .object(COUNTIES_OBJECT)
        .ok_or(FetchError::MissingObject { name: COUNTIES_OBJECT })?;
    let states = topology
        .object(STATES_OBJECT)
        .ok_or(FetchError::MissingObject { name: STATES_OBJECT })?;
    let palette = greens(config.legend.grades).ok_or(ConfigError::Grades {
        grades: config.legend.grades,
    })?;

    let scale = QuantizeScale::from_records(&datasets.education, palette);
    let features = join(topology, counties, &datasets.education);
    let borders = mesh(topology, states, Some(interior_borders));

    let surface = DVec2::new(config.plot.width, config.plot.height);
    let scene = MapScene::new(surface, features, borders, &scale);
    let legend = Legend::new(&scale, config);

    Ok(Choropleth { scene, legend, scale })
}

/// One map instance and its lifecycle
pub struct MapInstance {
    pub config: MapConfig,
    pub state: LoadState,
}

impl MapInstance {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            state: LoadState::Idle,
        }
    }

    /// Runs the whole pipeline once. Errors are logged here, exactly once,
    /// and never returned.
    pub async fn load<S: DataSource>(&mut self, source: &S) {
        self.state = LoadState::Loading;

        self.state = match run(source, &self.config).await {
            Ok(choropleth) => {
                info!(
                    "Rendered {} counties with {} legend swatches",
                    choropleth.scene.counties.len(),
                    choropleth.legend.swatches.len()
                );
                LoadState::Rendered(Box::new(choropleth))
            }
            Err(e) => {
                error!("rendering failed: {}", error_chain(&e));
                LoadState::Failed(e.to_string())
            }
        };
    }

    pub fn choropleth(&self) -> Option<&Choropleth> {
        match &self.state {
            LoadState::Rendered(c) => Some(&**c),
            _ => None,
        }
    }

    /// What a failed or pending load shows
    pub fn empty_scene(&self) -> MapScene {
        MapScene::empty(DVec2::new(self.config.plot.width, self.config.plot.height))
    }
}

async fn run<S: DataSource>(source: &S, config: &MapConfig) -> Result<Choropleth, PipelineError> {
    config.validate()?;
    let datasets = data::acquire(source, &config.sources).await?;
    build_scene(&datasets, config)
}

fn error_chain(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::MemorySource;
    use crate::interaction::{EventHandler, Interaction, MapEvent};
    use crate::map::renderer::MapRenderer;
    use crate::map::projection::ZoomTransform;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    struct ErrorCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for ErrorCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn test_two_counties_end_to_end() {
        let mut map = MapInstance::new(MapConfig::default());
        map.load(&MemorySource::two_counties()).await;

        let choropleth = map.choropleth().unwrap();
        let scene = &choropleth.scene;
        let palette = choropleth.scale.range();
        assert_eq!(scene.counties.len(), 2);
        assert_eq!(scene.counties[0].fill, Some(palette[0]));
        assert_eq!(scene.counties[1].fill, Some(palette[7]));
        assert_eq!(choropleth.legend.swatches.len(), 8);

        let mut interaction = Interaction::new(map.config.tooltip.offset);
        for (point, expected) in [((150.0, 150.0), "A, X: 10"), ((250.0, 150.0), "B, Y: 90")] {
            let p = DVec2::new(point.0, point.1);
            let hit = scene.shape_at(p);
            for event in interaction.hover_events(hit, p.x, p.y) {
                interaction.handle(scene, &event);
            }
            assert_eq!(interaction.tooltip.text, expected);
            assert!(!interaction.tooltip.hidden);
        }

        for event in interaction.hover_events(None, 900.0, 500.0) {
            interaction.handle(scene, &event);
        }
        assert!(interaction.tooltip.hidden);
        interaction.handle(scene, &MapEvent::TransformChanged(ZoomTransform { k: 2.0, x: 0.0, y: 0.0 }));
        assert_eq!(interaction.stroke_width, 0.5);
    }

    #[tokio::test]
    async fn test_failed_fetch_draws_nothing_and_logs_once() {
        let errors = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ErrorCounter(errors.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut map = MapInstance::new(MapConfig::default());
        let mut source = MemorySource::two_counties();
        source.0.remove(&map.config.sources.education);
        map.load(&source).await;

        assert!(matches!(map.state, LoadState::Failed(_)));
        assert!(map.choropleth().is_none());
        assert_eq!(errors.load(Ordering::SeqCst), 1);

        let scene = map.empty_scene();
        let layers = MapRenderer::render(&scene, &ZoomTransform::IDENTITY, 50, 15);
        assert!(layers.fills.iter().all(Option::is_none));
        assert_eq!(layers.borders.glyphs().count(), 0);
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let mut map = MapInstance::new(MapConfig::default());
        assert_eq!(map.state.label(), "idle");
        map.load(&MemorySource::two_counties()).await;
        assert_eq!(map.state.label(), "rendered");
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_fetching() {
        let mut config = MapConfig::default();
        config.zoom.min = 12.0;
        config.zoom.max = 2.0;
        let mut map = MapInstance::new(config);
        map.load(&MemorySource::two_counties()).await;

        assert!(map.choropleth().is_none());
        match &map.state {
            LoadState::Failed(reason) => assert!(reason.starts_with("zoom extent [12, 2]")),
            other => panic!("expected failure, got {}", other.label()),
        }
    }

    #[test]
    fn test_build_scene_rejects_unknown_palette() {
        let mut config = MapConfig::default();
        config.legend.grades = 12;
        let topology = crate::topology::tests::parse(crate::topology::tests::TWO_SQUARES);
        let datasets = Datasets {
            topology,
            education: Vec::new(),
        };
        assert!(matches!(
            build_scene(&datasets, &config),
            Err(PipelineError::Config(ConfigError::Grades { grades: 12 }))
        ));
    }
}
