//! Loading the two input documents: the county topology and the education
//! statistics. Both are fetched concurrently and parsed with simd-json.

use crate::config::SourceConfig;
use crate::topology::Topology;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

pub const COUNTIES_OBJECT: &str = "counties";
pub const STATES_OBJECT: &str = "states";

/// One row of the education dataset
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatisticRecord {
    #[serde(rename = "fips")]
    pub id: i64,
    pub area_name: String,
    #[serde(rename = "state")]
    pub state_name: String,
    #[serde(rename = "bachelorsOrHigher")]
    pub percentage: f64,
}

/// Both documents, parsed
#[derive(Debug, Clone)]
pub struct Datasets {
    pub topology: Topology,
    pub education: Vec<StatisticRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {location} failed")]
    Transport {
        location: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{location} answered with HTTP {status}")]
    Status { location: String, status: u16 },
    #[error("failed to read {location}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{location} is not a valid document")]
    Parse {
        location: String,
        #[source]
        source: simd_json::Error,
    },
    #[error("topology has no `{name}` object")]
    MissingObject { name: &'static str },
}

/// Anything that can produce the raw bytes behind a location
pub trait DataSource {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(connect_timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().map_err(|source| FetchError::Transport {
            location: "client".to_string(),
            source,
        })?;
        Ok(Self { client })
    }
}

impl DataSource for HttpSource {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let transport = |source| FetchError::Transport {
            location: location.to_string(),
            source,
        };

        let resp = self.client.get(location).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }
}

/// Reads documents saved on disk, for offline use
pub struct FileSource;

impl DataSource for FileSource {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let path = PathBuf::from(location);
        tokio::fs::read(&path).await.map_err(|source| FetchError::Io {
            location: location.to_string(),
            source,
        })
    }
}

/// Routes `http://` and `https://` locations to HTTP, everything else to disk
pub struct DefaultSource {
    http: HttpSource,
}

impl DefaultSource {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let timeout = config.connect_timeout_secs.map(Duration::from_secs);
        Ok(Self {
            http: HttpSource::new(timeout)?,
        })
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

impl DataSource for DefaultSource {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        if is_remote(location) {
            self.http.fetch(location).await
        } else {
            FileSource.fetch(location).await
        }
    }
}

fn parse<T: DeserializeOwned>(location: &str, mut bytes: Vec<u8>) -> Result<T, FetchError> {
    simd_json::serde::from_slice(&mut bytes).map_err(|source| FetchError::Parse {
        location: location.to_string(),
        source,
    })
}

/// Fetch and parse both documents. Either failure fails the whole load;
/// nothing is retried.
pub async fn acquire<S: DataSource>(source: &S, config: &SourceConfig) -> Result<Datasets, FetchError> {
    info!("Fetching {} and {}", config.topology, config.education);

    let (topology_bytes, education_bytes) = tokio::try_join!(
        source.fetch(&config.topology),
        source.fetch(&config.education)
    )?;
    debug!(
        "Received {} topology bytes, {} education bytes",
        topology_bytes.len(),
        education_bytes.len()
    );

    let topology: Topology = parse(&config.topology, topology_bytes)?;
    for name in [COUNTIES_OBJECT, STATES_OBJECT] {
        if topology.object(name).is_none() {
            return Err(FetchError::MissingObject { name });
        }
    }
    let education: Vec<StatisticRecord> = parse(&config.education, education_bytes)?;

    info!(
        "Loaded {} topology arcs and {} education records",
        topology.arcs.len(),
        education.len()
    );

    Ok(Datasets { topology, education })
}
