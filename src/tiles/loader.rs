//! Tile asset requests and the queue their resolutions travel back on.
//!
//! Fetchers may finish on any thread and in any order. They never touch the
//! layer directly: each resolution is sent over a channel and applied by
//! [`crate::GridLayer::process_resolutions`] on the layer's own thread, which
//! keeps every tile-set mutation serialized.

use crate::tiles::key::{TileCoordinate, TileKey};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;

#[cfg(feature = "tokio-runtime")]
use crate::{prelude::HashMap, traits::TileFetcher, Result};

#[cfg(feature = "http")]
use once_cell::sync::Lazy;

/// Raw bytes of a loaded tile asset.
pub type TileData = Arc<Vec<u8>>;

/// Identifies one request; a re-added tile gets a fresh ticket so late
/// answers for the old request can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTicket(pub u64);

/// What the layer asks a fetcher for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    pub key: TileKey,
    pub coord: TileCoordinate,
    pub ticket: RequestTicket,
}

/// How a tile asset request ended.
#[derive(Debug, Clone)]
pub enum TileOutcome {
    /// Asset is ready; `None` when the visual loaded it by itself.
    Loaded(Option<TileData>),
    Failed(String),
}

impl TileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TileOutcome::Loaded(_))
    }
}

/// A finished request on its way back to the layer.
#[derive(Debug, Clone)]
pub struct TileResolution {
    pub key: TileKey,
    /// `None` skips the ticket check and resolves whatever is tracked under `key`.
    pub ticket: Option<RequestTicket>,
    pub outcome: TileOutcome,
}

impl TileResolution {
    pub fn for_request(request: &TileRequest, outcome: TileOutcome) -> Self {
        Self {
            key: request.key,
            ticket: Some(request.ticket),
            outcome,
        }
    }
}

/// Cloneable handle fetchers use to report resolutions.
#[derive(Debug, Clone)]
pub struct ResolutionSender {
    sender: Sender<TileResolution>,
}

impl ResolutionSender {
    pub fn send(&self, resolution: TileResolution) {
        if self.sender.send(resolution).is_err() {
            log::trace!("Dropping tile resolution: layer is gone");
        }
    }

    pub fn loaded(&self, request: &TileRequest, data: Option<TileData>) {
        self.send(TileResolution::for_request(request, TileOutcome::Loaded(data)));
    }

    pub fn failed(&self, request: &TileRequest, error: impl Into<String>) {
        self.send(TileResolution::for_request(request, TileOutcome::Failed(error.into())));
    }
}

/// Receiving end, owned by the layer.
#[derive(Debug)]
pub(crate) struct ResolutionQueue {
    sender: Sender<TileResolution>,
    receiver: Receiver<TileResolution>,
}

impl ResolutionQueue {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub(crate) fn sender(&self) -> ResolutionSender {
        ResolutionSender {
            sender: self.sender.clone(),
        }
    }

    pub(crate) fn drain(&self) -> Vec<TileResolution> {
        self.receiver.try_iter().collect()
    }
}

/// Loads the bytes of one tile.
#[cfg(feature = "tokio-runtime")]
#[async_trait::async_trait]
pub trait TileLoader: Send + Sync + 'static {
    async fn load(&self, coord: TileCoordinate) -> Result<TileData>;
}

/// Runs a [`TileLoader`] on tokio, one task per requested tile.
///
/// Releasing a tile aborts its task, so evicted tiles stop using bandwidth.
#[cfg(feature = "tokio-runtime")]
pub struct AsyncTileFetcher<L> {
    loader: Arc<L>,
    runtime: tokio::runtime::Handle,
    sender: ResolutionSender,
    in_flight: HashMap<TileKey, tokio::task::JoinHandle<()>>,
}

#[cfg(feature = "tokio-runtime")]
impl<L: TileLoader> AsyncTileFetcher<L> {
    pub fn new(loader: L, runtime: tokio::runtime::Handle, sender: ResolutionSender) -> Self {
        Self {
            loader: Arc::new(loader),
            runtime,
            sender,
            in_flight: HashMap::default(),
        }
    }

    /// Tasks spawned and not yet finished or aborted.
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }
}

#[cfg(feature = "tokio-runtime")]
impl<L: TileLoader, V> TileFetcher<V> for AsyncTileFetcher<L> {
    fn request(&mut self, request: &TileRequest, _visual: &V) {
        self.in_flight.retain(|_, task| !task.is_finished());

        let loader = Arc::clone(&self.loader);
        let sender = self.sender.clone();
        let request_copy = request.clone();

        let task = self.runtime.spawn(async move {
            match loader.load(request_copy.coord).await {
                Ok(data) => sender.loaded(&request_copy, Some(data)),
                Err(e) => sender.failed(&request_copy, e.to_string()),
            }
        });

        if let Some(previous) = self.in_flight.insert(request.key, task) {
            previous.abort();
        }
    }

    fn release(&mut self, key: &TileKey, _visual: &V) {
        if let Some(task) = self.in_flight.remove(key) {
            task.abort();
        }
    }
}

#[cfg(feature = "tokio-runtime")]
impl<L> Drop for AsyncTileFetcher<L> {
    fn drop(&mut self) {
        for (_, task) in self.in_flight.drain() {
            task.abort();
        }
    }
}

/// Shared async HTTP client for tile fetching
#[cfg(feature = "http")]
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent("tilegrid/0.1.0")
        .timeout(std::time::Duration::from_secs(30))
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .pool_max_idle_per_host(16)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
});

/// Fetches tile bytes over HTTP; the host decides the URL for each tile.
#[cfg(feature = "http")]
pub struct HttpTileLoader {
    url_for: Box<dyn Fn(&TileCoordinate) -> String + Send + Sync>,
}

#[cfg(feature = "http")]
impl HttpTileLoader {
    pub fn new<F>(url_for: F) -> Self
    where
        F: Fn(&TileCoordinate) -> String + Send + Sync + 'static,
    {
        Self {
            url_for: Box::new(url_for),
        }
    }
}

#[cfg(feature = "http")]
#[async_trait::async_trait]
impl TileLoader for HttpTileLoader {
    async fn load(&self, coord: TileCoordinate) -> Result<TileData> {
        let url = (self.url_for)(&coord);
        let response = HTTP_CLIENT.get(&url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(Arc::new(bytes.to_vec()))
    }
}
