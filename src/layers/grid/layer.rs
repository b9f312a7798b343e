use crate::{
    core::{config::GridLayerOptions, scheduler::UpdateScheduler},
    layers::grid::{
        buffer::ZoomTransitionBuffer,
        events::{GridEvent, GridEventKind, GridEvents},
    },
    tiles::{
        loader::{RequestTicket, ResolutionQueue, ResolutionSender},
        planner::{TilePlanner, TileValidator},
        set::TileSet,
    },
    traits::{TileFetcher, TileRenderer},
    Result,
};
use crossbeam_channel::Receiver;

/// A layer of square tiles laid out on the map's pixel grid
///
/// The layer tracks which tiles the viewport needs, asks the renderer for a
/// visual per tile and the fetcher for its asset, and evicts tiles again as
/// the map moves. Everything runs on the caller's thread; asset results come
/// back through [`GridLayer::resolve_tile`] or the queue behind
/// [`GridLayer::resolution_sender`].
pub struct GridLayer<R: TileRenderer, F> {
    pub(super) options: GridLayerOptions,
    pub(super) renderer: R,
    pub(super) fetcher: F,
    pub(super) tiles: TileSet<R::Visual>,
    pub(super) planner: TilePlanner,
    pub(super) validator: TileValidator,
    /// Outer layer container, created on first add
    pub(super) container: Option<R::Container>,
    /// Front/back tile containers when zoom animation is on
    pub(super) buffer: Option<ZoomTransitionBuffer<R::Container>>,
    /// Present when updating on every move
    pub(super) scheduler: Option<UpdateScheduler>,
    pub(super) events: GridEvents,
    /// Requested tiles not yet loaded or errored
    pub(super) pending: usize,
    pub(super) attached: bool,
    pub(super) next_ticket: u64,
    pub(super) resolutions: ResolutionQueue,
    /// Zoom the tracked tiles were planned at
    pub(super) tile_zoom: Option<u8>,
}

impl<R, F> GridLayer<R, F>
where
    R: TileRenderer,
    F: TileFetcher<R::Visual>,
{
    pub fn new(options: GridLayerOptions, renderer: R, fetcher: F) -> Result<Self> {
        Self::with_fetcher(options, renderer, |_| fetcher)
    }

    /// Build the fetcher from the layer's resolution sender, for fetchers that
    /// report back asynchronously.
    pub fn with_fetcher<B>(options: GridLayerOptions, renderer: R, build: B) -> Result<Self>
    where
        B: FnOnce(ResolutionSender) -> F,
    {
        options.validate()?;

        let resolutions = ResolutionQueue::new();
        let fetcher = build(resolutions.sender());

        Ok(Self {
            planner: TilePlanner::new(options.tile_size),
            validator: TileValidator::from_options(&options),
            options,
            renderer,
            fetcher,
            tiles: TileSet::new(),
            container: None,
            buffer: None,
            scheduler: None,
            events: GridEvents::new(),
            pending: 0,
            attached: false,
            next_ticket: 0,
            resolutions,
            tile_zoom: None,
        })
    }

    pub fn options(&self) -> &GridLayerOptions {
        &self.options
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    pub fn tiles(&self) -> &TileSet<R::Visual> {
        &self.tiles
    }

    pub fn events_mut(&mut self) -> &mut GridEvents {
        &mut self.events
    }

    /// Register a listener for one kind of event
    pub fn on<C>(&mut self, kind: GridEventKind, callback: C)
    where
        C: Fn(&GridEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, callback);
    }

    pub fn subscribe(&mut self) -> Receiver<GridEvent> {
        self.events.subscribe()
    }

    /// Handle for reporting asset results from any thread.
    pub fn resolution_sender(&self) -> ResolutionSender {
        self.resolutions.sender()
    }

    pub fn pending_count(&self) -> usize {
        self.pending
    }

    /// Resolved share of the tracked tiles.
    pub fn loaded_share(&self) -> f64 {
        self.tiles.loaded_share()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn tile_zoom(&self) -> Option<u8> {
        self.tile_zoom
    }

    pub fn container(&self) -> Option<&R::Container> {
        self.container.as_ref()
    }

    /// Container new tiles go into.
    pub fn front_container(&self) -> Option<&R::Container> {
        match &self.buffer {
            Some(buffer) => Some(buffer.front()),
            None => self.container.as_ref(),
        }
    }

    pub fn buffer(&self) -> Option<&ZoomTransitionBuffer<R::Container>> {
        self.buffer.as_ref()
    }

    pub fn scheduler(&self) -> Option<&UpdateScheduler> {
        self.scheduler.as_ref()
    }

    pub(super) fn next_ticket(&mut self) -> RequestTicket {
        self.next_ticket += 1;
        RequestTicket(self.next_ticket)
    }
}
