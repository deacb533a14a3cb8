//! Event loop binding one layout scheduler and one carousel to real timers.
//!
//! - Collaborators send `GalleryEvent`s through a `GalleryHandle` (flume channel)
//! - The loop sleeps until the earliest scheduler/carousel deadline
//! - Layout passes, active-index changes and scroll requests come out as `GalleryOutput`s
//!
//! Everything runs on the task that awaits [`Gallery::run`]; the state machines
//! are not `Send` and need no locking.

use std::time::Instant;

use flume::{Receiver, Sender};
use tracing::{debug, info, trace};

use crate::carousel::{
    ActiveChange, CarouselKey, CarouselSync, ScrollGeometry, ScrollRequest,
};
use crate::config::GalleryConfig;
use crate::layout::{LayoutConfig, LayoutMode};
use crate::models::{GalleryItem, ItemId};
use crate::scheduler::{LayoutPass, LayoutScheduler};

/// Input to the gallery loop.
#[derive(Debug, Clone)]
pub enum GalleryEvent {
    ContainerResized(f32),
    ItemsReplaced(Vec<GalleryItem>),
    ItemInserted { index: usize, item: GalleryItem },
    ItemRemoved(ItemId),
    ItemMoved { from: usize, to: usize },
    DimensionsResolved { id: ItemId, width: f32, height: f32 },
    DimensionsFailed(ItemId),
    ModeChanged(LayoutMode),
    GapChanged(f32),
    /// User scrolled the carousel track.
    Scrolled(ScrollGeometry),
    /// Track geometry changed without user scrolling (e.g. after a relayout).
    TrackGeometry(ScrollGeometry),
    Key(CarouselKey),
    Next,
    Previous,
    GoTo(i64),
    Play,
    Pause,
    Hover(bool),
    Shutdown,
}

/// Output of the gallery loop, consumed by the renderer.
#[derive(Debug, Clone)]
pub enum GalleryOutput {
    Layout(LayoutPass),
    ActiveChanged(ActiveChange),
    ScrollTo(ScrollRequest),
}

/// Cloneable sender side of a gallery.
#[derive(Debug, Clone)]
pub struct GalleryHandle {
    tx: Sender<GalleryEvent>,
}

impl GalleryHandle {
    /// Returns false once the gallery loop has stopped.
    pub fn send(&self, event: GalleryEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn resize(&self, width: f32) -> bool {
        self.send(GalleryEvent::ContainerResized(width))
    }

    pub fn replace_items(&self, items: Vec<GalleryItem>) -> bool {
        self.send(GalleryEvent::ItemsReplaced(items))
    }

    pub fn next(&self) -> bool {
        self.send(GalleryEvent::Next)
    }

    pub fn previous(&self) -> bool {
        self.send(GalleryEvent::Previous)
    }

    pub fn go_to(&self, index: i64) -> bool {
        self.send(GalleryEvent::GoTo(index))
    }

    pub fn play(&self) -> bool {
        self.send(GalleryEvent::Play)
    }

    pub fn pause(&self) -> bool {
        self.send(GalleryEvent::Pause)
    }

    pub fn shutdown(&self) -> bool {
        self.send(GalleryEvent::Shutdown)
    }
}

/// One gallery instance: layout scheduling plus carousel state.
pub struct Gallery {
    scheduler: LayoutScheduler,
    carousel: CarouselSync,
    events: Receiver<GalleryEvent>,
}

impl std::fmt::Debug for Gallery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gallery")
            .field("scheduler", &self.scheduler)
            .field("carousel", &self.carousel)
            .finish()
    }
}

impl Gallery {
    /// Build a gallery, its input handle and its output stream.
    pub fn new(config: &GalleryConfig) -> (Self, GalleryHandle, Receiver<GalleryOutput>) {
        let (event_tx, event_rx) = flume::unbounded();
        let (output_tx, output_rx) = flume::unbounded();

        let layout = LayoutConfig {
            container_width: 0.0,
            gap_px: config.layout.gap_px,
            mode: config.layout.mode,
        };
        let mut scheduler = LayoutScheduler::new(config.scheduler, layout);
        let mut carousel = CarouselSync::new(config.carousel);

        let tx = output_tx.clone();
        scheduler.connect_layout(move |pass| {
            let _ = tx.send(GalleryOutput::Layout(pass.clone()));
        });
        let tx = output_tx.clone();
        carousel.connect_active_changed(move |change| {
            let _ = tx.send(GalleryOutput::ActiveChanged(*change));
        });
        carousel.connect_scroll_request(move |request| {
            let _ = output_tx.send(GalleryOutput::ScrollTo(*request));
        });

        let gallery = Self {
            scheduler,
            carousel,
            events: event_rx,
        };
        (gallery, GalleryHandle { tx: event_tx }, output_rx)
    }

    fn next_deadline(&self) -> Option<Instant> {
        match (self.scheduler.next_deadline(), self.carousel.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run until `Shutdown` arrives or every handle is dropped.
    pub async fn run(mut self) {
        debug!("Gallery loop started");
        loop {
            let received = match self.next_deadline() {
                Some(deadline) => {
                    tokio::select! {
                        event = self.events.recv_async() => Some(event),
                        _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => None,
                    }
                }
                None => Some(self.events.recv_async().await),
            };

            let now = tokio::time::Instant::now().into_std();
            match received {
                Some(Ok(GalleryEvent::Shutdown)) | Some(Err(_)) => break,
                Some(Ok(event)) => self.apply(event, now),
                None => trace!("Gallery timer fired"),
            }

            self.scheduler.poll(now);
            self.carousel.poll(now);
        }

        self.teardown();
        info!("Gallery loop stopped");
    }

    fn apply(&mut self, event: GalleryEvent, now: Instant) {
        trace!(?event, "Gallery event");
        match event {
            GalleryEvent::ContainerResized(width) => {
                self.scheduler.set_container_width(width, now);
            }
            GalleryEvent::ItemsReplaced(items) => {
                self.scheduler.replace_items(items, now);
                self.sync_carousel_items(now);
            }
            GalleryEvent::ItemInserted { index, item } => {
                self.scheduler.insert_item(index, item, now);
                self.sync_carousel_items(now);
            }
            GalleryEvent::ItemRemoved(id) => {
                if self.scheduler.remove_item(id, now).is_some() {
                    self.sync_carousel_items(now);
                }
            }
            GalleryEvent::ItemMoved { from, to } => {
                if self.scheduler.move_item(from, to, now) {
                    self.sync_carousel_items(now);
                }
            }
            GalleryEvent::DimensionsResolved { id, width, height } => {
                self.scheduler.resolve_dimensions(id, width, height, now);
            }
            GalleryEvent::DimensionsFailed(id) => {
                self.scheduler.mark_failed(id, now);
            }
            GalleryEvent::ModeChanged(mode) => self.scheduler.set_mode(mode, now),
            GalleryEvent::GapChanged(gap) => self.scheduler.set_gap(gap, now),
            GalleryEvent::Scrolled(geometry) => self.carousel.on_scroll(geometry, now),
            GalleryEvent::TrackGeometry(geometry) => self.carousel.set_geometry(geometry),
            GalleryEvent::Key(key) => {
                self.carousel.handle_key(key, now);
            }
            GalleryEvent::Next => self.carousel.next(now),
            GalleryEvent::Previous => self.carousel.previous(now),
            GalleryEvent::GoTo(index) => self.carousel.go_to(index, now),
            GalleryEvent::Play => self.carousel.play(now),
            GalleryEvent::Pause => self.carousel.pause(),
            GalleryEvent::Hover(hovered) => self.carousel.set_hovered(hovered, now),
            GalleryEvent::Shutdown => {}
        }
    }

    fn sync_carousel_items(&mut self, now: Instant) {
        let ids = self.scheduler.index().ids();
        self.carousel.set_items(ids, now);
    }

    fn teardown(&mut self) {
        self.scheduler.cancel();
        self.carousel.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carousel::{CarouselConfig, ChangeSource};
    use crate::layout::LayoutResult;
    use crate::scheduler::SchedulerConfig;
    use std::time::Duration;

    fn make_items(count: u64) -> Vec<GalleryItem> {
        (0..count)
            .map(|i| GalleryItem::new(ItemId(i), 1600.0, 900.0))
            .collect()
    }

    fn test_config() -> GalleryConfig {
        GalleryConfig {
            scheduler: SchedulerConfig {
                debounce: Duration::from_millis(16),
                load_timeout: Duration::from_millis(500),
            },
            ..Default::default()
        }
    }

    async fn next_layout(outputs: &Receiver<GalleryOutput>) -> LayoutPass {
        loop {
            match outputs.recv_async().await.expect("gallery still running") {
                GalleryOutput::Layout(pass) => return pass,
                _ => continue,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_burst_publishes_one_pass() {
        let (gallery, handle, outputs) = Gallery::new(&test_config());

        let driver = async {
            let start = tokio::time::Instant::now();
            handle.replace_items(make_items(5));
            handle.resize(600.0);
            handle.resize(1000.0);

            let pass = next_layout(&outputs).await;
            assert_eq!(pass.generation, 1);
            assert_eq!(pass.container_width, 1000.0);
            assert_eq!(pass.layout.item_count(), 5);
            assert!(start.elapsed() >= Duration::from_millis(16));

            handle.shutdown();
        };

        tokio::join!(gallery.run(), driver);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_dimensions_gate_first_pass() {
        let (gallery, handle, outputs) = Gallery::new(&test_config());

        let driver = async {
            handle.resize(800.0);
            handle.replace_items(vec![
                GalleryItem::pending(ItemId(1)),
                GalleryItem::pending(ItemId(2)),
            ]);
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert!(outputs
                .try_iter()
                .all(|out| !matches!(out, GalleryOutput::Layout(_))));

            handle.send(GalleryEvent::DimensionsResolved {
                id: ItemId(1),
                width: 400.0,
                height: 300.0,
            });
            handle.send(GalleryEvent::DimensionsFailed(ItemId(2)));

            let pass = next_layout(&outputs).await;
            assert_eq!(pass.pending_items, 0);
            assert_eq!(pass.layout.item_count(), 2);

            handle.shutdown();
        };

        tokio::join!(gallery.run(), driver);
    }

    #[tokio::test(start_paused = true)]
    async fn test_autoplay_cycles_through_items() {
        let config = GalleryConfig {
            carousel: CarouselConfig {
                autoplay: true,
                autoplay_interval: Duration::from_millis(1000),
                ..Default::default()
            },
            ..test_config()
        };
        let (gallery, handle, outputs) = Gallery::new(&config);

        let driver = async {
            let start = tokio::time::Instant::now();
            handle.replace_items(make_items(4));

            let mut autoplay_indices = Vec::new();
            while autoplay_indices.len() < 4 {
                if let GalleryOutput::ActiveChanged(change) = outputs.recv_async().await.unwrap() {
                    if change.source == ChangeSource::Autoplay {
                        autoplay_indices.push(change.active_index.unwrap());
                    }
                }
            }
            assert_eq!(autoplay_indices, vec![1, 2, 3, 0]);
            assert!(start.elapsed() >= Duration::from_millis(4000));

            handle.shutdown();
        };

        tokio::join!(gallery.run(), driver);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_timers_and_closes_outputs() {
        let config = GalleryConfig {
            carousel: CarouselConfig {
                autoplay: true,
                autoplay_interval: Duration::from_millis(50),
                ..Default::default()
            },
            ..test_config()
        };
        let (gallery, handle, outputs) = Gallery::new(&config);

        handle.replace_items(make_items(3));
        handle.shutdown();
        gallery.run().await;

        // The gallery (and every output sender) is gone; nothing else arrives.
        let remaining: Vec<GalleryOutput> = outputs.drain().collect();
        assert!(remaining
            .iter()
            .all(|out| !matches!(out, GalleryOutput::ActiveChanged(c) if c.source == ChangeSource::Autoplay)));
        assert!(outputs.recv_async().await.is_err());
        assert!(!handle.next());
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_emits_change_and_scroll() {
        let (gallery, handle, outputs) = Gallery::new(&test_config());

        let driver = async {
            handle.replace_items(make_items(3));
            handle.send(GalleryEvent::TrackGeometry(ScrollGeometry {
                scroll_left: 0.0,
                viewport_width: 500.0,
                items: (0..3)
                    .map(|i| crate::carousel::ItemExtent {
                        left: i as f32 * 500.0,
                        width: 500.0,
                    })
                    .collect(),
            }));
            handle.go_to(2);

            let mut saw_change = false;
            let mut scroll_left = None;
            while !(saw_change && scroll_left.is_some()) {
                match outputs.recv_async().await.unwrap() {
                    GalleryOutput::ActiveChanged(change)
                        if change.source == ChangeSource::Navigation =>
                    {
                        assert_eq!(change.item, Some(ItemId(2)));
                        saw_change = true;
                    }
                    GalleryOutput::ScrollTo(request) => scroll_left = Some(request.left),
                    _ => {}
                }
            }
            assert_eq!(scroll_left, Some(1000.0));

            handle.send(GalleryEvent::ModeChanged(LayoutMode::Masonry {
                columns: crate::layout::ColumnCount::Fixed(2),
            }));
            handle.resize(400.0);
            let pass = next_layout(&outputs).await;
            assert!(matches!(pass.layout, LayoutResult::Masonry(_)));

            handle.shutdown();
        };

        tokio::join!(gallery.run(), driver);
    }
}
