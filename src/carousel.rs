//! Carousel synchronization.
//!
//! Keeps the single active index, the autoplay timer and the scroll position
//! consistent with each other:
//! - navigation calls (next/previous/go_to/keys) move the index and request a scroll
//! - scroll events settle into an index once scrolling goes quiet
//! - autoplay advances the index on a repeating deadline
//!
//! Like the layout scheduler, this is a clock-injected state machine; the
//! caller supplies `now` and calls [`CarouselSync::poll`] at
//! [`CarouselSync::next_deadline`].

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::models::ItemId;

const DEFAULT_AUTOPLAY_MS: u64 = 3_000;

/// Shorter autoplay intervals are raised to this.
pub const MIN_AUTOPLAY_INTERVAL: Duration = Duration::from_millis(1);

/// Scroll-end detection: no scroll events for this long.
const DEFAULT_SCROLL_QUIET_MS: u64 = 100;

/// A last item whose trailing edge is this close to the viewport's trailing
/// edge is treated as active.
pub const TRAILING_EDGE_TOLERANCE_PX: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarouselConfig {
    pub autoplay_interval: Duration,
    /// Start playing as soon as there are at least two items.
    pub autoplay: bool,
    /// Wrap around at the ends for next/previous and autoplay.
    pub loop_enabled: bool,
    pub pause_on_hover: bool,
    pub scroll_quiet: Duration,
    pub edge_tolerance_px: f32,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            autoplay_interval: Duration::from_millis(DEFAULT_AUTOPLAY_MS),
            autoplay: false,
            loop_enabled: true,
            pause_on_hover: true,
            scroll_quiet: Duration::from_millis(DEFAULT_SCROLL_QUIET_MS),
            edge_tolerance_px: TRAILING_EDGE_TOLERANCE_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselPhase {
    Idle,
    Active,
}

/// Keyboard navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselKey {
    Previous,
    Next,
    First,
    Last,
}

/// What moved the active index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    Navigation,
    Autoplay,
    Scroll,
    ItemsChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselState {
    /// `None` while the carousel is empty.
    pub active_index: Option<usize>,
    pub item_count: usize,
    pub is_playing: bool,
}

/// Emitted whenever the active index changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveChange {
    pub active_index: Option<usize>,
    pub item: Option<ItemId>,
    pub source: ChangeSource,
}

/// Horizontal extent of one item in scroll-content coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemExtent {
    pub left: f32,
    pub width: f32,
}

impl ItemExtent {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn center(&self) -> f32 {
        self.left + self.width / 2.0
    }
}

/// Snapshot of a horizontally scrolling carousel track.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScrollGeometry {
    pub scroll_left: f32,
    pub viewport_width: f32,
    pub items: Vec<ItemExtent>,
}

/// Ask the renderer to scroll the track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub left: f32,
    pub smooth: bool,
}

/// Index whose center is nearest the viewport center (lowest index on ties).
///
/// If the last item's trailing edge sits within `edge_tolerance` of the
/// viewport's trailing edge, the last index wins regardless of distance.
pub fn resolve_index_from_scroll(geometry: &ScrollGeometry, edge_tolerance: f32) -> Option<usize> {
    let last = geometry.items.len().checked_sub(1)?;
    let trailing = geometry.items[last].right() - geometry.scroll_left;
    if (trailing - geometry.viewport_width).abs() <= edge_tolerance {
        return Some(last);
    }

    let viewport_center = geometry.viewport_width / 2.0;
    let mut best_index = 0;
    let mut best_distance = f32::INFINITY;
    for (index, extent) in geometry.items.iter().enumerate() {
        let distance = (extent.center() - geometry.scroll_left - viewport_center).abs();
        if distance < best_distance {
            best_distance = distance;
            best_index = index;
        }
    }
    Some(best_index)
}

/// Scroll offset that aligns the item's leading edge with the viewport's.
pub fn scroll_target_for_index(geometry: &ScrollGeometry, index: usize) -> Option<f32> {
    let extent = geometry.items.get(index)?;
    let offset = extent.left - geometry.scroll_left;
    Some((geometry.scroll_left + offset).max(0.0))
}

/// Callback type for active index changes.
pub type ActiveChangedCallback = Box<dyn Fn(&ActiveChange)>;

/// Callback type for scroll requests.
pub type ScrollRequestCallback = Box<dyn Fn(&ScrollRequest)>;

pub struct CarouselSync {
    config: CarouselConfig,
    items: Vec<ItemId>,
    active_index: Option<usize>,
    is_playing: bool,
    hovered: bool,
    autoplay_deadline: Option<Instant>,
    scroll_quiet_deadline: Option<Instant>,
    geometry: Option<ScrollGeometry>,
    on_active_changed: Vec<ActiveChangedCallback>,
    on_scroll_request: Vec<ScrollRequestCallback>,
}

impl std::fmt::Debug for CarouselSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarouselSync")
            .field("state", &self.state())
            .field("hovered", &self.hovered)
            .field("autoplay_deadline", &self.autoplay_deadline)
            .field("scroll_quiet_deadline", &self.scroll_quiet_deadline)
            .finish()
    }
}

impl CarouselSync {
    pub fn new(mut config: CarouselConfig) -> Self {
        config.autoplay_interval = config.autoplay_interval.max(MIN_AUTOPLAY_INTERVAL);
        Self {
            is_playing: config.autoplay,
            config,
            items: Vec::new(),
            active_index: None,
            hovered: false,
            autoplay_deadline: None,
            scroll_quiet_deadline: None,
            geometry: None,
            on_active_changed: Vec::new(),
            on_scroll_request: Vec::new(),
        }
    }

    pub fn connect_active_changed<F>(&mut self, callback: F)
    where
        F: Fn(&ActiveChange) + 'static,
    {
        self.on_active_changed.push(Box::new(callback));
    }

    pub fn connect_scroll_request<F>(&mut self, callback: F)
    where
        F: Fn(&ScrollRequest) + 'static,
    {
        self.on_scroll_request.push(Box::new(callback));
    }

    pub fn state(&self) -> CarouselState {
        CarouselState {
            active_index: self.active_index,
            item_count: self.items.len(),
            is_playing: self.is_playing,
        }
    }

    pub fn phase(&self) -> CarouselPhase {
        if self.items.is_empty() {
            CarouselPhase::Idle
        } else {
            CarouselPhase::Active
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn active_item(&self) -> Option<ItemId> {
        self.active_index.and_then(|i| self.items.get(i).copied())
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Earliest pending timer (autoplay or scroll-end).
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.autoplay_deadline, self.scroll_quiet_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Replace the item list, clamping the active index into the new range.
    ///
    /// Listeners hear about it when either the index or the item under it changes.
    pub fn set_items(&mut self, items: Vec<ItemId>, now: Instant) {
        let previous = (self.active_index, self.active_item());
        self.items = items;
        let count = self.items.len();

        self.active_index = match (count, self.active_index) {
            (0, _) => None,
            (_, None) => Some(0),
            (n, Some(i)) => Some(i.min(n - 1)),
        };
        if (self.active_index, self.active_item()) != previous {
            self.emit_active_changed(ChangeSource::ItemsChanged);
        }
        if count == 0 {
            self.scroll_quiet_deadline = None;
            self.geometry = None;
        }
        self.refresh_autoplay(now);
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Step forward; wraps when looping, otherwise stops at the last item.
    pub fn next(&mut self, now: Instant) {
        let Some(current) = self.active_index else {
            return;
        };
        let count = self.items.len();
        let target = if self.config.loop_enabled {
            (current + 1) % count
        } else {
            (current + 1).min(count - 1)
        };
        self.navigate(target, now);
    }

    /// Step back; wraps when looping, otherwise stops at the first item.
    pub fn previous(&mut self, now: Instant) {
        let Some(current) = self.active_index else {
            return;
        };
        let count = self.items.len();
        let target = if self.config.loop_enabled {
            (current + count - 1) % count
        } else {
            current.saturating_sub(1)
        };
        self.navigate(target, now);
    }

    /// Jump directly to `index`, clamped into range.
    pub fn go_to(&mut self, index: i64, now: Instant) {
        let count = self.items.len();
        if count == 0 {
            return;
        }
        let target = index.clamp(0, count as i64 - 1) as usize;
        self.navigate(target, now);
    }

    pub fn first(&mut self, now: Instant) {
        self.go_to(0, now);
    }

    pub fn last(&mut self, now: Instant) {
        self.go_to(i64::MAX, now);
    }

    /// Returns true if the key was handled.
    pub fn handle_key(&mut self, key: CarouselKey, now: Instant) -> bool {
        if self.items.is_empty() {
            return false;
        }
        match key {
            CarouselKey::Previous => self.previous(now),
            CarouselKey::Next => self.next(now),
            CarouselKey::First => self.first(now),
            CarouselKey::Last => self.last(now),
        }
        true
    }

    fn navigate(&mut self, target: usize, now: Instant) {
        if Some(target) != self.active_index {
            self.active_index = Some(target);
            self.emit_active_changed(ChangeSource::Navigation);
        }
        self.request_scroll_to(target);
        // Manual navigation restarts the autoplay countdown.
        if self.autoplay_deadline.is_some() {
            self.autoplay_deadline = Some(now + self.config.autoplay_interval);
        }
    }

    // =========================================================================
    // Autoplay
    // =========================================================================

    pub fn play(&mut self, now: Instant) {
        self.is_playing = true;
        self.refresh_autoplay(now);
    }

    pub fn pause(&mut self) {
        self.is_playing = false;
        self.autoplay_deadline = None;
    }

    /// Pointer entered or left the carousel.
    pub fn set_hovered(&mut self, hovered: bool, now: Instant) {
        if self.hovered == hovered {
            return;
        }
        self.hovered = hovered;
        if self.config.pause_on_hover {
            self.refresh_autoplay(now);
        }
    }

    fn autoplay_should_run(&self) -> bool {
        self.is_playing
            && self.items.len() >= 2
            && !(self.config.pause_on_hover && self.hovered)
    }

    /// Start the timer if it should run and isn't, stop it if it shouldn't.
    fn refresh_autoplay(&mut self, now: Instant) {
        if !self.autoplay_should_run() {
            if self.autoplay_deadline.take().is_some() {
                trace!("Autoplay timer cancelled");
            }
            return;
        }
        if self.autoplay_deadline.is_none() {
            self.autoplay_deadline = Some(now + self.config.autoplay_interval);
        }
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    /// A scroll event; the index is resolved once scrolling goes quiet.
    pub fn on_scroll(&mut self, geometry: ScrollGeometry, now: Instant) {
        self.geometry = Some(geometry);
        if !self.items.is_empty() {
            self.scroll_quiet_deadline = Some(now + self.config.scroll_quiet);
        }
    }

    /// Update track geometry without treating it as user scrolling.
    pub fn set_geometry(&mut self, geometry: ScrollGeometry) {
        self.geometry = Some(geometry);
    }

    fn request_scroll_to(&self, index: usize) {
        let Some(left) = self
            .geometry
            .as_ref()
            .and_then(|geometry| scroll_target_for_index(geometry, index))
        else {
            return;
        };
        let request = ScrollRequest { left, smooth: true };
        for listener in &self.on_scroll_request {
            listener(&request);
        }
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Fire whichever timers are due. Returns true if the active index changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let before = self.active_index;

        if self.scroll_quiet_deadline.is_some_and(|deadline| now >= deadline) {
            self.scroll_quiet_deadline = None;
            self.settle_scroll(now);
        }

        // One step per poll however late it is; missed ticks are dropped.
        if self.autoplay_deadline.is_some_and(|deadline| now >= deadline) {
            if self.autoplay_should_run() {
                self.autoplay_deadline = Some(now + self.config.autoplay_interval);
                self.autoplay_step();
            } else {
                self.autoplay_deadline = None;
            }
        }

        before != self.active_index
    }

    fn settle_scroll(&mut self, now: Instant) {
        let resolved = self
            .geometry
            .as_ref()
            .and_then(|geometry| resolve_index_from_scroll(geometry, self.config.edge_tolerance_px))
            .map(|index| index.min(self.items.len().saturating_sub(1)));
        let Some(index) = resolved else {
            return;
        };
        if self.items.is_empty() || Some(index) == self.active_index {
            return;
        }
        debug!(index, "Scroll settled on new active item");
        self.active_index = Some(index);
        self.emit_active_changed(ChangeSource::Scroll);
        if self.autoplay_deadline.is_some() {
            self.autoplay_deadline = Some(now + self.config.autoplay_interval);
        }
    }

    fn autoplay_step(&mut self) {
        let Some(current) = self.active_index else {
            return;
        };
        let count = self.items.len();
        if !self.config.loop_enabled && current + 1 >= count {
            debug!("Autoplay reached the last item, stopping");
            self.is_playing = false;
            self.autoplay_deadline = None;
            return;
        }
        let target = (current + 1) % count;
        self.active_index = Some(target);
        self.emit_active_changed(ChangeSource::Autoplay);
        self.request_scroll_to(target);
    }

    fn emit_active_changed(&self, source: ChangeSource) {
        let change = ActiveChange {
            active_index: self.active_index,
            item: self.active_item(),
            source,
        };
        trace!(?change, "Active index changed");
        for listener in &self.on_active_changed {
            listener(&change);
        }
    }

    /// Cancel every timer. Called when the gallery goes away.
    pub fn teardown(&mut self) {
        self.is_playing = false;
        self.autoplay_deadline = None;
        self.scroll_quiet_deadline = None;
    }
}
