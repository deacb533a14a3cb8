//! Debounced layout recomputation.
//!
//! The scheduler owns the current snapshot of items, layout settings and
//! container width. Environmental signals (resize, item mutations, image loads,
//! config edits) only arm a debounce deadline; the pass itself runs from
//! [`LayoutScheduler::poll`] against whatever the snapshot holds at that moment.
//!
//! Time is passed in explicitly so the state machine can be driven by any event
//! loop (see `runtime`) and tested without sleeping.

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::layout::layout_cache::CacheKey;
use crate::layout::{compute_layout, LayoutCache, LayoutConfig, LayoutMode, LayoutResult};
use crate::models::{AspectRatioIndex, GalleryItem, ItemId};

/// One display frame at 60Hz.
const DEFAULT_DEBOUNCE_MS: u64 = 16;

/// Upper bound on waiting for image dimensions before the first pass.
const DEFAULT_LOAD_TIMEOUT_MS: u64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Quiet period that collapses a burst of triggers into one pass.
    pub debounce: Duration,
    /// How long the first pass may wait for every item to report its size.
    pub load_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            load_timeout: Duration::from_millis(DEFAULT_LOAD_TIMEOUT_MS),
        }
    }
}

/// Why a recompute was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutTrigger {
    ContainerResized,
    ItemSetChanged,
    ConfigChanged,
    DimensionsResolved,
}

/// A published layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPass {
    /// Increments on every published pass.
    pub generation: u64,
    pub container_width: f32,
    /// Items laid out with fallback dimensions because they never loaded.
    pub pending_items: usize,
    /// Number of triggers folded into this pass.
    pub coalesced_triggers: u32,
    /// Masonry column count differs from the previous published pass, so
    /// every placement moved.
    pub columns_changed: bool,
    pub layout: LayoutResult,
}

/// Callback type for published layout passes.
pub type LayoutCallback = Box<dyn Fn(&LayoutPass)>;

pub struct LayoutScheduler {
    config: SchedulerConfig,
    layout: LayoutConfig,
    index: AspectRatioIndex,
    cache: LayoutCache,
    /// Armed recompute; reset (not stacked) by every trigger.
    deadline: Option<Instant>,
    /// Set by the first trigger; cleared once the first pass runs.
    load_gate: Option<Instant>,
    gate_open: bool,
    coalesced: u32,
    generation: u64,
    last_columns: Option<u32>,
    listeners: Vec<LayoutCallback>,
}

impl std::fmt::Debug for LayoutScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutScheduler")
            .field("config", &self.config)
            .field("layout", &self.layout)
            .field("items", &self.index.len())
            .field("deadline", &self.deadline)
            .field("load_gate", &self.load_gate)
            .field("gate_open", &self.gate_open)
            .field("generation", &self.generation)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl LayoutScheduler {
    pub fn new(config: SchedulerConfig, layout: LayoutConfig) -> Self {
        Self {
            config,
            layout,
            index: AspectRatioIndex::new(),
            cache: LayoutCache::new(),
            deadline: None,
            load_gate: None,
            gate_open: false,
            coalesced: 0,
            generation: 0,
            last_columns: None,
            listeners: Vec::new(),
        }
    }

    /// Register a renderer callback for every published pass.
    pub fn connect_layout<F>(&mut self, callback: F)
    where
        F: Fn(&LayoutPass) + 'static,
    {
        self.listeners.push(Box::new(callback));
    }

    pub fn index(&self) -> &AspectRatioIndex {
        &self.index
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while a recompute is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// When `poll` next has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Arm (or re-arm) the debounce window.
    pub fn schedule(&mut self, trigger: LayoutTrigger, now: Instant) {
        if !self.gate_open && self.load_gate.is_none() {
            self.load_gate = Some(now + self.config.load_timeout);
        }
        self.deadline = Some(now + self.config.debounce);
        self.coalesced = self.coalesced.saturating_add(1);
        trace!(?trigger, coalesced = self.coalesced, "Layout recompute scheduled");
    }

    // =========================================================================
    // Snapshot mutations
    // =========================================================================

    /// Record a new container width measurement. Unchanged widths are ignored.
    pub fn set_container_width(&mut self, width: f32, now: Instant) -> bool {
        let width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        if width == self.layout.container_width {
            return false;
        }
        self.layout.container_width = width;
        self.schedule(LayoutTrigger::ContainerResized, now);
        true
    }

    pub fn replace_items(&mut self, items: Vec<GalleryItem>, now: Instant) {
        self.index.replace(items);
        self.schedule(LayoutTrigger::ItemSetChanged, now);
    }

    pub fn insert_item(&mut self, index: usize, item: GalleryItem, now: Instant) {
        self.index.insert(index, item);
        self.schedule(LayoutTrigger::ItemSetChanged, now);
    }

    pub fn remove_item(&mut self, id: ItemId, now: Instant) -> Option<GalleryItem> {
        let removed = self.index.remove(id)?;
        self.schedule(LayoutTrigger::ItemSetChanged, now);
        Some(removed)
    }

    pub fn move_item(&mut self, from: usize, to: usize, now: Instant) -> bool {
        if !self.index.move_item(from, to) {
            return false;
        }
        self.schedule(LayoutTrigger::ItemSetChanged, now);
        true
    }

    /// An item finished loading and reported its natural size.
    pub fn resolve_dimensions(&mut self, id: ItemId, width: f32, height: f32, now: Instant) -> bool {
        if !self.index.set_dimensions(id, width, height) {
            return false;
        }
        self.schedule(LayoutTrigger::DimensionsResolved, now);
        true
    }

    /// An item failed to load; it keeps the square fallback.
    pub fn mark_failed(&mut self, id: ItemId, now: Instant) -> bool {
        if !self.index.mark_failed(id) {
            return false;
        }
        self.schedule(LayoutTrigger::DimensionsResolved, now);
        true
    }

    pub fn set_mode(&mut self, mode: LayoutMode, now: Instant) {
        if self.layout.mode == mode {
            return;
        }
        self.layout.mode = mode;
        self.schedule(LayoutTrigger::ConfigChanged, now);
    }

    pub fn set_gap(&mut self, gap_px: f32, now: Instant) {
        if self.layout.gap_px == gap_px {
            return;
        }
        self.layout.gap_px = gap_px;
        self.schedule(LayoutTrigger::ConfigChanged, now);
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Runs the armed pass if its deadline has passed.
    ///
    /// Returns `None` when nothing is due, when the first pass is still waiting
    /// on image dimensions, or when the container has not been measured yet.
    pub fn poll(&mut self, now: Instant) -> Option<LayoutPass> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }

        let pending = self.index.pending_count();
        if !self.gate_open && pending > 0 {
            let gate = self.load_gate.unwrap_or(now);
            if now < gate {
                debug!(
                    pending,
                    total = self.index.len(),
                    "Waiting for item dimensions before first layout"
                );
                self.deadline = Some(gate);
                return None;
            }
            warn!(
                pending,
                "Dimension load timed out, laying out with fallback sizes"
            );
        }

        self.deadline = None;

        let width = self.layout.container_width;
        if !width.is_finite() || width <= 0.0 {
            debug!("Container not measured yet, skipping layout pass");
            return None;
        }

        self.gate_open = true;
        self.load_gate = None;

        let columns = self.layout.resolved_columns();
        let columns_changed = match (self.last_columns, columns) {
            (Some(previous), Some(current)) if previous != current => {
                debug!(previous, current, "Masonry column count changed");
                true
            }
            _ => false,
        };
        self.last_columns = columns;

        let key = CacheKey::new(&self.layout, self.index.content_hash());
        let layout = match self.cache.get(&key) {
            Some(cached) => {
                trace!(width, "Layout cache hit");
                cached
            }
            None => {
                let computed = compute_layout(self.index.items(), &self.layout);
                self.cache.insert(key, computed.clone());
                computed
            }
        };

        self.generation += 1;
        let pass = LayoutPass {
            generation: self.generation,
            container_width: width,
            pending_items: pending,
            coalesced_triggers: std::mem::take(&mut self.coalesced),
            columns_changed,
            layout,
        };

        debug!(
            generation = pass.generation,
            width,
            items = pass.layout.item_count(),
            coalesced = pass.coalesced_triggers,
            "Published layout pass"
        );

        for listener in &self.listeners {
            listener(&pass);
        }

        Some(pass)
    }

    /// Drop any armed recompute. Used on teardown.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.load_gate = None;
        self.coalesced = 0;
    }
}
