use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::geometry::{Point, Rect};
use crate::video::{RenderTarget, Renderable, StaticImage};

use super::providers::default_factories;
use super::{
    AssetRegistry, CacheConfig, CacheError, Handle, LoadError, ProviderFactory,
    RenderableLocation, RenderableProvider,
};

/// Longest animation -> frame chain followed when resolving what to draw.
pub const MAX_RENDERABLE_NESTING: usize = 4;

struct CacheEntry {
    location: Option<RenderableLocation>,
    provider: Option<Box<dyn RenderableProvider>>,
    renderable: Option<Renderable>,
    credits: i64,
    reloadable: bool,
    failed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub alive: usize,
    pub loadable: usize,
    pub placeholders: usize,
    pub loads: u64,
    pub load_failures: u64,
    pub evictions: u64,
}

/// Handle-addressed store of renderables.
///
/// Entries registered from a location load lazily and may be evicted by
/// `collect()` once their credits run out; the next access rebuilds them.
/// Prebuilt entries stay resident. Lookups never fail: bad handles and failed
/// loads resolve to a placeholder.
pub struct ImageCache {
    entries: Vec<CacheEntry>,
    by_location: BTreeMap<RenderableLocation, Handle>,
    by_identity: HashMap<usize, Handle>,
    factories: Vec<Rc<dyn ProviderFactory>>,
    config: CacheConfig,
    asset_root: PathBuf,
    placeholder: Renderable,
    cursor: usize,
    stats: CacheStats,
    loading: Vec<usize>,
    warned_failures: HashSet<Handle>,
    warned_handles: HashSet<Handle>,
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("asset_root", &self.asset_root)
            .field("config", &self.config)
            .field("stats", &self.stats())
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl ImageCache {
    pub fn new(asset_root: impl Into<PathBuf>, config: CacheConfig) -> Self {
        Self::with_factories(asset_root, config, default_factories())
    }

    pub fn with_factories(
        asset_root: impl Into<PathBuf>,
        config: CacheConfig,
        factories: Vec<Rc<dyn ProviderFactory>>,
    ) -> Self {
        let config = config.normalized();
        let placeholder = Renderable::Placeholder(StaticImage::placeholder());
        let mut entries = Vec::with_capacity(config.preallocation.max(1));
        entries.push(CacheEntry {
            location: None,
            provider: None,
            renderable: Some(placeholder.clone()),
            credits: 0,
            reloadable: false,
            failed: false,
        });

        Self {
            entries,
            by_location: BTreeMap::new(),
            by_identity: HashMap::new(),
            factories,
            config,
            asset_root: asset_root.into(),
            placeholder,
            cursor: 0,
            stats: CacheStats {
                alive: 1,
                ..CacheStats::default()
            },
            loading: Vec::new(),
            warned_failures: HashSet::new(),
            warned_handles: HashSet::new(),
        }
    }

    /// Puts `factory` ahead of every factory registered so far.
    pub fn register_factory(&mut self, factory: Rc<dyn ProviderFactory>) {
        self.factories.insert(0, factory);
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn contains(&self, handle: Handle) -> bool {
        !handle.is_undefined() && handle.index() < self.entries.len()
    }

    pub fn is_loaded(&self, handle: Handle) -> bool {
        self.entries
            .get(handle.index())
            .is_some_and(|entry| entry.renderable.is_some())
    }

    pub fn is_reloadable(&self, handle: Handle) -> bool {
        self.entries
            .get(handle.index())
            .is_some_and(|entry| entry.reloadable)
    }

    pub fn location(&self, handle: Handle) -> Option<&RenderableLocation> {
        self.entries.get(handle.index())?.location.as_ref()
    }

    pub fn placeholder(&self) -> &Renderable {
        &self.placeholder
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total: self.entries.len(),
            ..self.stats
        }
    }

    /// Registers a prebuilt renderable. It is never evicted. Registering the
    /// same image again returns the handle it already has.
    pub fn add_image(&mut self, renderable: Renderable) -> Result<Handle, CacheError> {
        if renderable.is_empty() {
            return Err(CacheError::InvalidArgument);
        }
        let identity = renderable.identity();
        if let Some(id) = identity {
            if let Some(handle) = self.live_identity(id) {
                return Ok(handle);
            }
        }

        let handle = self.push_entry(CacheEntry {
            location: None,
            provider: None,
            renderable: Some(renderable),
            credits: self.config.hit_credits as i64,
            reloadable: false,
            failed: false,
        });
        if let Some(id) = identity {
            self.by_identity.insert(id, handle);
        }
        self.stats.alive += 1;
        Ok(handle)
    }

    /// Handle whose entry still holds the pixel buffer at `id`. The buffer is
    /// alive while its entry owns it, so the address cannot have been reused;
    /// a key left behind by `get_image_mut` replacing the image is dropped.
    fn live_identity(&mut self, id: usize) -> Option<Handle> {
        let handle = *self.by_identity.get(&id)?;
        let still_owned = self.entries[handle.index()]
            .renderable
            .as_ref()
            .and_then(Renderable::identity)
            == Some(id);
        if still_owned {
            Some(handle)
        } else {
            self.by_identity.remove(&id);
            None
        }
    }

    /// Registers a lazily loaded entry. Equal locations share one handle.
    /// Invalid locations yield [`Handle::UNDEFINED`].
    pub fn add_from_location(&mut self, location: RenderableLocation) -> Handle {
        if !location.is_valid() {
            debug!(location = %location, "cache_rejected_invalid_location");
            return Handle::UNDEFINED;
        }
        if let Some(handle) = self.by_location.get(&location) {
            return *handle;
        }

        let handle = self.push_entry(CacheEntry {
            location: Some(location.clone()),
            provider: None,
            renderable: None,
            credits: 0,
            reloadable: true,
            failed: false,
        });
        self.by_location.insert(location, handle);
        self.stats.loadable += 1;
        handle
    }

    /// Resolves `handle`, loading it if needed, and marks it as recently used.
    pub fn get_image(&mut self, handle: Handle) -> &Renderable {
        if !self.contains(handle) {
            self.note_bad_handle(handle);
            return &self.placeholder;
        }
        let index = handle.index();
        self.touch(index);
        match &self.entries[index].renderable {
            Some(renderable) => renderable,
            None => &self.placeholder,
        }
    }

    pub fn get_image_mut(&mut self, handle: Handle) -> Result<&mut Renderable, CacheError> {
        let out_of_range = CacheError::IndexOutOfRange {
            handle,
            len: self.entries.len(),
        };
        if !self.contains(handle) {
            return Err(out_of_range);
        }
        let index = handle.index();
        self.touch(index);
        self.entries[index]
            .renderable
            .as_mut()
            .ok_or(out_of_range)
    }

    /// Frees the payload of a reloadable entry now. Returns whether anything
    /// was freed; prebuilt entries are left alone.
    pub fn unload(&mut self, handle: Handle) -> Result<bool, CacheError> {
        if !self.contains(handle) {
            return Err(CacheError::IndexOutOfRange {
                handle,
                len: self.entries.len(),
            });
        }
        let index = handle.index();
        let entry = &self.entries[index];
        if !entry.reloadable || entry.renderable.is_none() {
            return Ok(false);
        }
        self.evict(index);
        Ok(true)
    }

    /// Rebuilds a reloadable entry with the provider it was loaded by, e.g.
    /// after its file changed on disk.
    pub fn reload(&mut self, handle: Handle) -> Result<(), CacheError> {
        if !self.contains(handle) {
            return Err(CacheError::IndexOutOfRange {
                handle,
                len: self.entries.len(),
            });
        }
        let index = handle.index();
        if !self.entries[index].reloadable {
            return Ok(());
        }
        if self.entries[index].renderable.take().is_some() {
            self.stats.alive -= 1;
        }
        self.load_entry(index);
        Ok(())
    }

    /// Visits the next chunk of entries, decays their credits and frees the
    /// payloads that ran out. Returns the number of entries evicted.
    pub fn collect(&mut self) -> usize {
        if self.stats.alive < self.config.min_alive {
            return 0;
        }

        let len = self.entries.len();
        if self.cursor >= len {
            self.cursor = 0;
        }
        let start = self.cursor;
        let end = start.saturating_add(self.config.chunk_size).min(len);

        let mut evicted = 0;
        for index in start..end {
            let entry = &mut self.entries[index];
            if !entry.reloadable || entry.renderable.is_none() {
                continue;
            }
            entry.credits -= 1;
            if entry.credits <= 0 {
                self.evict(index);
                evicted += 1;
            }
        }

        self.cursor = if end >= len { 0 } else { end };
        evicted
    }

    /// Advances every loaded animation.
    pub fn update_animations(&mut self, now_ticks: u64) {
        for entry in &mut self.entries {
            if let Some(renderable) = entry.renderable.as_mut() {
                renderable.update(now_ticks);
            }
        }
    }

    /// Follows animation frames down to a drawable leaf. Returns the leaf and
    /// the shift accumulated on the way.
    pub fn resolve_leaf(&mut self, handle: Handle) -> (Handle, Point) {
        let mut current = handle;
        let mut offset = Point::ZERO;
        for _ in 0..=MAX_RENDERABLE_NESTING {
            let renderable = self.get_image(current);
            let Some((next, frame_shift)) = renderable.current_frame() else {
                return (current, offset);
            };
            offset += renderable.shift() + frame_shift;
            current = next;
        }

        if self.warned_handles.insert(handle) {
            warn!(
                handle = handle.raw(),
                max_depth = MAX_RENDERABLE_NESTING,
                "cache_renderable_nesting_too_deep_using_placeholder"
            );
        }
        (Handle::UNDEFINED, offset)
    }

    /// Size of whatever `handle` currently shows.
    pub fn frame_size(&mut self, handle: Handle) -> (u32, u32) {
        let (leaf, _) = self.resolve_leaf(handle);
        let renderable = self.get_image(leaf);
        (renderable.width(), renderable.height())
    }

    /// Screen rectangle `draw` would cover for `handle` at `position`.
    pub fn frame_rect(&mut self, handle: Handle, position: Point) -> Rect {
        let (leaf, offset) = self.resolve_leaf(handle);
        let renderable = self.get_image(leaf);
        Rect::from_origin_size(
            position + offset + renderable.shift(),
            renderable.width(),
            renderable.height(),
        )
    }

    /// Draws `handle` with its top-left at `position` plus any shifts.
    pub fn draw(
        &mut self,
        handle: Handle,
        position: Point,
        target: &mut dyn RenderTarget,
        alpha: u8,
    ) -> bool {
        if alpha == 0 {
            return false;
        }
        let (leaf, offset) = self.resolve_leaf(handle);
        let renderable = self.get_image(leaf);
        let origin = position + offset + renderable.shift();
        let dest = Rect::from_origin_size(origin, renderable.width(), renderable.height());
        renderable.render(target, dest, alpha)
    }

    fn push_entry(&mut self, entry: CacheEntry) -> Handle {
        let handle = Handle::from_raw(self.entries.len() as u32);
        self.entries.push(entry);
        handle
    }

    fn touch(&mut self, index: usize) {
        if self.entries[index].renderable.is_none() {
            self.load_entry(index);
        } else {
            self.entries[index].credits = self.config.hit_credits as i64;
        }
    }

    fn load_entry(&mut self, index: usize) {
        let handle = Handle::from_raw(index as u32);
        let (renderable, failed) = match self.produce(index) {
            Ok(renderable) => {
                self.stats.loads += 1;
                debug!(
                    handle = handle.raw(),
                    kind = renderable.kind_name(),
                    "cache_entry_loaded"
                );
                (renderable, false)
            }
            Err(error) => {
                self.stats.load_failures += 1;
                self.report_load_failure(handle, &error);
                (self.placeholder.clone(), true)
            }
        };

        let credits = self.config.load_credits as i64;
        let entry = &mut self.entries[index];
        // A nested load of the same entry may already have filled it.
        if entry.renderable.is_none() {
            self.stats.alive += 1;
        }
        if entry.failed {
            self.stats.placeholders -= 1;
        }
        if failed {
            self.stats.placeholders += 1;
            entry.provider = None;
        }
        entry.failed = failed;
        entry.renderable = Some(renderable);
        entry.credits = credits;
    }

    fn produce(&mut self, index: usize) -> Result<Renderable, LoadError> {
        if self.loading.contains(&index) {
            return Err(LoadError::Recursive {
                handle: Handle::from_raw(index as u32),
            });
        }
        self.loading.push(index);
        let result = self.produce_with_providers(index);
        self.loading.pop();
        result
    }

    fn produce_with_providers(&mut self, index: usize) -> Result<Renderable, LoadError> {
        if let Some(mut provider) = self.entries[index].provider.take() {
            let result = provider.create_renderable(self);
            self.entries[index].provider = Some(provider);
            return result;
        }

        let Some(location) = self.entries[index].location.clone() else {
            return Err(LoadError::UnsupportedKind { kind: "prebuilt" });
        };

        let factories = self.factories.clone();
        let mut last_error = None;
        for factory in factories
            .iter()
            .filter(|factory| factory.accepts(location.kind()))
        {
            let mut provider = factory.create(&location);
            match provider.create_renderable(self) {
                Ok(renderable) => {
                    self.entries[index].provider = Some(provider);
                    return Ok(renderable);
                }
                Err(error) => {
                    debug!(
                        handle = index,
                        factory = factory.name(),
                        reason = error.reason(),
                        "cache_provider_rejected_location"
                    );
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or(LoadError::UnsupportedKind {
            kind: location.kind().name(),
        }))
    }

    fn evict(&mut self, index: usize) {
        let entry = &mut self.entries[index];
        entry.renderable = None;
        entry.provider = None;
        entry.credits = 0;
        if entry.failed {
            entry.failed = false;
            self.stats.placeholders -= 1;
        }
        self.stats.alive -= 1;
        self.stats.evictions += 1;
        debug!(handle = index, "cache_entry_evicted");
    }

    fn report_load_failure(&mut self, handle: Handle, error: &LoadError) {
        let location = self
            .location(handle)
            .map(ToString::to_string)
            .unwrap_or_else(|| "<prebuilt>".to_string());
        if self.warned_failures.insert(handle) {
            warn!(
                handle = handle.raw(),
                location = %location,
                reason = error.reason(),
                error = %error,
                "cache_load_failed_using_placeholder"
            );
        } else {
            debug!(
                handle = handle.raw(),
                location = %location,
                reason = error.reason(),
                "cache_load_failed_again"
            );
        }
    }

    fn note_bad_handle(&mut self, handle: Handle) {
        if handle.is_undefined() || !self.warned_handles.insert(handle) {
            return;
        }
        warn!(
            handle = handle.raw(),
            entries = self.entries.len(),
            "cache_handle_out_of_range_using_placeholder"
        );
    }
}

impl AssetRegistry for ImageCache {
    fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    fn add_from_location(&mut self, location: RenderableLocation) -> Handle {
        ImageCache::add_from_location(self, location)
    }

    fn add_image(&mut self, renderable: Renderable) -> Result<Handle, CacheError> {
        ImageCache::add_image(self, renderable)
    }

    fn image_data(&mut self, handle: Handle) -> Option<StaticImage> {
        let (leaf, _) = self.resolve_leaf(handle);
        self.get_image(leaf).as_image().cloned()
    }
}

impl Drop for ImageCache {
    fn drop(&mut self) {
        let stats = self.stats();
        info!(
            total = stats.total,
            alive = stats.alive,
            loadable = stats.loadable,
            placeholders = stats.placeholders,
            loads = stats.loads,
            load_failures = stats.load_failures,
            evictions = stats.evictions,
            "cache_statistics"
        );
    }
}
