//! The in-memory session cache shared by every view.
//!
//! `Store` owns the current settings and days, loads them lazily from the
//! `LocalStore` on first use, and tells registered subscribers about every
//! mutation. Settings are written through immediately; day edits are
//! written through a debouncer so keystroke-level edits collapse into one
//! write. The cache is always the source of truth for reads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::date::{self, HeatCell};
use crate::debounce::{Debouncer, DEFAULT_DEBOUNCE};
use crate::history::{self, HistoryFilter};
use crate::insights::Insights;
use crate::models::{DayEntry, DayPatch, Days, Feature, Features, Settings, SettingsPatch, Theme};
use crate::storage::{ImportError, LocalStore, StorageError, SETTINGS_KEY};
use crate::theme::{self, Appearance};

/// Number of days shown in the activity strip.
pub const HEAT_SPAN_DAYS: usize = 30;

/// Handle returned by [`Store::subscribe`].
pub type SubscriberId = u64;

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Quiet period before day edits are persisted.
    pub debounce: Duration,
    /// Platform light/dark preference at startup.
    pub platform_prefers_dark: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            platform_prefers_dark: false,
        }
    }
}

/// A consistent view of the cache at one moment.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub settings: Settings,
    pub days: Arc<Days>,
}

struct Cache {
    settings: Settings,
    days: Arc<Days>,
}

#[derive(Default)]
struct Registry {
    next_id: SubscriberId,
    callbacks: Vec<(SubscriberId, Callback)>,
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct Store {
    local: LocalStore,
    clock: Arc<dyn Clock>,
    cache: Mutex<Option<Cache>>,
    subscribers: Mutex<Registry>,
    platform_prefers_dark: AtomicBool,
    appearance: watch::Sender<Appearance>,
    day_writer: Debouncer<Arc<Days>>,
}

impl Store {
    pub fn new(local: LocalStore, options: StoreOptions) -> Self {
        Self::with_clock(local, options, Arc::new(SystemClock))
    }

    pub fn with_clock(local: LocalStore, options: StoreOptions, clock: Arc<dyn Clock>) -> Self {
        let writer = local.clone();
        let day_writer = Debouncer::new(options.debounce, move |days: Arc<Days>| {
            if let Err(e) = writer.save_days(&days) {
                error!(error = %e, entries = days.len(), "Failed to persist days");
            }
        });

        let initial = theme::resolve(Theme::System, options.platform_prefers_dark);
        let (appearance, _) = watch::channel(initial);

        Self {
            local,
            clock,
            cache: Mutex::new(None),
            subscribers: Mutex::new(Registry::default()),
            platform_prefers_dark: AtomicBool::new(options.platform_prefers_dark),
            appearance,
            day_writer,
        }
    }

    fn load(&self) -> Cache {
        let settings = self.local.load_settings();
        let days = self.local.load_days(self.clock.now_millis());
        info!(
            entries = days.len(),
            reset_hour = settings.reset_hour,
            "Loaded local store"
        );
        self.publish_appearance(settings.theme);
        Cache {
            settings,
            days: Arc::new(days),
        }
    }

    /// Run `f` against the cache, loading it first if this is the first use.
    fn with_cache<R>(&self, f: impl FnOnce(&mut Cache) -> R) -> R {
        let mut guard = lock(&self.cache);
        let cache = guard.get_or_insert_with(|| self.load());
        f(cache)
    }

    // ===== Snapshot & Subscribers =====

    pub fn snapshot(&self) -> Snapshot {
        self.with_cache(|c| Snapshot {
            settings: c.settings.clone(),
            days: Arc::clone(&c.days),
        })
    }

    pub fn settings(&self) -> Settings {
        self.with_cache(|c| c.settings.clone())
    }

    pub fn days(&self) -> Arc<Days> {
        self.with_cache(|c| Arc::clone(&c.days))
    }

    /// Register a callback fired after every mutation.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriberId {
        let mut registry = lock(&self.subscribers);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.callbacks.push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut registry = lock(&self.subscribers);
        let before = registry.callbacks.len();
        registry.callbacks.retain(|(cb_id, _)| *cb_id != id);
        registry.callbacks.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).callbacks.len()
    }

    /// Call every subscriber. Callbacks run without any store lock held,
    /// so they may read the store.
    fn notify(&self) {
        let callbacks: Vec<Callback> = lock(&self.subscribers)
            .callbacks
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    // ===== Settings =====

    /// Merge `patch` into the settings, persist them, and notify.
    pub fn patch_settings(&self, patch: SettingsPatch) -> Settings {
        let theme_changed = patch.theme.is_some();
        let next = self.with_cache(|c| {
            c.settings.apply(patch);
            if let Err(e) = self.local.save_settings(&c.settings) {
                error!(error = %e, "Failed to persist settings");
            }
            c.settings.clone()
        });
        if theme_changed {
            self.publish_appearance(next.theme);
        }
        self.notify();
        next
    }

    pub fn set_reset_hour(&self, hour: u8) -> Settings {
        self.patch_settings(SettingsPatch {
            reset_hour: Some(hour),
            ..SettingsPatch::default()
        })
    }

    pub fn set_quiet(&self, quiet: bool) -> Settings {
        self.patch_settings(SettingsPatch {
            quiet: Some(quiet),
            ..SettingsPatch::default()
        })
    }

    pub fn set_shortcuts(&self, shortcuts: bool) -> Settings {
        self.patch_settings(SettingsPatch {
            shortcuts: Some(shortcuts),
            ..SettingsPatch::default()
        })
    }

    pub fn set_passcode(&self, passcode: Option<String>) -> Settings {
        self.patch_settings(SettingsPatch {
            passcode: Some(passcode),
            ..SettingsPatch::default()
        })
    }

    pub fn set_theme(&self, theme: Theme) -> Settings {
        self.patch_settings(SettingsPatch::theme(theme))
    }

    pub fn set_features(&self, features: Features) -> Settings {
        self.patch_settings(SettingsPatch {
            features: Some(features),
            ..SettingsPatch::default()
        })
    }

    /// Turn one widget on or off, keeping the others.
    pub fn set_feature(&self, feature: Feature, on: bool) -> Settings {
        let mut features = self.settings().features;
        features.set(feature, on);
        self.set_features(features)
    }

    pub fn set_layout_order(&self, order: Vec<String>) -> Settings {
        self.patch_settings(SettingsPatch {
            layout_order: Some(order),
            ..SettingsPatch::default()
        })
    }

    pub fn complete_tutorial(&self) -> Settings {
        self.patch_settings(SettingsPatch {
            tutorial_completed: Some(true),
            tutorial_step: Some(0),
            ..SettingsPatch::default()
        })
    }

    pub fn set_tutorial_step(&self, step: u32) -> Settings {
        self.patch_settings(SettingsPatch {
            tutorial_step: Some(step),
            ..SettingsPatch::default()
        })
    }

    /// Switch to the explicit theme opposite to what is shown now.
    pub fn toggle_theme(&self) -> Settings {
        let theme = self.resolved_appearance().toggled_theme();
        self.set_theme(theme)
    }

    // ===== Appearance =====

    fn publish_appearance(&self, theme: Theme) {
        let prefers_dark = self.platform_prefers_dark.load(Ordering::Relaxed);
        let resolved = theme::resolve(theme, prefers_dark);
        let previous = self.appearance.send_replace(resolved);
        if previous != resolved {
            debug!(?resolved, %theme, "Appearance changed");
        }
    }

    /// Receiver that always holds the current effective appearance.
    pub fn appearance(&self) -> watch::Receiver<Appearance> {
        self.with_cache(|_| ());
        self.appearance.subscribe()
    }

    pub fn resolved_appearance(&self) -> Appearance {
        let theme = self.with_cache(|c| c.settings.theme);
        theme::resolve(theme, self.platform_prefers_dark.load(Ordering::Relaxed))
    }

    /// Record a platform light/dark change. Only a `system` theme follows
    /// it, so subscribers are notified only in that case.
    pub fn set_platform_prefers_dark(&self, prefers_dark: bool) {
        self.platform_prefers_dark
            .store(prefers_dark, Ordering::Relaxed);
        let theme = self.with_cache(|c| c.settings.theme);
        if theme == Theme::System {
            self.publish_appearance(theme);
            self.notify();
        }
    }

    /// React to another instance writing `key` to shared storage.
    ///
    /// Settings are reloaded; the days record is not live-synced.
    pub fn handle_external_change(&self, key: &str) {
        if key != SETTINGS_KEY {
            debug!(key, "Ignoring external change");
            return;
        }
        let settings = self.local.load_settings();
        let theme = settings.theme;
        self.with_cache(|c| c.settings = settings);
        self.publish_appearance(theme);
        info!("Settings reloaded after external change");
        self.notify();
    }

    // ===== Days =====

    /// The logical date right now, honoring the reset hour.
    pub fn today(&self) -> String {
        let reset_hour = self.with_cache(|c| c.settings.reset_hour);
        date::logical_date_for(reset_hour, self.clock.now().naive_local())
    }

    pub fn today_entry(&self) -> Option<DayEntry> {
        let today = self.today();
        self.with_cache(|c| c.days.get(&today).cloned())
    }

    /// Patch today's entry, creating it if needed.
    pub fn update_today(&self, patch: DayPatch) -> DayEntry {
        let today = self.today();
        self.patch_today(&today, patch)
    }

    /// Patch the entry for `logical_date`, creating an empty one first if
    /// none exists. Persisted after the debounce window.
    pub fn patch_today(&self, logical_date: &str, patch: DayPatch) -> DayEntry {
        let now = self.clock.now_millis();
        let (entry, days) = self.with_cache(|c| {
            let days = Arc::make_mut(&mut c.days);
            let entry = days
                .entry(logical_date.to_string())
                .or_insert_with(|| DayEntry::new(logical_date, now));
            entry.apply(patch);
            (entry.clone(), Arc::clone(&c.days))
        });
        self.day_writer.schedule(days);
        self.notify();
        entry
    }

    /// Patch an existing entry. Does nothing if `date` has no entry.
    pub fn patch_day(&self, date: &str, patch: DayPatch) -> Option<DayEntry> {
        let updated = self.with_cache(|c| {
            if !c.days.contains_key(date) {
                return None;
            }
            let days = Arc::make_mut(&mut c.days);
            let entry = days.get_mut(date)?;
            entry.apply(patch);
            Some((entry.clone(), Arc::clone(&c.days)))
        });

        let Some((entry, days)) = updated else {
            debug!(date, "No entry to patch");
            return None;
        };
        self.day_writer.schedule(days);
        self.notify();
        Some(entry)
    }

    /// Flip the favorite flag on an existing entry, returning the new value.
    pub fn toggle_favorite(&self, date: &str) -> Option<bool> {
        let current = self.with_cache(|c| c.days.get(date).map(|e| e.favorite))?;
        self.patch_day(date, DayPatch::favorite(!current))
            .map(|e| e.favorite)
    }

    /// Remove every entry, from the cache and from storage.
    pub fn clear_all(&self) {
        self.day_writer.cancel();
        self.with_cache(|c| c.days = Arc::new(Days::new()));
        if let Err(e) = self.local.clear_days() {
            error!(error = %e, "Failed to clear stored days");
        }
        info!("All entries cleared");
        self.notify();
    }

    /// The persisted days record as JSON text, after flushing pending edits.
    pub fn export_days(&self) -> Result<String, StorageError> {
        self.flush();
        self.local.export_days()
    }

    /// Replace all entries with an import. Returns the number of entries.
    ///
    /// On error nothing changes, in memory or in storage.
    pub fn import_days(&self, raw: &str) -> Result<usize, ImportError> {
        self.flush();
        let days = match self.local.import_days(raw, self.clock.now_millis()) {
            Ok(days) => days,
            Err(e) => {
                warn!(error = %e, "Import rejected");
                return Err(e);
            }
        };
        let count = days.len();
        self.with_cache(|c| c.days = Arc::new(days));
        info!(entries = count, "Imported entries");
        self.notify();
        Ok(count)
    }

    /// Persist any pending day edits now. Returns whether anything was written.
    pub fn flush(&self) -> bool {
        self.day_writer.flush()
    }

    pub fn has_pending_write(&self) -> bool {
        self.day_writer.is_pending()
    }

    // ===== Derived views =====

    /// All entries, newest first.
    pub fn history(&self) -> Vec<DayEntry> {
        history::history(&self.days())
    }

    pub fn filtered_history(&self, filter: &HistoryFilter) -> Vec<DayEntry> {
        filter.apply(&self.history())
    }

    /// Consecutive days with content ending at today.
    pub fn streak(&self) -> u32 {
        let today = self.today();
        date::streak(&self.days(), &today)
    }

    /// Activity over the last `span` logical days, oldest first.
    pub fn heat(&self, span: usize) -> Vec<HeatCell> {
        let today = self.today();
        match date::parse_date_key(&today) {
            Some(day) => date::heat(&self.days(), day, span),
            None => Vec::new(),
        }
    }

    pub fn insights(&self) -> Insights {
        Insights::compute(&self.days(), &Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::DayField;
    use crate::storage::{KeyValueBackend, MemoryBackend, DAYS_KEY};
    use chrono::TimeZone;
    use std::sync::atomic::AtomicUsize;

    /// Backend that refuses every write.
    struct ReadOnlyBackend;

    impl KeyValueBackend for ReadOnlyBackend {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
    }

    fn clock_at(y: i32, m: u32, d: u32, hour: u32) -> Arc<FixedClock> {
        Arc::new(FixedClock(
            Local.with_ymd_and_hms(y, m, d, hour, 0, 0).single().unwrap(),
        ))
    }

    fn store_with(backend: Arc<dyn KeyValueBackend>, clock: Arc<FixedClock>) -> Store {
        Store::with_clock(LocalStore::new(backend), StoreOptions::default(), clock)
    }

    fn memory_store() -> (Arc<MemoryBackend>, Store) {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_with(backend.clone(), clock_at(2024, 6, 5, 10));
        (backend, store)
    }

    fn counter(store: &Store) -> (Arc<AtomicUsize>, SubscriberId) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let id = store.subscribe(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, id)
    }

    fn stored_days(backend: &MemoryBackend) -> Option<serde_json::Value> {
        backend
            .get(DAYS_KEY)
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_patch_today_is_visible_then_persisted() {
        let (backend, store) = memory_store();
        let clock_ms = clock_at(2024, 6, 5, 10).now_millis();

        store.patch_today("2024-06-05", DayPatch::text(DayField::Remember, "buy milk"));

        let snapshot = store.snapshot();
        let today = &snapshot.days["2024-06-05"];
        assert_eq!(today.remember, "buy milk");
        assert_eq!(today.created_at(), clock_ms);
        assert!(stored_days(&backend).is_none());

        tokio::time::sleep(Duration::from_millis(301)).await;
        let persisted = stored_days(&backend).unwrap();
        assert_eq!(persisted["2024-06-05"]["remember"], "buy milk");
        assert_eq!(persisted["2024-06-05"]["date"], "2024-06-05");
    }

    #[tokio::test(start_paused = true)]
    async fn test_created_at_is_kept_on_later_patches() {
        let backend = Arc::new(MemoryBackend::new());
        let first = store_with(backend.clone(), clock_at(2024, 6, 5, 10));
        let created = first
            .patch_today("2024-06-05", DayPatch::text(DayField::Focus, "calm"))
            .created_at();
        first.flush();
        drop(first);

        let later = store_with(backend, clock_at(2024, 6, 5, 18));
        let entry = later.patch_today("2024-06-05", DayPatch::text(DayField::Avoid, "sugar"));
        assert_eq!(entry.created_at(), created);
        assert_eq!(entry.focus, "calm");
        assert_eq!(entry.avoid, "sugar");
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_collapse_into_one_write() {
        let backend = Arc::new(CountingBackend::default());
        let store = store_with(backend.clone(), clock_at(2024, 6, 5, 10));

        for text in ["b", "bu", "buy", "buy ", "buy m"] {
            store.patch_today("2024-06-05", DayPatch::text(DayField::Remember, text));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(backend.day_writes.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(backend.day_writes.load(Ordering::SeqCst), 1);
        assert!(backend.inner.get(DAYS_KEY).unwrap().unwrap().contains("buy m"));
    }

    #[derive(Default)]
    struct CountingBackend {
        inner: MemoryBackend,
        day_writes: AtomicUsize,
    }

    impl KeyValueBackend for CountingBackend {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == DAYS_KEY {
                self.day_writes.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_patch_day_without_entry_is_noop() {
        let (backend, store) = memory_store();
        let (count, _) = counter(&store);

        assert!(store.patch_day("2099-01-01", DayPatch::favorite(true)).is_none());
        assert!(store.days().is_empty());
        assert!(!store.has_pending_write());
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(stored_days(&backend).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_favorite() {
        let (_, store) = memory_store();
        store.patch_today("2024-06-01", DayPatch::text(DayField::Remember, "x"));
        assert_eq!(store.toggle_favorite("2024-06-01"), Some(true));
        assert_eq!(store.toggle_favorite("2024-06-01"), Some(false));
        assert_eq!(store.toggle_favorite("2024-06-02"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_fire_on_every_mutation() {
        let (_, store) = memory_store();
        let (a, a_id) = counter(&store);
        let (b, _) = counter(&store);

        store.set_quiet(true);
        store.patch_today("2024-06-05", DayPatch::text(DayField::Remember, "x"));
        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);

        assert!(store.unsubscribe(a_id));
        assert!(!store.unsubscribe(a_id));
        store.clear_all();
        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 3);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriber_can_read_store() {
        let (_, store) = memory_store();
        let store = Arc::new(store);
        let observed = Arc::new(Mutex::new(String::new()));

        let reader = Arc::clone(&store);
        let sink = Arc::clone(&observed);
        store.subscribe(move || {
            if let Some(e) = reader.snapshot().days.get("2024-06-05") {
                *sink.lock().unwrap() = e.remember.clone();
            }
        });

        store.patch_today("2024-06-05", DayPatch::text(DayField::Remember, "seen"));
        assert_eq!(*observed.lock().unwrap(), "seen");
    }

    #[test]
    fn test_settings_write_through_immediately() {
        let (backend, store) = memory_store();
        store.set_reset_hour(3);
        let raw = backend.get(SETTINGS_KEY).unwrap().unwrap();
        assert_eq!(Settings::from_json(&raw).reset_hour, 3);
        assert_eq!(store.settings().reset_hour, 3);
    }

    #[test]
    fn test_lazy_load_reads_existing_records() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set(SETTINGS_KEY, r#"{"resetHour": "noon", "theme": "dark", "quiet": true}"#)
            .unwrap();
        backend
            .set(DAYS_KEY, r#"{"2024-06-05": {"date": "2024-06-05", "remember": "x", "createdAt": 5}}"#)
            .unwrap();

        let store = store_with(backend, clock_at(2024, 6, 5, 10));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.settings.reset_hour, 0);
        assert_eq!(snapshot.settings.theme, Theme::Dark);
        assert!(snapshot.settings.quiet);
        assert_eq!(snapshot.days["2024-06-05"].created_at(), 5);
        assert_eq!(store.resolved_appearance(), Appearance::Dark);
    }

    #[test]
    fn test_today_honors_reset_hour() {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_with(backend, clock_at(2024, 6, 5, 2));
        assert_eq!(store.today(), "2024-06-05");
        store.set_reset_hour(3);
        assert_eq!(store.today(), "2024-06-04");
    }

    #[tokio::test(start_paused = true)]
    async fn test_streak_and_heat() {
        let (_, store) = memory_store();
        for date in ["2024-06-05", "2024-06-04", "2024-06-03", "2024-06-01"] {
            store.patch_today(date, DayPatch::text(DayField::Complete, "run"));
        }
        assert_eq!(store.streak(), 3);

        let heat = store.heat(HEAT_SPAN_DAYS);
        assert_eq!(heat.len(), HEAT_SPAN_DAYS);
        assert_eq!(heat.last().unwrap().date, "2024-06-05");
        assert_eq!(heat.iter().filter(|c| c.active).count(), 4);

        store.patch_today("2024-06-05", DayPatch::text(DayField::Complete, "  "));
        assert_eq!(store.streak(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_all_drops_pending_write() {
        let (backend, store) = memory_store();
        store.patch_today("2024-06-05", DayPatch::text(DayField::Remember, "x"));
        store.flush();
        store.patch_today("2024-06-05", DayPatch::text(DayField::Remember, "y"));

        store.clear_all();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(store.days().is_empty());
        assert!(stored_days(&backend).is_none());
        assert_eq!(store.export_days().unwrap(), "{}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_import_replaces_and_notifies() {
        let (backend, store) = memory_store();
        store.patch_today("2024-06-05", DayPatch::text(DayField::Remember, "old"));
        let (count, _) = counter(&store);

        let raw = r#"{"2024-01-01": {"remember": "new year", "favorite": true}}"#;
        assert_eq!(store.import_days(raw).unwrap(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let days = store.days();
        assert_eq!(days.len(), 1);
        assert!(days["2024-01-01"].favorite);

        tokio::time::sleep(Duration::from_millis(400)).await;
        let persisted = stored_days(&backend).unwrap();
        assert!(persisted.get("2024-06-05").is_none());
        assert_eq!(persisted["2024-01-01"]["remember"], "new year");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_import_changes_nothing() {
        let (backend, store) = memory_store();
        store.patch_today("2024-06-05", DayPatch::text(DayField::Remember, "keep"));
        store.flush();
        let before = backend.get(DAYS_KEY).unwrap();
        let (count, _) = counter(&store);

        assert!(matches!(store.import_days("{broken"), Err(ImportError::InvalidJson(_))));
        assert!(matches!(store.import_days("42"), Err(ImportError::NotAnObject)));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(store.days()["2024-06-05"].remember, "keep");
        assert_eq!(backend.get(DAYS_KEY).unwrap(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_includes_pending_edits() {
        let (_, store) = memory_store();
        store.patch_today("2024-06-05", DayPatch::text(DayField::Scratch, "draft"));
        let exported = store.export_days().unwrap();
        assert!(exported.contains("draft"));
        assert!(!store.has_pending_write());
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failures_keep_cache_authoritative() {
        let store = store_with(Arc::new(ReadOnlyBackend), clock_at(2024, 6, 5, 10));

        let settings = store.set_theme(Theme::Dark);
        assert_eq!(settings.theme, Theme::Dark);

        store.patch_today("2024-06-05", DayPatch::text(DayField::Remember, "x"));
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(store.days()["2024-06-05"].remember, "x");

        store.clear_all();
        assert!(store.days().is_empty());

        assert!(matches!(store.import_days("{}"), Err(ImportError::Storage(_))));
    }

    #[test]
    fn test_theme_changes_publish_appearance() {
        let (_, store) = memory_store();
        let rx = store.appearance();
        assert_eq!(*rx.borrow(), Appearance::Light);

        store.set_theme(Theme::Dark);
        assert_eq!(*rx.borrow(), Appearance::Dark);

        store.toggle_theme();
        assert_eq!(store.settings().theme, Theme::Light);
        assert_eq!(*rx.borrow(), Appearance::Light);
    }

    #[test]
    fn test_platform_preference_only_matters_for_system() {
        let (_, store) = memory_store();
        let rx = store.appearance();
        let (count, _) = counter(&store);

        store.set_platform_prefers_dark(true);
        assert_eq!(*rx.borrow(), Appearance::Dark);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        store.set_theme(Theme::Light);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        store.set_platform_prefers_dark(false);
        store.set_platform_prefers_dark(true);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(*rx.borrow(), Appearance::Light);
    }

    #[test]
    fn test_external_settings_change_reloads() {
        let (backend, store) = memory_store();
        assert_eq!(store.settings().reset_hour, 0);
        let (count, _) = counter(&store);

        backend
            .set(SETTINGS_KEY, r#"{"resetHour": 5, "theme": "dark"}"#)
            .unwrap();
        store.handle_external_change(DAYS_KEY);
        assert_eq!(store.settings().reset_hour, 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        store.handle_external_change(SETTINGS_KEY);
        assert_eq!(store.settings().reset_hour, 5);
        assert_eq!(store.resolved_appearance(), Appearance::Dark);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_feature_and_tutorial_setters() {
        let (_, store) = memory_store();
        store.set_feature(Feature::WaterTracker, true);
        store.set_feature(Feature::FocusTimer, true);
        store.set_feature(Feature::WaterTracker, false);
        let features = store.settings().features;
        assert!(features.focus_timer);
        assert!(!features.water_tracker);

        store.set_tutorial_step(4);
        let settings = store.complete_tutorial();
        assert!(settings.tutorial_completed);
        assert_eq!(settings.tutorial_step, 0);

        store.set_layout_order(vec!["focus".to_string(), "today".to_string()]);
        store.set_passcode(Some("1234".to_string()));
        store.set_shortcuts(false);
        let settings = store.settings();
        assert_eq!(settings.layout_order.as_deref().map(|l| l.len()), Some(2));
        assert_eq!(settings.passcode.as_deref(), Some("1234"));
        assert!(!settings.shortcuts);
    }

    #[test]
    fn test_without_runtime_days_write_through() {
        let (backend, store) = memory_store();
        store.update_today(DayPatch::text(DayField::Remember, "now"));
        let persisted = stored_days(&backend).unwrap();
        assert_eq!(persisted["2024-06-05"]["remember"], "now");
    }
}
