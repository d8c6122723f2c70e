//! Session-lifetime table cache.
//!
//! Each source is loaded at most once per `(SourceKind, canonical path)` and
//! handed out as a shared [`Arc<Table<R>>`]. There is no TTL and no partial
//! invalidation: the cache lives until [`DataManager::reset`] or process
//! exit.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use waste_core::error::{DashboardError, Result};
use waste_core::models::{ForecastRecord, SocioEconomicRecord, Table, WasteRecord, WeatherRecord};
use waste_core::settings::Settings;
use waste_data::reader::{
    discover_sources, load_forecast_data, load_socio_economic_data, load_waste_data,
    load_weather_data, SourceKind, SourcePaths,
};

// ── TableCache ────────────────────────────────────────────────────────────────

/// Loaded tables of one source kind, keyed by canonical path.
struct TableCache<R> {
    kind: SourceKind,
    entries: HashMap<PathBuf, Arc<Table<R>>>,
}

impl<R> TableCache<R> {
    fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    /// Cached table for `path`, loading it on first use. The flag is `true`
    /// when the loader ran.
    fn get_or_load(
        &mut self,
        path: &Path,
        load: fn(&Path) -> Result<Table<R>>,
    ) -> Result<(Arc<Table<R>>, bool)> {
        let key = std::fs::canonicalize(path).map_err(|source| DashboardError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(table) = self.entries.get(&key) {
            tracing::debug!(kind = ?self.kind, path = %key.display(), "table cache hit");
            return Ok((Arc::clone(table), false));
        }

        let table = Arc::new(load(&key)?);
        tracing::debug!(
            kind = ?self.kind,
            path = %key.display(),
            rows = table.len(),
            "table cached"
        );
        self.entries.insert(key, Arc::clone(&table));
        Ok((table, true))
    }

    fn keys(&self) -> impl Iterator<Item = (SourceKind, PathBuf)> + '_ {
        self.entries.keys().map(move |p| (self.kind, p.clone()))
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

// ── DataManager ───────────────────────────────────────────────────────────────

/// Resolves source paths and caches the tables loaded from them.
///
/// # Example
/// ```no_run
/// use waste_data::reader::discover_sources;
/// use waste_runtime::data_manager::DataManager;
///
/// let mut mgr = DataManager::new(discover_sources(std::path::Path::new("data")));
/// let waste = mgr.waste().unwrap();
/// println!("{} rows", waste.len());
/// ```
pub struct DataManager {
    sources: SourcePaths,
    waste: TableCache<WasteRecord>,
    weather: TableCache<WeatherRecord>,
    socio_economic: TableCache<SocioEconomicRecord>,
    forecast: TableCache<ForecastRecord>,
    /// Number of times a loader actually ran.
    loads: usize,
}

impl DataManager {
    pub fn new(sources: SourcePaths) -> Self {
        Self {
            sources,
            waste: TableCache::new(SourceKind::Waste),
            weather: TableCache::new(SourceKind::Weather),
            socio_economic: TableCache::new(SourceKind::SocioEconomic),
            forecast: TableCache::new(SourceKind::Forecast),
            loads: 0,
        }
    }

    /// Discover sources under `settings.data_dir`, then apply the per-source
    /// path overrides.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut sources = discover_sources(&settings.data_dir);
        let overrides = [
            (SourceKind::Waste, &settings.waste_file),
            (SourceKind::Weather, &settings.weather_file),
            (SourceKind::SocioEconomic, &settings.socio_file),
            (SourceKind::Forecast, &settings.forecast_file),
        ];
        for (kind, path) in overrides {
            if let Some(p) = path {
                sources.set(kind, p.clone());
            }
        }
        Self::new(sources)
    }

    // ── Public API ────────────────────────────────────────────────────────

    pub fn sources(&self) -> &SourcePaths {
        &self.sources
    }

    pub fn waste(&mut self) -> Result<Arc<Table<WasteRecord>>> {
        let path = self.sources.require(SourceKind::Waste)?.to_path_buf();
        let (table, loaded) = self.waste.get_or_load(&path, load_waste_data)?;
        self.loads += usize::from(loaded);
        Ok(table)
    }

    pub fn weather(&mut self) -> Result<Arc<Table<WeatherRecord>>> {
        let path = self.sources.require(SourceKind::Weather)?.to_path_buf();
        let (table, loaded) = self.weather.get_or_load(&path, load_weather_data)?;
        self.loads += usize::from(loaded);
        Ok(table)
    }

    pub fn socio_economic(&mut self) -> Result<Arc<Table<SocioEconomicRecord>>> {
        let path = self.sources.require(SourceKind::SocioEconomic)?.to_path_buf();
        let (table, loaded) = self
            .socio_economic
            .get_or_load(&path, load_socio_economic_data)?;
        self.loads += usize::from(loaded);
        Ok(table)
    }

    pub fn forecast(&mut self) -> Result<Arc<Table<ForecastRecord>>> {
        let path = self.sources.require(SourceKind::Forecast)?.to_path_buf();
        let (table, loaded) = self.forecast.get_or_load(&path, load_forecast_data)?;
        self.loads += usize::from(loaded);
        Ok(table)
    }

    /// Drop every cached table.
    pub fn reset(&mut self) {
        self.waste.clear();
        self.weather.clear();
        self.socio_economic.clear();
        self.forecast.clear();
        tracing::debug!("table cache reset");
    }

    /// Keys of all cached tables, sorted.
    pub fn cached_keys(&self) -> Vec<(SourceKind, PathBuf)> {
        let mut keys: Vec<_> = self
            .waste
            .keys()
            .chain(self.weather.keys())
            .chain(self.socio_economic.keys())
            .chain(self.forecast.keys())
            .collect();
        keys.sort();
        keys
    }

    /// How many times a source was read from disk.
    pub fn load_count(&self) -> usize {
        self.loads
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
