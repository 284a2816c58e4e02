//! # Inflation Cache
//!
//! Inflated grids are stored on disk under a key derived from the content of the raw grid and
//! the inflation parameters, so a cached grid is only ever reused for the exact map it was
//! computed from. Cached files are verified on load and any problem causes the grid to be
//! recomputed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{inflate, CellState, InflatedGrid, MapError, MapParams, OccupancyGrid};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A directory of cached inflated grids.
#[derive(Debug, Clone)]
pub struct InflationCache {
    dir: PathBuf,
}

/// On-disk form of a cached grid.
#[derive(Serialize, Deserialize)]
struct CachedInflation {
    key: String,
    width: usize,
    height: usize,
    resolution_m: f64,
    pixel_buffer: usize,
    cells: Vec<i8>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl InflationCache {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Compute the cache key for the raw grid and inflation parameters.
    ///
    /// This is the hex encoded SHA-256 of the grid shape, resolution, inflation parameters and
    /// every raw cell value.
    pub fn key(raw: &OccupancyGrid, params: &MapParams) -> String {
        let mut hasher = Sha256::new();

        hasher.update((raw.width() as u64).to_le_bytes());
        hasher.update((raw.height() as u64).to_le_bytes());
        hasher.update(raw.resolution_m().to_bits().to_le_bytes());
        hasher.update(params.robot_size_m.to_bits().to_le_bytes());
        hasher.update(params.inflation_ratio.to_bits().to_le_bytes());
        hasher.update([params.unknown_is_occupied as u8]);

        let cells: Vec<u8> = raw.cells().iter().map(|c| c.to_raw() as u8).collect();
        hasher.update(&cells);

        format!("{:x}", hasher.finalize())
    }

    /// Path of the cache file for the given key.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Load the cached inflation of the raw grid.
    ///
    /// Returns `Ok(None)` if there is no cached grid, or an error if the cached file can't be read
    /// or doesn't match the raw grid.
    pub fn load(
        &self,
        raw: &OccupancyGrid,
        params: &MapParams,
    ) -> Result<Option<InflatedGrid>, MapError> {
        let key = Self::key(raw, params);
        let path = self.path_for(&key);

        let s = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MapError::CacheIo(e)),
        };

        let cached: CachedInflation =
            serde_json::from_str(&s).map_err(MapError::CacheDeserialize)?;

        cached.into_grid(&key, raw).map(Some)
    }

    /// Store the inflated grid in the cache, returning the path it was written to.
    pub fn store(
        &self,
        raw: &OccupancyGrid,
        params: &MapParams,
        grid: &InflatedGrid,
    ) -> Result<PathBuf, MapError> {
        let key = Self::key(raw, params);
        let path = self.path_for(&key);

        let cached = CachedInflation {
            key,
            width: grid.width(),
            height: grid.height(),
            resolution_m: grid.resolution_m(),
            pixel_buffer: grid.pixel_buffer(),
            cells: grid.cells().iter().map(|c| c.to_raw()).collect(),
        };

        let s = serde_json::to_string(&cached).map_err(MapError::CacheSerialize)?;

        fs::create_dir_all(&self.dir).map_err(MapError::CacheIo)?;
        fs::write(&path, s).map_err(MapError::CacheIo)?;

        Ok(path)
    }

    /// Get the inflated grid from the cache, inflating and storing it if it isn't cached or the
    /// cached copy can't be trusted.
    ///
    /// Cache problems are logged and never fail the call, only invalid inflation parameters do.
    pub fn load_or_inflate(
        &self,
        raw: &OccupancyGrid,
        params: &MapParams,
    ) -> Result<InflatedGrid, MapError> {
        match self.load(raw, params) {
            Ok(Some(grid)) => {
                info!("Loaded inflated map from cache ({:?})", self.dir);
                return Ok(grid);
            }
            Ok(None) => debug!("No cached inflation for this map"),
            Err(e) => warn!("Ignoring cached inflation: {}", e),
        }

        let grid = inflate(raw, params)?;

        match self.store(raw, params, &grid) {
            Ok(path) => debug!("Inflated map cached at {:?}", path),
            Err(e) => warn!("Couldn't cache the inflated map: {}", e),
        }

        Ok(grid)
    }
}

impl CachedInflation {
    /// Verify this cached grid against the requested key and raw grid and convert it.
    fn into_grid(self, key: &str, raw: &OccupancyGrid) -> Result<InflatedGrid, MapError> {
        if self.key != key {
            return Err(MapError::CacheMismatch(format!(
                "stored key {} doesn't match {}",
                self.key, key
            )));
        }
        if self.width != raw.width() || self.height != raw.height() {
            return Err(MapError::CacheMismatch(format!(
                "cached shape {}x{} doesn't match map shape {}x{}",
                self.width,
                self.height,
                raw.width(),
                raw.height()
            )));
        }
        let cells = self.cells.into_iter().map(CellState::from_raw).collect();
        let cells = Array2::from_shape_vec((self.height, self.width), cells)
            .map_err(|e| MapError::CacheMismatch(format!("bad cell data: {}", e)))?;

        // Resolution is covered by the key
        Ok(InflatedGrid::from_parts(
            cells,
            raw.resolution_m(),
            self.pixel_buffer,
        ))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("plan_lib_inflation_cache_{}", name));
        fs::remove_dir_all(&dir).ok();
        dir
    }

    fn raw_grid() -> OccupancyGrid {
        let mut raw = OccupancyGrid::new_free(40, 30, 0.05).unwrap();
        raw.add_obstacle((10, 12), (15, 20));
        raw
    }

    #[test]
    fn test_key() {
        let params = MapParams::default();
        let raw = raw_grid();

        let key = InflationCache::key(&raw, &params);
        assert_eq!(key.len(), 64);
        assert_eq!(key, InflationCache::key(&raw.clone(), &params));

        let mut other = raw.clone();
        other.set(20, 20, CellState::Occupied);
        assert_ne!(key, InflationCache::key(&other, &params));

        let other_params = MapParams {
            inflation_ratio: 1.5,
            ..MapParams::default()
        };
        assert_ne!(key, InflationCache::key(&raw, &other_params));
    }

    #[test]
    fn test_store_and_load() {
        let dir = test_dir("store_and_load");
        let cache = InflationCache::new(&dir);
        let params = MapParams::default();
        let raw = raw_grid();

        assert!(cache.load(&raw, &params).unwrap().is_none());

        let grid = cache.load_or_inflate(&raw, &params).unwrap();
        assert_eq!(grid, inflate(&raw, &params).unwrap());

        let loaded = cache.load(&raw, &params).unwrap().unwrap();
        assert_eq!(loaded, grid);

        // A different map must not pick up the cached grid
        let mut other = raw.clone();
        other.set(25, 30, CellState::Occupied);
        assert!(cache.load(&other, &params).unwrap().is_none());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_rejects_mismatch() {
        let dir = test_dir("rejects_mismatch");
        let cache = InflationCache::new(&dir);
        let params = MapParams::default();
        let raw = raw_grid();
        let key = InflationCache::key(&raw, &params);

        // Plant a grid from a different map under this map's key
        let other = OccupancyGrid::new_free(20, 20, 0.05).unwrap();
        let other_grid = inflate(&other, &params).unwrap();
        let planted = CachedInflation {
            key: key.clone(),
            width: other_grid.width(),
            height: other_grid.height(),
            resolution_m: other_grid.resolution_m(),
            pixel_buffer: other_grid.pixel_buffer(),
            cells: other_grid.cells().iter().map(|c| c.to_raw()).collect(),
        };
        fs::create_dir_all(&dir).unwrap();
        fs::write(cache.path_for(&key), serde_json::to_string(&planted).unwrap()).unwrap();

        assert!(matches!(
            cache.load(&raw, &params),
            Err(MapError::CacheMismatch(_))
        ));

        // The grid is recomputed and the bad file replaced
        let grid = cache.load_or_inflate(&raw, &params).unwrap();
        assert_eq!(grid, inflate(&raw, &params).unwrap());
        assert_eq!(cache.load(&raw, &params).unwrap(), Some(grid));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_rejects_corrupt() {
        let dir = test_dir("rejects_corrupt");
        let cache = InflationCache::new(&dir);
        let params = MapParams::default();
        let raw = raw_grid();
        let key = InflationCache::key(&raw, &params);

        fs::create_dir_all(&dir).unwrap();
        fs::write(cache.path_for(&key), "{\"key\": ").unwrap();

        assert!(matches!(
            cache.load(&raw, &params),
            Err(MapError::CacheDeserialize(_))
        ));
        assert_eq!(
            cache.load_or_inflate(&raw, &params).unwrap(),
            inflate(&raw, &params).unwrap()
        );

        fs::remove_dir_all(&dir).ok();
    }
}
