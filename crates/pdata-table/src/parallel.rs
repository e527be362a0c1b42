//! Worker pool for bulk column-type conversion.
//!
//! Applying a dictionary table to a large table converts every column through its text form.
//! Each column is independent, so the work splits one task per column.

use crate::column::ColumnData;

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use rayon::prelude::*;
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use rayon::ThreadPool;
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use std::sync::OnceLock;

/// Tables with more rows than this convert column types on a worker pool.
pub const PARALLEL_ROW_THRESHOLD: usize = 100_000;

/// Pool used for column conversion, built on first use.
///
/// `None` when no pool could be built; conversions then run on the calling thread.
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
static RAYON_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
fn desired_rayon_threads() -> usize {
    let from_env = std::env::var("RAYON_NUM_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0);
    from_env.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    })
}

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
fn build_rayon_pool() -> Option<ThreadPool> {
    let requested = desired_rayon_threads().max(1);
    let try_build = |n| rayon::ThreadPoolBuilder::new().num_threads(n).build();

    match try_build(requested) {
        Ok(pool) => Some(pool),
        Err(_) if requested > 1 => try_build(1).ok(),
        Err(_) => None,
    }
}

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
fn rayon_pool() -> Option<&'static ThreadPool> {
    RAYON_POOL.get_or_init(build_rayon_pool).as_ref()
}

/// Run `f(index, column)` on every column.
///
/// Large tables fan out one task per column; each task owns a disjoint column, so no
/// synchronization is needed beyond joining them all.
pub(crate) fn for_each_column<F>(columns: &mut [ColumnData], row_count: usize, f: F)
where
    F: Fn(usize, &mut ColumnData) + Send + Sync,
{
    if row_count > PARALLEL_ROW_THRESHOLD && columns.len() > 1 && try_parallel(columns, &f) {
        return;
    }
    for (col, column) in columns.iter_mut().enumerate() {
        f(col, column);
    }
}

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
fn try_parallel<F>(columns: &mut [ColumnData], f: &F) -> bool
where
    F: Fn(usize, &mut ColumnData) + Send + Sync,
{
    let Some(pool) = rayon_pool() else {
        log::warn!(
            "no worker pool available; converting {} columns sequentially",
            columns.len()
        );
        return false;
    };
    log::debug!(
        "converting {} columns on {} worker threads",
        columns.len(),
        pool.current_num_threads()
    );
    pool.install(|| {
        columns
            .par_iter_mut()
            .enumerate()
            .for_each(|(col, column)| f(col, column));
    });
    true
}

#[cfg(not(all(feature = "parallel", not(target_arch = "wasm32"))))]
fn try_parallel<F>(_columns: &mut [ColumnData], _f: &F) -> bool
where
    F: Fn(usize, &mut ColumnData) + Send + Sync,
{
    false
}
