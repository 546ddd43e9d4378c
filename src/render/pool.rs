use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::foundation::error::CardResult;
use crate::render::surface::Surface;

/// Pool configuration.
#[derive(Debug, Clone, Copy)]
pub struct ContextPoolOpts {
    /// Maximum number of surfaces checked out at once. Further checkouts block.
    pub max_contexts: usize,
}

impl Default for ContextPoolOpts {
    fn default() -> Self {
        Self { max_contexts: 4 }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContextPoolStats {
    /// Surfaces currently checked out.
    pub live: usize,
    /// Idle surfaces retained for reuse.
    pub idle: usize,
    /// Surfaces allocated over the pool's lifetime.
    pub allocated: u64,
    /// Checkouts served by an idle surface.
    pub reused: u64,
    /// Checkouts that had to wait for a release.
    pub waited: u64,
}

struct PoolState {
    idle: Vec<Surface>,
    live: usize,
    stats: ContextPoolStats,
}

/// Bounded pool of drawing surfaces.
///
/// Each checkout hands out a surface no other render holds. Idle surfaces are keyed by device size;
/// a surface of the wrong size is dropped and reallocated rather than resized.
pub struct ContextPool {
    opts: ContextPoolOpts,
    state: Mutex<PoolState>,
    released: Condvar,
}

impl std::fmt::Debug for ContextPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextPool")
            .field("opts", &self.opts)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ContextPool {
    pub fn new(opts: ContextPoolOpts) -> Self {
        Self {
            opts: ContextPoolOpts {
                max_contexts: opts.max_contexts.max(1),
            },
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                live: 0,
                stats: ContextPoolStats::default(),
            }),
            released: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check out a surface of `width x height` device pixels prepared for `dpi`, blocking while
    /// `max_contexts` surfaces are live.
    pub fn checkout(&self, width: u32, height: u32, dpi: f64) -> CardResult<PooledSurface<'_>> {
        let mut st = self.lock();
        let mut waited = false;
        while st.live >= self.opts.max_contexts {
            waited = true;
            st = self
                .released
                .wait(st)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if waited {
            st.stats.waited += 1;
        }
        st.live += 1;

        let surface = st
            .idle
            .iter()
            .position(|s| s.size() == (width, height))
            .map(|i| st.idle.swap_remove(i));
        if surface.is_some() {
            st.stats.reused += 1;
        }
        drop(st);

        let mut surface = match surface {
            Some(s) => s,
            None => match Surface::new(width, height) {
                Ok(s) => {
                    self.lock().stats.allocated += 1;
                    s
                }
                Err(e) => {
                    self.give_back(None);
                    return Err(e);
                }
            },
        };
        surface.begin(dpi);
        tracing::debug!(width, height, dpi, "checked out surface");
        Ok(PooledSurface {
            pool: self,
            surface: Some(surface),
        })
    }

    fn give_back(&self, surface: Option<Surface>) {
        let mut st = self.lock();
        st.live = st.live.saturating_sub(1);
        if let Some(s) = surface {
            if st.idle.len() >= self.opts.max_contexts {
                st.idle.remove(0);
            }
            st.idle.push(s);
        }
        drop(st);
        self.released.notify_one();
    }

    /// Drop every idle surface. Live surfaces are unaffected and return to the pool normally.
    pub fn drain(&self) -> usize {
        let mut st = self.lock();
        let n = st.idle.len();
        st.idle.clear();
        n
    }

    pub fn stats(&self) -> ContextPoolStats {
        let st = self.lock();
        ContextPoolStats {
            live: st.live,
            idle: st.idle.len(),
            ..st.stats.clone()
        }
    }

    pub fn opts(&self) -> ContextPoolOpts {
        self.opts
    }
}

/// Checked-out surface. Returned to its pool on drop, on every exit path.
pub struct PooledSurface<'a> {
    pool: &'a ContextPool,
    surface: Option<Surface>,
}

impl std::ops::Deref for PooledSurface<'_> {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        // Only `Drop` takes the surface out.
        self.surface.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl std::ops::DerefMut for PooledSurface<'_> {
    fn deref_mut(&mut self) -> &mut Surface {
        self.surface.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledSurface<'_> {
    fn drop(&mut self) {
        self.pool.give_back(self.surface.take());
        tracing::debug!("released surface");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pool.rs"]
mod tests;
