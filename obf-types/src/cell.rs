//! The runtime half of a root context: whatever live, mutable state a
//! `VolatileGlobal` or `InvariantMutating` context needs between the
//! moment a value is obfuscated and the moment it's read back.
//!
//! The original design backs these with a process-wide global (a real
//! `volatile`/aliasing trick only meaningful in a single translation
//! unit). Each obfuscated value here instead owns its own cell — spec.md
//! doesn't require sharing across instances, and giving every instance
//! its own `AtomicU64` sidesteps the original's reliance on C-style
//! unsynchronized global mutation, which has no sound equivalent in safe
//! Rust (`DESIGN.md` has the full writeup).

use core::sync::atomic::{AtomicU64, Ordering};

use obf_core::{ContextKind, ContextPlan};

#[inline]
fn load_ordering() -> Ordering {
    if cfg!(feature = "strict-mt") {
        Ordering::Acquire
    } else {
        Ordering::Relaxed
    }
}

#[inline]
fn store_ordering() -> Ordering {
    if cfg!(feature = "strict-mt") {
        Ordering::Release
    } else {
        Ordering::Relaxed
    }
}

/// Per-instance runtime state for a root context. `None` for contexts
/// that don't need one (`Identity`, `AliasedPointer`).
#[derive(Debug)]
pub struct ContextCell {
    state: Option<AtomicU64>,
}

impl ContextCell {
    pub const fn new(plan: &ContextPlan) -> Self {
        let state = match plan.kind {
            ContextKind::VolatileGlobal | ContextKind::InvariantMutating | ContextKind::AntiDebug => {
                Some(AtomicU64::new(plan.initial_cell))
            }
            ContextKind::Identity | ContextKind::AliasedPointer => None,
        };
        ContextCell { state }
    }

    /// Current cell value, or `0` if this context has no cell (the caller
    /// never consults it in that case).
    pub fn load(&self) -> u64 {
        match &self.state {
            Some(a) => a.load(load_ordering()),
            None => 0,
        }
    }

    /// The value to feed into `obf_core::surjection`'s `cell` parameter.
    /// Every kind but `AntiDebug` passes the raw cell straight through;
    /// `AntiDebug`'s live cell holds `cc`, and spec.md §4.3.4 requires the
    /// subtrahend to become `cc * (1 + being_debugged())` — an attached
    /// debugger must actually corrupt the recovered value, not just log a
    /// warning about it.
    pub fn subtrahend_input(&self, plan: &ContextPlan) -> u64 {
        let raw = self.load();
        match plan.kind {
            ContextKind::AntiDebug => {
                let factor = 1u64 + crate::probe::being_debugged() as u64;
                raw.wrapping_mul(factor)
            }
            _ => raw,
        }
    }

    /// Advances an `InvariantMutating` cell to its next value; re-stores
    /// the same value for `VolatileGlobal`/`AntiDebug` so the read in
    /// `load` is a genuine atomic operation rather than something a
    /// same-unit optimizer could fold away; a no-op for every other kind.
    pub fn tick(&self, plan: &ContextPlan) {
        let Some(a) = &self.state else { return };
        match plan.kind {
            ContextKind::InvariantMutating => {
                let mut cur = a.load(load_ordering());
                loop {
                    let next = plan.advance_invariant(cur);
                    match a.compare_exchange_weak(cur, next, store_ordering(), load_ordering()) {
                        Ok(_) => break,
                        Err(observed) => cur = observed,
                    }
                }
            }
            ContextKind::VolatileGlobal | ContextKind::AntiDebug => {
                let cur = a.load(load_ordering());
                a.store(cur, store_ordering());
            }
            _ => {}
        }
    }
}
