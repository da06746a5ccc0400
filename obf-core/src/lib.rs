//! Deterministic, seed-driven bijection engine backing the `obf` crate.
//!
//! This crate has no knowledge of `u8`/`u16`/`u32`/`u64` as Rust types, no
//! macros, and no runtime state beyond what callers hand it explicitly: it
//! only builds and walks [`plan::Plan`] trees over an opaque `u64`
//! register masked to an explicit bit width. `obf-types` is where the
//! typed wrappers, the per-instance runtime cells, and the `Unsigned`
//! trait live; `obf-macros` is where call-site seeding happens.
#![cfg_attr(not(feature = "std"), no_std)]

pub mod catalog;
pub mod config;
pub mod consts;
pub mod context;
pub mod descriptor;
pub mod inner;
pub mod plan;
pub mod prng;
pub mod tier;
pub mod width;

pub use consts::GlobalConsts;
pub use context::{ContextKind, ContextPlan};
pub use descriptor::Descriptor;
pub use plan::{build_plan, injection, surjection, Plan, PlanNode};
pub use tier::{exp_cycles, tier_cycles};
