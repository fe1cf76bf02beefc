//! # Petri 网核心定义（Place/Transition Net）
//!
//! 设库所集合 `P` 与迁移集合 `T`，输入/输出映射 `Pre, Post ∈ ℕ^{|P|×|T|}`。
//! 对任意标识 `M ∈ ℕ^{|P|}`，迁移 `t` 可激发当且仅当 `∀p: M[p] ≥ Pre[p, t]`，
//! 发射后 `M' = M - Pre[:, t] + Post[:, t]`。
//!
//! 提供的核心 API 支持可激发集计算、单步发射、可达图构造以及
//! JSON/DOT/APT 文本输出。

pub mod core;
pub mod incidence;
pub mod index;
pub mod io;
pub mod reachability;
pub mod structure;

pub use core::{FireError, Net};
pub use incidence::Incidence;
pub use index::{EventId, Idx, IndexVec, PlaceId, TransitionId};
pub use reachability::{ReachabilityConfig, ReachabilityGraph};
pub use structure::{Marking, Place, Transition, Weight};
