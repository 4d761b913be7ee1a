#![forbid(unsafe_code)]

//! Core: stimulus grids, swap permutations, and response scoring.
//!
//! # Role in swapgrid
//! `swapgrid-core` holds the pure parts of the position-change task. It
//! builds the item grid for a level, draws the constrained permutation that
//! moves pairs of items, and scores a participant's selection. Nothing here
//! owns a clock or a thread; `swapgrid-runtime` drives these pieces through
//! the study, response, and feedback phases.
//!
//! # Primary responsibilities
//! - **Level**: the 1..=5 difficulty ladder and the grid shape it implies.
//! - **Generator**: sampling distinct assets into a fresh grid.
//! - **SwapPlan**: moving `k` items in pairs so each one changes position.
//! - **Evaluation**: `max(0, correct - incorrect)` plus a pass policy.
//! - **Trial**: one grid's lifecycle from generation to [`LevelResult`].
//! - **EngineConfig**: timings and policies loaded from TOML or JSON.

pub mod asset;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod generator;
pub mod item;
pub mod level;
pub mod swap;
pub mod trial;

pub use asset::{AssetProvider, AssetRef, ImageCatalog, ShapeAssets};
pub use config::EngineConfig;
pub use error::{ConfigError, EngineError, Result};
pub use evaluate::{Evaluation, PassPolicy, evaluate};
pub use generator::generate_items;
pub use item::{Item, ItemId, Position};
pub use level::{DEFAULT_COLUMNS, Level, MAX_COLUMNS, MAX_LEVEL};
pub use swap::{Move, SwapOutcome, SwapPlan};
pub use trial::{LevelResult, Trial};
