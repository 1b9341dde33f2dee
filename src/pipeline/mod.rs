// src/pipeline/mod.rs

//! Pipeline compositions over the supervision engine.
//!
//! - [`abaqus`] is the single-stage composition: a fixed
//!   pre_process → execute → post_process → read_back_results order around
//!   one supervised solver run.
//! - [`openfoam`] generalizes to three ordered lists of named stages
//!   (preprocess, solve, postprocess), each backed by an external tool
//!   invocation and optional user hooks.
//! - [`stage`] holds the stage description shared by the multi-stage
//!   variant.

pub mod abaqus;
pub mod openfoam;
pub mod stage;

pub use abaqus::AbaqusPipeline;
pub use openfoam::OpenFoamPipeline;
pub use stage::{StageHook, StageRole, StageSpec};
