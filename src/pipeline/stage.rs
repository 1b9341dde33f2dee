// src/pipeline/stage.rs

use std::fmt;
use std::path::Path;

use crate::config::model::StageConfig;
use crate::errors::Result;

/// Solve-list sentinel: detect the tool from the case's controlDict.
pub const AUTO_TOOL: &str = "auto";

/// Preprocessor identifier with a dedicated code path: writes the case
/// parameter file and shells out to the case-preparation utility instead of
/// going through the generic supervised runner (the utility misbehaves when
/// driven through it).
pub const CASE_PREPARE_TOOL: &str = "prepareCase";

/// User-supplied hook run before or after a stage, handed the case
/// directory.
pub type StageHook = Box<dyn Fn(&Path) -> Result<()> + Send>;

/// Which ordered list a stage belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRole {
    Preprocess,
    Solve,
    Postprocess,
}

impl fmt::Display for StageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageRole::Preprocess => "preprocess",
            StageRole::Solve => "solve",
            StageRole::Postprocess => "postprocess",
        };
        f.write_str(name)
    }
}

/// One named step in a multi-stage pipeline.
///
/// The tool identifier must be non-empty — a missing tool is a configuration
/// error, never a silent no-op. Hooks are optional and tolerated absent.
pub struct StageSpec {
    pub tool: String,
    pub options: Vec<String>,
    pub pre_func: Option<StageHook>,
    pub post_func: Option<StageHook>,
}

impl StageSpec {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            options: Vec::new(),
            pre_func: None,
            post_func: None,
        }
    }

    pub fn from_config(cfg: &StageConfig) -> Self {
        Self {
            tool: cfg.tool.clone(),
            options: cfg.options.clone(),
            pre_func: None,
            post_func: None,
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_pre_func(mut self, hook: StageHook) -> Self {
        self.pre_func = Some(hook);
        self
    }

    pub fn with_post_func(mut self, hook: StageHook) -> Self {
        self.post_func = Some(hook);
        self
    }
}

impl fmt::Debug for StageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageSpec")
            .field("tool", &self.tool)
            .field("options", &self.options)
            .field("pre_func", &self.pre_func.is_some())
            .field("post_func", &self.post_func.is_some())
            .finish()
    }
}
