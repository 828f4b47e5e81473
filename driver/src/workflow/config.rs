use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use disturbcore::prelude::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("change_points")
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// JSON pixel stack; when absent the generator block is used.
    #[serde(default)]
    pub stack: Option<PathBuf>,
    #[serde(default)]
    pub generator: Option<GeneratorConfig>,
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            output_dir: default_output_dir(),
            stack: None,
            generator: None,
            bind: default_bind(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(output_dir: Option<PathBuf>, stack: Option<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.unwrap_or_else(default_output_dir),
            stack,
            ..Default::default()
        }
    }

    /// Applies command-line overrides on top of a loaded config.
    pub fn with_overrides(
        mut self,
        output_dir: Option<PathBuf>,
        stack: Option<PathBuf>,
        bind: Option<SocketAddr>,
    ) -> Self {
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        if stack.is_some() {
            self.stack = stack;
        }
        if let Some(addr) = bind {
            self.bind = addr;
        }
        self
    }

    pub fn pipeline_config(&self) -> &PipelineConfig {
        &self.pipeline
    }
}
