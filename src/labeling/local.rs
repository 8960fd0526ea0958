//! Local subprocess labeling backend (e.g. `ollama run llama3`).
//!
//! The prompt goes to the child's stdin; stdout is parsed as a label array.
//! A timeout or unparseable output is returned as an error for the
//! dispatcher to record.

use crate::config::LocalConfig;
use crate::error::Result;
use crate::labeling::backend::LabelBackend;
use crate::labeling::parse::labels_from_response;
use crate::pipeline::types::LabelSegment;
use crate::process::CommandRunner;
use std::sync::Arc;

pub struct LocalBackend {
    config: LocalConfig,
    runner: Arc<dyn CommandRunner>,
}

impl LocalBackend {
    pub fn new(config: LocalConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }
}

impl LabelBackend for LocalBackend {
    fn label(&self, prompt: &str) -> Result<Vec<LabelSegment>> {
        let output = self.runner.run(
            &self.config.command,
            &self.config.args,
            Some(prompt),
            Some(self.config.timeout()),
        )?;

        tracing::debug!(response = %output.stdout, "raw local model response");
        labels_from_response(&self.config.command, &output.stdout)
    }

    fn name(&self) -> &str {
        &self.config.command
    }
}
