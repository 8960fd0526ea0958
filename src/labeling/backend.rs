use crate::config::{BackendKind, Config};
use crate::error::{ChapterizeError, Result};
use crate::labeling::local::LocalBackend;
use crate::labeling::remote::RemoteBackend;
use crate::pipeline::types::LabelSegment;
use crate::process::{CommandRunner, SystemCommandRunner};
use std::sync::Arc;

/// Trait for turning a labeling prompt into chapter labels.
///
/// This trait allows swapping implementations (remote service, local model, mock).
/// Implementations recover from timeouts and malformed model output themselves
/// and return an empty list for them; an `Err` means the request itself failed.
pub trait LabelBackend: Send + Sync {
    /// Label the transcript chunk described by `prompt`.
    fn label(&self, prompt: &str) -> Result<Vec<LabelSegment>>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Implement LabelBackend for Arc<T> so one backend can be shared across runs.
impl<T: LabelBackend + ?Sized> LabelBackend for Arc<T> {
    fn label(&self, prompt: &str) -> Result<Vec<LabelSegment>> {
        (**self).label(prompt)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Build the backend selected by `config`.
pub fn create_backend(config: &Config) -> Result<Arc<dyn LabelBackend>> {
    create_backend_with_runner(config, Arc::new(SystemCommandRunner::new()))
}

/// Build the backend selected by `config`, running local models through `runner`.
pub fn create_backend_with_runner(
    config: &Config,
    runner: Arc<dyn CommandRunner>,
) -> Result<Arc<dyn LabelBackend>> {
    match config.backend_kind() {
        BackendKind::Remote => {
            let backend = RemoteBackend::new(config.remote.clone())?;
            tracing::info!(model = %config.remote.model, "using remote labeling backend");
            Ok(Arc::new(backend))
        }
        BackendKind::Local => {
            tracing::info!(command = %config.local.command, "using local labeling backend");
            Ok(Arc::new(LocalBackend::new(config.local.clone(), runner)))
        }
    }
}

/// Mock backend for testing
#[derive(Debug, Clone)]
pub struct MockBackend {
    name: String,
    response: Vec<LabelSegment>,
    should_fail: bool,
}

impl MockBackend {
    /// Create a mock that returns no labels
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            response: Vec::new(),
            should_fail: false,
        }
    }

    /// Configure the mock to return specific labels
    pub fn with_response(mut self, labels: Vec<LabelSegment>) -> Self {
        self.response = labels;
        self
    }

    /// Configure the mock to fail on every call
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl LabelBackend for MockBackend {
    fn label(&self, _prompt: &str) -> Result<Vec<LabelSegment>> {
        if self.should_fail {
            Err(ChapterizeError::BackendRequest {
                message: "mock labeling failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
