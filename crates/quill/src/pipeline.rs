//! Orchestration: extraction, ordering, validation, execution and report.

use std::fmt;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use quill_config::Config;
use tracing::{debug, info};

use crate::action::Action;
use crate::cache::{ActionCache, PathCache, PipelineCacheStats, digest_text};
use crate::error::PipelineError;
use crate::executor::{
    ActionExecutor, CommandRunner, ExecutionSettings, Report, ShellCommandRunner,
};
use crate::extract::{ActionExtractor, ExtensionPredicate};
use crate::fs::{FileSystem, OsFileSystem};
use crate::imports::{ImportExtractor, TreeSitterImportExtractor};
use crate::paths;
use crate::safety::{CommandRiskAssessor, CommandSafetyChecker};

const PIPELINE_TARGET: &str = "quill::pipeline";

/// Turns model output into workspace mutations.
///
/// A pipeline is built once by the host and shared; `process` may be called
/// from several threads at once. The only state that outlives a call is the
/// pair of bounded caches.
pub struct Pipeline {
    config: Config,
    extractor: ActionExtractor,
    file_system: Arc<dyn FileSystem>,
    runner: Arc<dyn CommandRunner>,
    safety: CommandSafetyChecker,
    imports: Option<Arc<dyn ImportExtractor>>,
    action_cache: ActionCache,
    path_cache: PathCache,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("safety", &self.safety)
            .field("imports", &self.imports.is_some())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a pipeline with production collaborators.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::builder(config).build()
    }

    /// Starts a builder for a pipeline with custom collaborators.
    #[must_use]
    pub fn builder(config: Config) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    /// Returns the configuration the pipeline was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Extracts, orders and executes every directive in `text`.
    ///
    /// `workspace_root` overrides the configured root. Malformed input never
    /// fails; a report with `total_actions == 0` means nothing was
    /// recognised.
    ///
    /// # Errors
    /// Returns [`PipelineError::MissingWorkspaceRoot`] when no root is given
    /// or configured, and [`PipelineError::InvalidWorkspaceRoot`] when the
    /// root is not absolute.
    pub fn process(
        &self,
        text: &str,
        workspace_root: Option<&Utf8Path>,
    ) -> Result<Report, PipelineError> {
        let root = self.resolve_root(workspace_root)?;
        let actions = self.extract(text);
        debug!(
            target: PIPELINE_TARGET,
            root = %root,
            actions = actions.len(),
            "extracted directives"
        );

        let mut executor = ActionExecutor::new(
            &root,
            self.file_system.as_ref(),
            self.runner.as_ref(),
            &self.safety,
            ExecutionSettings::from_config(&self.config),
        )
        .with_path_cache(&self.path_cache);
        if let Some(imports) = &self.imports {
            executor = executor.with_import_extractor(imports.as_ref());
        }

        let outcomes = executor.execute(&actions);
        let report = Report::build(text, &actions, outcomes);
        info!(
            target: PIPELINE_TARGET,
            total_actions = report.total_actions,
            success_count = report.success_count,
            error_count = report.error_count,
            "processed directives"
        );
        Ok(report)
    }

    /// Extracts the directives in `text`, consulting the action cache.
    #[must_use]
    pub fn extract(&self, text: &str) -> Arc<Vec<Action>> {
        let key = digest_text(text);
        if let Some(actions) = self.action_cache.get(&key) {
            return actions;
        }
        let actions = Arc::new(self.extractor.extract(text));
        self.action_cache.insert(key, Arc::clone(&actions));
        actions
    }

    /// Returns hit, miss and eviction counters for both caches.
    #[must_use]
    pub fn cache_stats(&self) -> PipelineCacheStats {
        PipelineCacheStats {
            actions: self.action_cache.stats(),
            paths: self.path_cache.stats(),
        }
    }

    fn resolve_root(&self, supplied: Option<&Utf8Path>) -> Result<Utf8PathBuf, PipelineError> {
        let root = supplied
            .or_else(|| self.config.workspace_root())
            .ok_or(PipelineError::MissingWorkspaceRoot)?;
        if root.as_str().trim().is_empty() {
            return Err(PipelineError::MissingWorkspaceRoot);
        }
        if !root.is_absolute() {
            return Err(PipelineError::invalid_root(root, "the root must be absolute"));
        }
        Ok(paths::normalize(".", root).into_path())
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    config: Config,
    extractor: ActionExtractor,
    file_system: Arc<dyn FileSystem>,
    runner: Arc<dyn CommandRunner>,
    assessor: Option<Arc<dyn CommandRiskAssessor>>,
    imports: Option<Arc<dyn ImportExtractor>>,
}

impl PipelineBuilder {
    fn new(config: Config) -> Self {
        Self {
            config,
            extractor: ActionExtractor::new(),
            file_system: Arc::new(OsFileSystem),
            runner: Arc::new(ShellCommandRunner),
            assessor: None,
            imports: Some(Arc::new(TreeSitterImportExtractor)),
        }
    }

    /// Uses `file_system` for every mutation.
    #[must_use]
    pub fn file_system(mut self, file_system: Arc<dyn FileSystem>) -> Self {
        self.file_system = file_system;
        self
    }

    /// Uses `runner` for `run-command` directives.
    #[must_use]
    pub fn command_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Consults `assessor` for commands the denylist lets through.
    #[must_use]
    pub fn risk_assessor(mut self, assessor: Arc<dyn CommandRiskAssessor>) -> Self {
        self.assessor = Some(assessor);
        self
    }

    /// Orders file creation with `imports` instead of tree-sitter.
    #[must_use]
    pub fn import_extractor(mut self, imports: Arc<dyn ImportExtractor>) -> Self {
        self.imports = Some(imports);
        self
    }

    /// Creates files strictly in extraction order.
    #[must_use]
    pub fn without_import_extractor(mut self) -> Self {
        self.imports = None;
        self
    }

    /// Replaces the predicate that drops extension-only file names.
    #[must_use]
    pub fn extension_predicate(mut self, predicate: ExtensionPredicate) -> Self {
        self.extractor = self
            .extractor
            .with_extension_predicate(move |basename: &str| predicate(basename));
        self
    }

    /// Finishes the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        let safety = self
            .assessor
            .map_or_else(CommandSafetyChecker::new, CommandSafetyChecker::with_assessor);
        Pipeline {
            action_cache: ActionCache::new("actions", self.config.action_cache_capacity()),
            path_cache: PathCache::new("paths", self.config.path_cache_capacity()),
            config: self.config,
            extractor: self.extractor,
            file_system: self.file_system,
            runner: self.runner,
            safety,
            imports: self.imports,
        }
    }
}
