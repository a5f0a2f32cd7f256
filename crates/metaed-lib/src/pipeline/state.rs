use std::fmt;

/// Where a pipeline run currently is.
///
/// `Validating`, `Enhancing` and `Generating` repeat once per plugin; a run
/// ends in `OutputWritten` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Initialized,
    PluginsLoaded,
    FilesLoaded,
    ParseTreeBuilt,
    ModelBuilt,
    NamespacesInitialized,
    Validating,
    Enhancing,
    Generating,
    OutputWritten,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::OutputWritten | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialized => "initialized",
            Self::PluginsLoaded => "plugins loaded",
            Self::FilesLoaded => "files loaded",
            Self::ParseTreeBuilt => "parse tree built",
            Self::ModelBuilt => "model built",
            Self::NamespacesInitialized => "namespaces initialized",
            Self::Validating => "validating",
            Self::Enhancing => "enhancing",
            Self::Generating => "generating",
            Self::OutputWritten => "output written",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
