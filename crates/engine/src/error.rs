use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while constructing or invoking a task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Required options were absent after configuration and overrides were merged.
    #[error("{task} requires the options ({}) and no values were provided", .missing.join(","))]
    Options { task: String, missing: Vec<String> },

    /// The task needs an org session and none was attached.
    #[error(
        "This task requires a salesforce org. Use org default <name> to set a default org or pass the org name with the --org option"
    )]
    RequiresOrg,

    #[error("failed to refresh org credentials: {0:#}")]
    Credentials(#[source] anyhow::Error),

    #[error("could not enter working directory {}: {source}", .path.display())]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any error raised by the task's own hooks or body.
    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}
