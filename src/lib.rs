#![warn(clippy::pedantic)]

use std::path::PathBuf;

pub mod cli;
pub mod elasticsearch;
pub mod http_server;
pub mod kubernetes;
pub mod metrics;
pub mod otel;
pub mod prometheus_rule;

/*
 * ============================================================================
 * Error
 * ============================================================================
 */
#[derive(Debug)]
pub enum Error {
    Create {
        kind: String,
        name: String,
        source: kube::Error,
    },
    Kube(kube::Error),
    MissingObjectKey(&'static str),
    RuleFile {
        path: PathBuf,
        source: prometheus_rule::RuleFileError,
    },
    Update {
        kind: String,
        name: String,
        source: kube::Error,
    },
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Create { source, .. } | Error::Update { source, .. } | Error::Kube(source) => {
                Some(source)
            }
            Error::MissingObjectKey(_) => None,
            Error::RuleFile { source, .. } => Some(source),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Create { kind, name, source } => {
                write!(f, "failed to create {kind} {name}: {source}")
            }
            Error::Kube(e) => write!(f, "kube: {e}"),
            Error::MissingObjectKey(key) => write!(f, "missing object key: {key}"),
            Error::RuleFile { path, source } => {
                write!(
                    f,
                    "failed to build rule spec from {}: {source}",
                    path.display()
                )
            }
            Error::Update { kind, name, source } => {
                write!(f, "failed to update {kind} {name}: {source}")
            }
        }
    }
}

/*
 * ============================================================================
 * Result
 * ============================================================================
 */
pub type Result<T, E = Error> = std::result::Result<T, E>;
