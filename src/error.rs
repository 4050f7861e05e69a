use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum IgnitionError {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config from {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("failed to resolve host time zone: {message}")]
    #[diagnostic(help("pass an explicit zone name such as `Europe/Berlin` instead of `local`"))]
    TimeZone { message: String },

    #[error("failed to serialize ignition config")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}
