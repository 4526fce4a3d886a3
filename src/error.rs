use thiserror::Error;

/// Errors raised while configuring a run. They all surface in `main`,
/// which reports them on stderr and exits with code 1.
#[derive(Debug, Error)]
pub enum Error {
    /// the instance file could not be read
    #[error("unable to read instance file {path}: {source}")]
    InstanceFile {
        /// path of the missing or unreadable file
        path: String,
        /// underlying I/O error
        source: std::io::Error,
    },
    /// the weight file could not be read
    #[error("unable to read weight file {path}: {source}")]
    WeightFile {
        /// path of the missing or unreadable file
        path: String,
        /// underlying I/O error
        source: std::io::Error,
    },
    /// the instance file exists but does not parse as DIMACS
    #[error("malformed DIMACS instance {path}: {reason}")]
    MalformedInstance {
        /// path of the offending file
        path: String,
        /// what went wrong
        reason: String,
    },
    /// an option name is not one of the accepted values
    #[error("unknown {kind} '{name}', please select one of: {valid}")]
    UnknownName {
        /// which option is wrong (problem, method, local_search, ...)
        kind: &'static str,
        /// the rejected value
        name: String,
        /// accepted values
        valid: &'static str,
    },
    /// a numeric flag did not parse
    #[error("invalid value '{value}' for --{flag}")]
    InvalidValue {
        /// flag name
        flag: &'static str,
        /// rejected value
        value: String,
    },
    /// an output file could not be created
    #[error("error while trying to access {path}: {source}")]
    OutputFile {
        /// path of the output file
        path: String,
        /// underlying I/O error
        source: std::io::Error,
    },
}
