use std::path::PathBuf;

/// Errors raised while building the authorization model and tuples.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A role subject id matched no entry of the subject catalog.
    #[error("subject '{subject}' assigned on device '{device}' does not match any user or group")]
    AmbiguousSubject {
        /// The unresolvable subject id.
        subject: String,
        /// Device whose role referenced the subject.
        device: String,
    },

    /// A device family has no capability catalog entry.
    #[error("device family '{family}' is not defined in the capability catalog")]
    UnknownFamily {
        /// The family as written in the device configuration.
        family: String,
    },

    /// A device produced no relation statements at all.
    #[error("device '{device}' has no roles, actions or catalog defaults")]
    EmptyRelations {
        /// Offending device id.
        device: String,
    },

    /// Two device rows share the same id.
    #[error("device '{device}' is configured more than once")]
    DuplicateDevice {
        /// Repeated device id.
        device: String,
    },

    /// An identifier cannot be used as an `OpenFGA` type or object id.
    #[error("invalid identifier '{value}' in {field}: {reason}")]
    InvalidIdentifier {
        /// Where the identifier was found (e.g. `groups.uid`).
        field: String,
        /// The offending value.
        value: String,
        /// Why the identifier was rejected.
        reason: String,
    },

    /// A device id is absent from every type mapping entry.
    #[error("device '{device}' was not assigned a canonical type")]
    UnmappedInstance {
        /// Device id that could not be resolved.
        device: String,
    },

    /// Output file name rejected before writing.
    #[error("invalid output name '{name}': {reason}")]
    InvalidOutputName {
        /// Rejected name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },

    /// Malformed JSON input.
    #[error("invalid {context} JSON: {source}")]
    Json {
        /// Which input was being decoded.
        context: &'static str,
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem failure while reading inputs or writing artifacts.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn json(context: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Error::Json { context, source }
    }

    /// Wrap an I/O failure on `path`, for use with `map_err`.
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}
