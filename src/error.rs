//! Error handling for class-shell
//!
//! Each phase reports through its own thiserror type and [`CliError`] layers them:
//! - [`StructuralError`] when a command is declared
//! - [`BindingError`] when an instance is constructed
//! - [`InputError`] for one line (or argument vector) of user input
//!
//! Errors raised by command bodies are `anyhow::Error` and travel unmodified
//! inside [`CliError::Command`].

use shell_types::SignatureError;
use thiserror::Error;

use crate::compiler::SignatureAttribute;
use crate::registry::KindTag;
use crate::tokenizer::TokenizeError;

/// Main error type for the shell
#[derive(Error, Debug)]
pub enum CliError {
    #[error("failed to compile command set: {0}")]
    Structural(#[from] StructuralError),

    #[error("failed to initialize CLI instance: {0}")]
    Binding(#[from] BindingError),

    #[error("failed to execute input: {0}")]
    Input(#[from] InputError),

    #[error("internal error: {0}")]
    Internal(String),

    /// Raised by a validation or execution body
    #[error(transparent)]
    Command(anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn is_structural(&self) -> bool {
        matches!(self, CliError::Structural(_))
    }

    pub fn is_binding(&self) -> bool {
        matches!(self, CliError::Binding(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(self, CliError::Input(_))
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CliError::Internal(_))
    }

    pub fn is_command(&self) -> bool {
        matches!(self, CliError::Command(_))
    }

    /// The resolution failure behind an input error, if any
    pub fn resolve_error(&self) -> Option<&ResolveError> {
        match self {
            CliError::Input(InputError::Resolve { source, .. }) => Some(source),
            _ => None,
        }
    }

    /// Downcast an application error raised by a command body
    pub fn command_error<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            CliError::Command(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Declaration-time errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error("{kind} '{name}' conflicts with the {existing} already declared under that name; a command can only have one execution")]
    DuplicateExecution {
        name: String,
        kind: KindTag,
        existing: KindTag,
    },

    #[error("command '{name}' has an invalid signature: {source}")]
    InvalidSignature {
        name: String,
        #[source]
        source: SignatureError,
    },

    #[error("'{name}' is not a usable command name")]
    InvalidName { name: String },
}

/// Instance-construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    #[error("command '{name}' has declared validation but no execution")]
    MissingExecution { name: String },

    #[error("{kind} '{name}' has validation with non matching '{attribute}' ({expected} != {found})")]
    SignatureMismatch {
        kind: KindTag,
        name: String,
        attribute: SignatureAttribute,
        expected: String,
        found: String,
    },

    #[error("delegate '{name}' cannot declare parameters")]
    DelegateArguments { name: String },
}

/// Argument resolution failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("missing required argument '{param}'")]
    MissingArgument { param: String },

    #[error("does not accept extra positional arguments ({})", .extra.join(" "))]
    ExtraPositional { extra: Vec<String> },

    #[error("does not accept keyword arguments ({key}=...)")]
    UnexpectedKeyword { key: String },

    #[error("invalid value for '{param}': {message}")]
    Coercion { param: String, message: String },
}

impl ResolveError {
    /// Wrong number or shape of arguments
    pub fn is_arity(&self) -> bool {
        !self.is_coercion()
    }

    pub fn is_coercion(&self) -> bool {
        matches!(self, ResolveError::Coercion { .. })
    }
}

/// Recoverable failures of one input line
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("'{command}' {source}")]
    Resolve {
        command: String,
        #[source]
        source: ResolveError,
    },

    #[error("unknown command '{name}'{}", .suggestion.as_ref().map(|s| format!(", did you mean '{}'?", s)).unwrap_or_default())]
    UnknownCommand {
        name: String,
        suggestion: Option<String>,
    },

    #[error("'{name}' is not a setting")]
    NotASetting { name: String },

    #[error("'{name}' is a setting, access it with '.set {name}'")]
    SettingNeedsAccess { name: String },

    #[error("missing file path after '{token}'")]
    MissingPath { token: String },

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
}

/// Result type aliases for convenience
pub type CliResult<T> = Result<T, CliError>;
pub type ResolveResult<T> = Result<T, ResolveError>;
