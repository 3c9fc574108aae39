//! class-shell - typed command shells bound to a host type
//!
//! Commands are declared once on a [`Program`], with an explicit [`Signature`] per
//! command, and compiled against every host value passed to [`Program::instantiate`].
//! The resulting [`Cli`] is driven either programmatically or as an interactive shell
//! with completion and live validation.
//!
//! ## Call chain
//! Declaration -> Registry -> Compile (per instance) -> Session -> Resolve -> Invoke
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use class_shell::{Annotation, Param, Program, Signature, Value};
//!
//! let mut builder = Program::<i64>::builder("counter").version("1.0");
//! builder
//!     .operation("add", Signature::new().with(Param::new("n").annotated(Annotation::int())), |cli, args| {
//!         *cli.host_mut() += args.int("n").unwrap_or(0);
//!         Ok(Value::Int(*cli.host()))
//!     })
//!     .unwrap();
//! let program = builder.build();
//!
//! let mut cli = program.instantiate(0).unwrap();
//! assert_eq!(cli.execute(&["add", "2"]).unwrap(), Some(Value::Int(2)));
//! assert_eq!(cli.call("add", vec![Value::Int(3)]).unwrap(), Value::Int(5));
//! ```

// Core error handling
pub mod error;

// Declaration and compilation
pub mod compiler;
pub mod program;
pub mod registry;

// Line handling
pub mod reserved;
pub mod resolver;
pub mod tokenizer;

// Runtime
pub mod console;
pub mod help;
pub mod session;
pub mod settings;

// Interactive assistance
pub mod completion;
pub mod status;
pub mod terminal;

// Configuration and logging
pub mod config;

pub use compiler::{CompiledCommand, CompiledSet};
pub use completion::Candidate;
pub use config::{init_tracing, ShellConfig};
pub use console::{Capture, Console};
pub use error::{BindingError, CliError, CliResult, InputError, ResolveError, StructuralError};
pub use program::{Program, ProgramBuilder, ProgramInfo};
pub use registry::{CommandKind, Execution, KindTag, Outcome, Validation};
pub use resolver::Arguments;
pub use session::{Attribute, Cli, Delegation, Flow, SessionRef, Shell};
pub use status::{LineError, StatusLine};
pub use terminal::{LineSource, ScriptedInput, SharedInput, Terminal};

pub use shell_types::{Annotation, Coercion, Param, Signature, SignatureError, Value};
