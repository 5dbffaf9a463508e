use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MdocError {
	#[error(transparent)]
	#[diagnostic(code(mdoc::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to read input `{path}`: {reason}")]
	#[diagnostic(code(mdoc::read_input))]
	ReadInput { path: String, reason: String },

	#[error("cannot include `{path}`: {reason}")]
	#[diagnostic(
		code(mdoc::include_not_found),
		help("include paths are resolved relative to the directory of the document")
	)]
	IncludeNotFound { path: String, reason: String },

	#[error("invalid include options: `{0}`")]
	#[diagnostic(
		code(mdoc::invalid_include_options),
		help("supported options are `ini=<marker>` and `end=<marker>`, separated by commas")
	)]
	InvalidIncludeOptions(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mdoc::config_parse),
		help("check that mdoc.toml is valid TOML with [shell] and/or [interpreters.<name>] tables")
	)]
	ConfigParse(String),

	#[error("failed to start interpreter `{name}`: {reason}")]
	#[diagnostic(
		code(mdoc::interpreter_spawn),
		help("make sure the interpreter command is installed and on PATH")
	)]
	InterpreterSpawn { name: String, reason: String },

	#[error("interpreter `{name}` exited before acknowledging the request")]
	#[diagnostic(
		code(mdoc::interpreter_exited),
		help("the session is restarted on the next code block")
	)]
	InterpreterExited { name: String },

	#[error("interpreter `{name}` did not respond within {seconds}s")]
	#[diagnostic(
		code(mdoc::interpreter_timeout),
		help("raise `timeout_secs` for this interpreter in mdoc.toml")
	)]
	InterpreterTimeout { name: String, seconds: u64 },

	#[error("failed to talk to interpreter `{name}`: {reason}")]
	#[diagnostic(code(mdoc::interpreter_io))]
	InterpreterIo { name: String, reason: String },

	#[error("failed to run shell command: {0}")]
	#[diagnostic(code(mdoc::shell_spawn))]
	ShellSpawn(String),

	#[error("invalid exclude pattern: {0}")]
	#[diagnostic(code(mdoc::invalid_exclude_pattern))]
	InvalidExcludePattern(String),
}

pub type MdocResult<T> = Result<T, MdocError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
