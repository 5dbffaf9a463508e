use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::MdocError;
use crate::MdocResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["mdoc.toml", ".mdoc.toml", ".config/mdoc.toml"];

/// Name of the interpreter profile that is always available.
pub const BUILTIN_INTERPRETER: &str = "matlab";

/// Placeholder replaced by the profile sentinel in `echo` commands.
const SENTINEL_PLACEHOLDER: &str = "{sentinel}";
/// Placeholder replaced by the target directory in `chdir` commands.
const DIR_PLACEHOLDER: &str = "{dir}";

/// Options shared by every filter of a single pipeline run.
///
/// Built once per invocation from the command line and handed to each filter
/// by reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
	/// Echo code blocks but never run them.
	pub no_exec: bool,
	/// Emit a progress line before and after each filter.
	pub verbose: bool,
	/// Append the blank-line collapsing filter to the standard pipeline.
	pub collapse_blank_lines: bool,
}

/// Configuration loaded from an `mdoc.toml` file.
///
/// ```toml
/// [shell]
/// program = "bash"
///
/// [interpreters.octave]
/// command = "octave"
/// args = ["--no-gui", "--quiet", "--interactive"]
/// prompt = ">> "
/// echo = "disp(\"{sentinel}\")"
/// comment = "%"
/// chdir = "cd('{dir}')"
/// timeout_secs = 120
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MdocConfig {
	/// Settings for the one-shot shell executor.
	#[serde(default)]
	pub shell: ShellConfig,
	/// Persistent interpreter profiles keyed by language tag. Entries here
	/// are merged over the built-in profiles.
	#[serde(default)]
	pub interpreters: BTreeMap<String, InterpreterProfile>,
}

/// Settings for the transient shell executor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellConfig {
	/// Program that receives the joined command line.
	#[serde(default = "default_shell_program")]
	pub program: String,
	/// Arguments placed before the joined command line.
	#[serde(default = "default_shell_args")]
	pub args: Vec<String>,
}

impl Default for ShellConfig {
	fn default() -> Self {
		Self {
			program: default_shell_program(),
			args: default_shell_args(),
		}
	}
}

fn default_shell_program() -> String {
	if cfg!(windows) {
		"cmd".to_string()
	} else {
		"sh".to_string()
	}
}

fn default_shell_args() -> Vec<String> {
	if cfg!(windows) {
		vec!["/C".to_string()]
	} else {
		vec!["-c".to_string()]
	}
}

/// Describes how to drive one kind of interactive interpreter over its
/// standard streams.
///
/// The session writes `echo` (with `{sentinel}` substituted) after every
/// request and reads until a line containing `prompt` immediately followed by
/// `sentinel` shows up.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterpreterProfile {
	/// Executable to spawn.
	pub command: String,
	/// Arguments for the executable.
	#[serde(default)]
	pub args: Vec<String>,
	/// Extra language tags that select this profile.
	#[serde(default)]
	pub aliases: Vec<String>,
	/// Prompt printed by the interpreter before it evaluates a line. Leading
	/// prompts are stripped from output lines and prompt-only lines dropped.
	#[serde(default)]
	pub prompt: String,
	/// Marker echoed back to detect the end of a response.
	#[serde(default = "default_sentinel")]
	pub sentinel: String,
	/// Command that prints the sentinel. `{sentinel}` is substituted.
	pub echo: String,
	/// Line comment marker stripped from source lines before sending.
	#[serde(default)]
	pub comment: Option<String>,
	/// Joins statements into one logical input line.
	#[serde(default = "default_separator")]
	pub separator: String,
	/// Command that changes the interpreter's directory. `{dir}` is
	/// substituted. Without it `--path` has no effect on this interpreter.
	#[serde(default)]
	pub chdir: Option<String>,
	/// Maximum seconds to wait for the sentinel. Absent means no limit.
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	/// Seconds to wait for a clean exit after closing stdin before the child
	/// is killed.
	#[serde(default = "default_shutdown_timeout_secs")]
	pub shutdown_timeout_secs: u64,
}

fn default_sentinel() -> String {
	"#########".to_string()
}

fn default_separator() -> String {
	",".to_string()
}

fn default_shutdown_timeout_secs() -> u64 {
	10
}

impl InterpreterProfile {
	/// The MATLAB command-line interpreter, driven without its desktop.
	pub fn matlab() -> Self {
		Self {
			command: "matlab".to_string(),
			args: vec![
				"-nosplash".to_string(),
				"-nodesktop".to_string(),
				"-nodisplay".to_string(),
			],
			aliases: vec!["MATLAB".to_string(), "Matlab".to_string()],
			prompt: ">> ".to_string(),
			sentinel: default_sentinel(),
			echo: format!("disp(\"{SENTINEL_PLACEHOLDER}\")"),
			comment: Some("%".to_string()),
			separator: default_separator(),
			chdir: Some(format!("cd('{DIR_PLACEHOLDER}')")),
			timeout_secs: None,
			shutdown_timeout_secs: default_shutdown_timeout_secs(),
		}
	}

	/// The command that makes the interpreter print its sentinel.
	pub fn echo_command(&self) -> String {
		self.echo.replace(SENTINEL_PLACEHOLDER, &self.sentinel)
	}

	/// The line that marks the end of a response: the prompt directly
	/// followed by the sentinel.
	pub fn ready_marker(&self) -> String {
		format!("{}{}", self.prompt, self.sentinel)
	}

	/// The directory-change command for `dir`, if the profile supports one.
	pub fn chdir_command(&self, dir: &Path) -> Option<String> {
		self.chdir
			.as_ref()
			.map(|template| template.replace(DIR_PLACEHOLDER, &dir.display().to_string()))
	}

	pub fn timeout(&self) -> Option<Duration> {
		self.timeout_secs.map(Duration::from_secs)
	}

	pub fn shutdown_timeout(&self) -> Duration {
		Duration::from_secs(self.shutdown_timeout_secs)
	}

	/// Whether `tag` names this profile, either as `name` or an alias.
	pub fn matches(&self, name: &str, tag: &str) -> bool {
		name == tag || self.aliases.iter().any(|alias| alias == tag)
	}
}

impl MdocConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no candidate exists.
	pub fn load(root: &Path) -> MdocResult<Option<MdocConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_file(&config_path).map(Some)
	}

	/// Load the config from an explicit file.
	pub fn load_file(path: &Path) -> MdocResult<MdocConfig> {
		let content = std::fs::read_to_string(path).map_err(|e| {
			MdocError::ReadInput {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})?;

		Self::from_toml(&content)
	}

	/// Parse config from TOML text.
	pub fn from_toml(content: &str) -> MdocResult<MdocConfig> {
		toml::from_str(content).map_err(|e| MdocError::ConfigParse(e.to_string()))
	}

	/// All interpreter profiles: the built-in ones overlaid with the
	/// configured entries.
	pub fn interpreter_profiles(&self) -> BTreeMap<String, InterpreterProfile> {
		let mut profiles = BTreeMap::new();
		profiles.insert(BUILTIN_INTERPRETER.to_string(), InterpreterProfile::matlab());

		for (name, profile) in &self.interpreters {
			profiles.insert(name.clone(), profile.clone());
		}

		profiles
	}
}
