use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use crate::CodeBlock;
use crate::ExecOptions;
use crate::Filter;
use crate::InterpreterExecutor;
use crate::InterpreterProfile;
use crate::Language;
use crate::MdocConfig;
use crate::MdocError;
use crate::MdocResult;
use crate::PipelineOptions;
use crate::Segment;
use crate::ShellExecutor;
use crate::UNSUPPORTED_LANGUAGE_MESSAGE;
use crate::scan;

/// Replaces every executable block with its echoed source and captured
/// result.
///
/// Interpreter sessions started while processing a document are shut down
/// before [`Filter::run`] returns, whether the run succeeded or not.
#[derive(Debug)]
pub struct ExecuteCodeFilter {
	no_exec: bool,
	workspace: PathBuf,
	shell: ShellExecutor,
	profiles: BTreeMap<String, InterpreterProfile>,
	interpreters: BTreeMap<String, InterpreterExecutor>,
}

impl ExecuteCodeFilter {
	/// `workspace` is the directory code runs in when a block has no
	/// `--path`, and the base relative `--path` values are resolved against.
	pub fn new(options: &PipelineOptions, config: &MdocConfig, workspace: &Path) -> Self {
		let profiles = config.interpreter_profiles();
		let interpreters = profiles
			.iter()
			.map(|(name, profile)| {
				(
					name.clone(),
					InterpreterExecutor::new(name.clone(), profile.clone()),
				)
			})
			.collect();

		Self {
			no_exec: options.no_exec,
			workspace: workspace.to_path_buf(),
			shell: ShellExecutor::new(config.shell.clone()),
			profiles,
			interpreters,
		}
	}

	/// Which executor handles `tag`.
	pub fn language(&self, tag: &str) -> Language {
		Language::resolve(tag, &self.profiles)
	}

	/// The persistent executor registered under `name`.
	pub fn interpreter(&self, name: &str) -> Option<&InterpreterExecutor> {
		self.interpreters.get(name)
	}

	/// Shut down every running interpreter session.
	pub fn stop_sessions(&mut self) {
		for executor in self.interpreters.values_mut() {
			executor.stop();
		}
	}

	/// Render one block: the echoed source, then the result.
	pub fn render_block(&mut self, block: &CodeBlock) -> String {
		let options = block.exec_options();
		let mut out = String::new();

		if !options.no_code {
			out.push_str("```");
			out.push_str(&block.language);
			out.push('\n');
			out.push_str(&block.body);
			out.push_str("```\n\n");
		}

		if self.no_exec {
			return out;
		}

		// Run even when the result is hidden; the block may set up state for
		// later blocks.
		let result = self.execute(block, &options);

		if !options.no_echo {
			if options.raw {
				out.push_str(&result);
			} else {
				out.push_str("```\n");
				out.push_str(&result);
				out.push_str("\n```\n");
			}
		}

		out
	}

	/// Execute a block and return its output, or the text that stands in for
	/// it when it cannot run.
	fn execute(&mut self, block: &CodeBlock, options: &ExecOptions) -> String {
		let dir = self.working_dir(options);

		let result = match self.language(&block.language) {
			Language::Shell => self.shell.execute(&block.body, &dir),
			Language::Interpreter(name) => {
				match self.interpreters.get_mut(&name) {
					Some(executor) => executor.execute(&block.body, &dir),
					None => Ok(UNSUPPORTED_LANGUAGE_MESSAGE.to_string()),
				}
			}
			Language::Unsupported(tag) => {
				tracing::warn!(language = %tag, "no executor for code block");
				Ok(UNSUPPORTED_LANGUAGE_MESSAGE.to_string())
			}
		};

		result.unwrap_or_else(|e: MdocError| {
			tracing::error!(language = %block.language, error = %e, "code block failed");
			format!("ERROR: {e}")
		})
	}

	fn working_dir(&self, options: &ExecOptions) -> PathBuf {
		match &options.path {
			Some(path) => self.workspace.join(path),
			None => self.workspace.clone(),
		}
	}
}

impl Filter for ExecuteCodeFilter {
	fn name(&self) -> &'static str {
		"exec"
	}

	fn run(&mut self, document: &str) -> MdocResult<String> {
		let mut out = String::with_capacity(document.len());

		for segment in scan(document) {
			match segment {
				Segment::Literal(text) => out.push_str(text),
				Segment::Code(block) => {
					tracing::debug!(language = %block.language, options = ?block.options, "found code block");
					out.push_str(&self.render_block(&block));
				}
			}
		}

		self.stop_sessions();

		Ok(out)
	}
}
