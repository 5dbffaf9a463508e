use std::path::Path;
use std::path::PathBuf;

use crate::InterpreterProfile;
use crate::MdocConfig;

pub const SHELL_REPL: &str = "shrepl";

/// A persistent interpreter backed by `sh` reading commands from stdin. It
/// speaks the same sentinel protocol as the built-in profiles without
/// needing anything beyond a POSIX shell.
pub fn shell_repl_profile() -> InterpreterProfile {
	InterpreterProfile {
		command: "sh".to_string(),
		args: vec![],
		aliases: vec!["shell-repl".to_string()],
		prompt: String::new(),
		sentinel: "__MDOC_SENTINEL__".to_string(),
		echo: "echo '{sentinel}'".to_string(),
		comment: Some("#".to_string()),
		separator: "; ".to_string(),
		chdir: Some("cd '{dir}'".to_string()),
		timeout_secs: Some(10),
		shutdown_timeout_secs: 1,
	}
}

/// An `sh` loop that writes `>> ` without a line break before evaluating
/// each line, the way MATLAB and other REPLs print their prompt.
pub fn prompt_repl_profile() -> InterpreterProfile {
	InterpreterProfile {
		command: "sh".to_string(),
		args: vec![
			"-c".to_string(),
			"while IFS= read -r line; do printf '>> '; eval \"$line\"; done".to_string(),
		],
		aliases: vec![],
		prompt: ">> ".to_string(),
		sentinel: "#########".to_string(),
		echo: "echo '{sentinel}'".to_string(),
		comment: Some("#".to_string()),
		separator: "; ".to_string(),
		chdir: Some("cd '{dir}'".to_string()),
		timeout_secs: Some(10),
		shutdown_timeout_secs: 1,
	}
}

pub fn shell_repl_config() -> MdocConfig {
	let mut config = MdocConfig::default();
	config
		.interpreters
		.insert(SHELL_REPL.to_string(), shell_repl_profile());
	config
}

pub fn workspace() -> tempfile::TempDir {
	tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"))
}

/// Canonical path of `dir`, matching what `pwd` prints after a `cd`.
pub fn canonical(dir: &Path) -> PathBuf {
	dir.canonicalize()
		.unwrap_or_else(|e| panic!("canonicalize {}: {e}", dir.display()))
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
	let path = dir.join(name);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir: {e}"));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {name}: {e}"));
	path
}

pub const MATLAB_SNIPPET: &str = "\
a = 0;
%% 1
x = 1;
y = 2;
%%
b = 3;
";
