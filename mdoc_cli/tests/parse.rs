mod common;

use common::write_file;
use mdoc_core::AnyEmptyResult;

#[cfg(unix)]
#[test]
fn parse_runs_full_pipeline_to_stdout() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(tmp.path(), "snippet.txt", "line1\nSTART\ninside\nEND\nline2\n");
	let input = write_file(
		tmp.path(),
		"doc.mdoc",
		"# Title\n<!-- hidden -->\n[TOC]\n@[ini=START,end=END](snippet.txt)\n```sh exec --raw --no-code\necho from-shell\n```\n",
	);

	common::mdoc_cmd()
		.arg("parse")
		.arg(&input)
		.assert()
		.success()
		.stdout("# Title\n\n* [Title](#title)\n\ninside\nfrom-shell\n");

	Ok(())
}

#[test]
fn parse_md_writes_sibling_markdown() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = write_file(tmp.path(), "guide.mdoc", "```sh exec\necho hi\n```\n");

	common::mdoc_cmd()
		.arg("parse")
		.arg(&input)
		.arg("--md")
		.arg("--no-exec")
		.assert()
		.success()
		.stdout("");

	let output = std::fs::read_to_string(tmp.path().join("guide.md"))?;
	assert_eq!(output, "```sh\necho hi\n```\n\n");

	Ok(())
}

#[test]
fn parse_output_flag_writes_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = write_file(tmp.path(), "doc.mdoc", "kept<!-- dropped -->\n");
	let output = tmp.path().join("out.md");

	common::mdoc_cmd()
		.arg("parse")
		.arg(&input)
		.arg("-o")
		.arg(&output)
		.assert()
		.success();

	assert_eq!(std::fs::read_to_string(&output)?, "kept\n");

	Ok(())
}

#[test]
fn parse_intro_collapses_blank_lines() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = write_file(tmp.path(), "doc.mdoc", "a\n\nb\n");

	common::mdoc_cmd()
		.arg("parse")
		.arg(&input)
		.arg("--intro")
		.assert()
		.success()
		.stdout("a\nb\n");

	Ok(())
}

#[test]
fn parse_missing_input_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::mdoc_cmd()
		.arg("parse")
		.arg(tmp.path().join("missing.mdoc"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to read input"));

	Ok(())
}

#[test]
fn parse_missing_include_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = write_file(tmp.path(), "doc.mdoc", "@[](nowhere.txt)\n");

	common::mdoc_cmd()
		.arg("parse")
		.arg(&input)
		.assert()
		.code(2)
		.stderr(predicates::str::contains("cannot include `nowhere.txt`"));

	Ok(())
}

#[test]
fn parse_discovers_config_next_to_input() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(tmp.path(), "mdoc.toml", "[shell]\nprogram = \"mdoc-missing-shell\"\n");
	let input = write_file(tmp.path(), "doc.mdoc", "```sh exec --no-code\necho hi\n```\n");

	common::mdoc_cmd()
		.arg("parse")
		.arg(&input)
		.assert()
		.success()
		.stdout(predicates::str::contains("ERROR: failed to run shell command"));

	Ok(())
}

#[cfg(unix)]
#[test]
fn parse_uses_explicit_config_interpreters() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config = write_file(
		tmp.path(),
		"settings/repl.toml",
		r##"
[interpreters.shrepl]
command = "sh"
sentinel = "__DONE__"
echo = "echo '{sentinel}'"
comment = "#"
separator = "; "
chdir = "cd '{dir}'"
timeout_secs = 10
shutdown_timeout_secs = 1
"##,
	);
	let input = write_file(
		tmp.path(),
		"doc.mdoc",
		"```shrepl exec --no-code --no-echo\nX=persisted # kept across blocks\n```\n```shrepl exec --no-code --raw\necho $X\n```\n",
	);

	common::mdoc_cmd()
		.arg("--config")
		.arg(&config)
		.arg("parse")
		.arg(&input)
		.assert()
		.success()
		.stdout("persisted");

	Ok(())
}

#[test]
fn parse_rejects_invalid_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(tmp.path(), "mdoc.toml", "[shell]\nprogramme = \"bash\"\n");
	let input = write_file(tmp.path(), "doc.mdoc", "text\n");

	common::mdoc_cmd()
		.arg("parse")
		.arg(&input)
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}

#[test]
fn verbose_logs_filters_to_stderr() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let input = write_file(tmp.path(), "doc.mdoc", "text\n");

	common::mdoc_cmd()
		.arg("-v")
		.arg("parse")
		.arg(&input)
		.arg("--no-exec")
		.assert()
		.success()
		.stdout("text\n")
		.stderr(predicates::str::contains("running filter"));

	Ok(())
}

#[test]
fn missing_subcommand_fails() {
	common::mdoc_cmd()
		.assert()
		.code(1)
		.stderr(predicates::str::contains("No subcommand specified"));
}

#[cfg(unix)]
#[test]
fn parse_runs_code_in_invocation_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path().canonicalize()?;
	std::fs::create_dir(root.join("sub"))?;
	write_file(&root, "docs/part.txt", "from docs\n");
	write_file(
		&root,
		"docs/a.mdoc",
		"@[](part.txt)\n```sh exec --no-code --raw --path sub\npwd\n```\n```sh exec --no-code --raw\npwd\n```\n",
	);

	common::mdoc_cmd()
		.current_dir(&root)
		.arg("parse")
		.arg("docs/a.mdoc")
		.assert()
		.success()
		.stdout(predicates::str::diff(format!(
			"from docs\n{}\n{}\n",
			root.join("sub").display(),
			root.display()
		)));

	Ok(())
}
