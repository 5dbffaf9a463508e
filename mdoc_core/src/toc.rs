use std::sync::LazyLock;

use regex::Regex;

use crate::Filter;
use crate::MdocResult;

/// Token replaced by the generated table of contents.
pub const TOC_MARKER: &str = "[TOC]";

static HEADING_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(#{1,5}) (.*)$").expect("heading pattern is valid"));

/// Replaces the first `[TOC]` with a nested list of links to the document's
/// headings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TocFilter;

impl Filter for TocFilter {
	fn name(&self) -> &'static str {
		"toc"
	}

	fn run(&mut self, document: &str) -> MdocResult<String> {
		Ok(insert_toc(document))
	}
}

/// A markdown ATX heading between levels 1 and 5.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
	pub level: usize,
	pub title: String,
}

pub fn insert_toc(document: &str) -> String {
	if !document.contains(TOC_MARKER) {
		return document.to_string();
	}

	let headings = find_headings(document);
	tracing::debug!(headings = headings.len(), "building table of contents");
	document.replacen(TOC_MARKER, &render_toc(&headings), 1)
}

/// Collect headings in document order. Lines inside fenced code blocks are
/// skipped, so shell comments are not mistaken for headings.
pub fn find_headings(document: &str) -> Vec<Heading> {
	let mut headings = Vec::new();
	let mut in_fence = false;

	for line in document.lines() {
		let trimmed = line.trim_start();
		if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
			in_fence = !in_fence;
			continue;
		}

		if in_fence {
			continue;
		}

		if let Some(caps) = HEADING_PATTERN.captures(line) {
			headings.push(Heading {
				level: caps[1].len(),
				title: caps[2].trim_end().to_string(),
			});
		}
	}

	headings
}

/// Anchor used by GitHub for a heading: lowercase, spaces become hyphens and
/// periods are dropped.
pub fn slugify(title: &str) -> String {
	title.replace(' ', "-").replace('.', "").to_lowercase()
}

/// One list item per heading, indented with a tab per level below the first.
pub fn render_toc(headings: &[Heading]) -> String {
	let mut toc = String::new();

	for heading in headings {
		for _ in 1..heading.level {
			toc.push('\t');
		}
		toc.push_str(&format!("* [{}](#{})\n", heading.title, slugify(&heading.title)));
	}

	toc
}
