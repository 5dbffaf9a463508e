use std::path::Path;

use crate::BlankLineFilter;
use crate::CommentFilter;
use crate::ExecuteCodeFilter;
use crate::Filter;
use crate::IncludeFilter;
use crate::MdocConfig;
use crate::MdocResult;
use crate::PipelineOptions;
use crate::TocFilter;

/// An ordered sequence of filters. The output of each filter is the input of
/// the next.
pub struct Pipeline {
	filters: Vec<Box<dyn Filter>>,
	verbose: bool,
}

impl std::fmt::Debug for Pipeline {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Pipeline")
			.field("filters", &self.filter_names())
			.field("verbose", &self.verbose)
			.finish()
	}
}

impl Pipeline {
	/// Create an empty pipeline.
	pub fn new(options: &PipelineOptions) -> Self {
		Self {
			filters: Vec::new(),
			verbose: options.verbose,
		}
	}

	/// Build the standard document pipeline: comments, includes, table of
	/// contents, code execution and, when requested, blank-line collapsing.
	///
	/// `base_dir` is the directory include paths are resolved against and the
	/// directory code runs in.
	pub fn standard(options: &PipelineOptions, config: &MdocConfig, base_dir: &Path) -> Self {
		Self::with_workspace(options, config, base_dir, base_dir)
	}

	/// Like [`Pipeline::standard`], but code blocks run in `workspace` and
	/// their `--path` options are resolved against it, while includes stay
	/// relative to `base_dir`.
	pub fn with_workspace(
		options: &PipelineOptions,
		config: &MdocConfig,
		base_dir: &Path,
		workspace: &Path,
	) -> Self {
		let mut pipeline = Self::new(options);
		pipeline
			.add_filter(CommentFilter)
			.add_filter(IncludeFilter::new(base_dir))
			.add_filter(TocFilter)
			.add_filter(ExecuteCodeFilter::new(options, config, workspace));

		if options.collapse_blank_lines {
			pipeline.add_filter(BlankLineFilter);
		}

		pipeline
	}

	/// Append a filter to the end of the pipeline.
	pub fn add_filter(&mut self, filter: impl Filter + 'static) -> &mut Self {
		self.filters.push(Box::new(filter));
		self
	}

	/// Names of the filters in execution order.
	pub fn filter_names(&self) -> Vec<&'static str> {
		self.filters.iter().map(|filter| filter.name()).collect()
	}

	pub fn len(&self) -> usize {
		self.filters.len()
	}

	pub fn is_empty(&self) -> bool {
		self.filters.is_empty()
	}

	/// Fold `document` through every filter in order.
	pub fn run(&mut self, document: &str) -> MdocResult<String> {
		let mut current = document.to_string();

		for filter in &mut self.filters {
			let name = filter.name();
			if self.verbose {
				tracing::info!(filter = name, bytes = current.len(), "running filter");
			}

			current = filter.run(&current)?;

			if self.verbose {
				tracing::info!(filter = name, bytes = current.len(), "filter done");
			}
		}

		Ok(current)
	}
}
