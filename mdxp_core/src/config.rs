use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::MdxpError;
use crate::MdxpResult;
use crate::front_matter::FrontMatterOptions;
use crate::layout::DefaultLayouts;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["mdxp.toml", ".mdxp.toml", ".config/mdxp.toml"];

/// Configuration loaded from an `mdxp.toml` file.
///
/// ```toml
/// [layouts]
/// default = "src/components/layout.js"
/// posts = "src/components/post-layout.js"
///
/// [front_matter]
/// delimiter = "---"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MdxpConfig {
	/// Layout component per content group. `default` applies to every group
	/// without its own entry.
	#[serde(default)]
	pub layouts: DefaultLayouts,
	#[serde(default)]
	pub front_matter: FrontMatterOptions,
}

impl MdxpConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is no config file.
	pub fn load(root: &Path) -> MdxpResult<Option<MdxpConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;

		tracing::trace!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}

	/// Parse config file content.
	pub fn parse(content: &str) -> MdxpResult<MdxpConfig> {
		let config: MdxpConfig =
			toml::from_str(content).map_err(|e| MdxpError::ConfigParse(e.to_string()))?;

		if config.front_matter.delimiter.trim().is_empty() {
			return Err(MdxpError::ConfigParse(
				"`front_matter.delimiter` must not be empty".to_string(),
			));
		}

		Ok(config)
	}
}
