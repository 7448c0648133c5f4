use std::borrow::Cow;
use std::collections::BTreeMap;

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Deserialize;
use serde::Serialize;

/// Key of the layout used for groups without their own entry.
pub const DEFAULT_LAYOUT_KEY: &str = "default";

/// Prefix of Windows extended-length paths, which must keep their
/// backslashes.
const EXTENDED_LENGTH_PREFIX: &str = r"\\?\";

/// Map a document group to the module path of its layout component.
pub trait LayoutResolver {
	/// Returns `None` when the group has no layout.
	fn resolve(&self, group: &str) -> Option<String>;
}

impl<F> LayoutResolver for F
where
	F: Fn(&str) -> Option<String>,
{
	fn resolve(&self, group: &str) -> Option<String> {
		self(group)
	}
}

/// Layouts keyed by document group, with [`DEFAULT_LAYOUT_KEY`] as the
/// fallback for groups that have no entry.
///
/// ```toml
/// [layouts]
/// default = "src/components/layout.js"
/// posts = "src/components/post-layout.js"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefaultLayouts(pub BTreeMap<String, String>);

impl DefaultLayouts {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, group: impl Into<String>, layout: impl Into<String>) -> Self {
		self.0.insert(group.into(), layout.into());
		self
	}
}

impl LayoutResolver for DefaultLayouts {
	fn resolve(&self, group: &str) -> Option<String> {
		self.0
			.get(group)
			.or_else(|| self.0.get(DEFAULT_LAYOUT_KEY))
			.cloned()
	}
}

impl<const N: usize> From<[(&str, &str); N]> for DefaultLayouts {
	fn from(entries: [(&str, &str); N]) -> Self {
		Self(
			entries
				.into_iter()
				.map(|(group, layout)| (group.to_string(), layout.to_string()))
				.collect(),
		)
	}
}

/// Convert a path to forward slashes. Extended-length Windows paths are
/// returned unchanged.
pub fn slash(path: &str) -> Cow<'_, str> {
	if path.starts_with(EXTENDED_LENGTH_PREFIX) || !path.contains('\\') {
		return Cow::Borrowed(path);
	}

	Cow::Owned(path.replace('\\', "/"))
}
