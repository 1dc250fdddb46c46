use serde::{Deserialize, Serialize};

/// Label used when no filter narrows the scope.
pub const DEFAULT_FILTER_LABEL: &str = "all (entire project)";

/// What the bot is currently working over.
///
/// Exactly one variant is populated. Graph links are kept beside the variant
/// because they are reported independently of it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScopeTree {
    #[serde(flatten)]
    pub variant: ScopeVariant,
    #[serde(default, skip_serializing_if = "GraphLinks::is_empty")]
    pub links: GraphLinks,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScopeVariant {
    AllFiles {
        filter: String,
    },
    ExplicitFiles {
        files: Vec<FileEntry>,
    },
    StoryHierarchy {
        epics: Vec<Epic>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<String>,
    },
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::all_files(None)
    }
}

impl ScopeTree {
    pub fn all_files(filter: Option<String>) -> Self {
        Self {
            variant: ScopeVariant::AllFiles {
                filter: filter
                    .filter(|f| !f.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FILTER_LABEL.to_string()),
            },
            links: GraphLinks::default(),
        }
    }

    pub fn with_links(mut self, links: GraphLinks) -> Self {
        self.links = links;
        self
    }

    pub fn variant_name(&self) -> &'static str {
        match self.variant {
            ScopeVariant::AllFiles { .. } => "all_files",
            ScopeVariant::ExplicitFiles { .. } => "explicit_files",
            ScopeVariant::StoryHierarchy { .. } => "story_hierarchy",
        }
    }

    pub fn epics(&self) -> &[Epic] {
        match &self.variant {
            ScopeVariant::StoryHierarchy { epics, .. } => epics,
            _ => &[],
        }
    }

    pub fn files(&self) -> &[FileEntry] {
        match &self.variant {
            ScopeVariant::ExplicitFiles { files } => files,
            _ => &[],
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Story-graph and story-map references shown alongside any scope.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
}

impl GraphLinks {
    pub fn is_empty(&self) -> bool {
        self.graph.is_none() && self.map.is_none()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub kind: FileKind,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Source,
    Document,
    Data,
    #[default]
    Other,
}

impl FileKind {
    /// Classify a path by its extension (case-insensitive).
    pub fn from_path(path: &str) -> Self {
        let ext = match path.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => {
                ext.to_ascii_lowercase()
            }
            _ => return Self::Other,
        };
        match ext.as_str() {
            "rs" | "py" | "js" | "ts" | "tsx" | "jsx" | "java" | "go" | "rb" | "cs" | "cpp"
            | "c" | "h" | "kt" | "swift" => Self::Source,
            "md" | "txt" | "rst" | "adoc" => Self::Document,
            "json" | "yaml" | "yml" | "toml" | "csv" | "xml" => Self::Data,
            _ => Self::Other,
        }
    }

    /// Parse an explicit kind label. Unknown labels are `None` so callers can
    /// fall back to the extension.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "source" | "code" | "test" => Some(Self::Source),
            "document" | "doc" | "docs" | "story" | "markdown" => Some(Self::Document),
            "data" | "config" => Some(Self::Data),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Epic {
    pub name: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// A sub-epic. Features nest to any depth.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_link: Option<String>,
    /// `None` marks a leaf; `Some` is never empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<Feature>>,
    #[serde(default)]
    pub stories: Vec<Story>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Story {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_file: Option<String>,
    #[serde(default)]
    pub story_file_exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_link: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenarios: Vec<Scenario>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_link: Option<String>,
}

impl Epic {
    pub fn story_count(&self) -> usize {
        self.features.iter().map(Feature::story_count).sum()
    }
}

impl Feature {
    pub fn nested(&self) -> &[Feature] {
        self.features.as_deref().unwrap_or_default()
    }

    pub fn is_leaf(&self) -> bool {
        self.features.is_none()
    }

    /// Stories in this feature and every nested feature.
    pub fn story_count(&self) -> usize {
        self.stories.len() + self.nested().iter().map(Feature::story_count).sum::<usize>()
    }
}
