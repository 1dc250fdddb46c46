//! Scope tree: all files, an explicit file list, or the story hierarchy.

use crate::text::grammar::{self, EPIC_GLYPH, FEATURE_GLYPH, STORY_GLYPH};
use crate::value::{field, get_array, get_bool, node_name, opt_str, scalar_text, string_list};
use botpanel_core::{
    Epic, Feature, FileEntry, FileKind, GraphLinks, Scenario, ScopeTree, ScopeVariant, Story,
};
use serde_json::Value;
use tracing::trace;

/// Declared scope types that select an explicit file list.
const FILE_SCOPE_TYPES: &[&str] = &["files", "file_list", "file"];

/// Label keys for free-text scope lines.
const FILTER_KEYS: &[&str] = &["filter:"];

// ── Link resolution ──

/// `base#identifier`, replacing any fragment already on `base`.
fn fragment_link(base: Option<&str>, identifier: Option<&str>) -> Option<String> {
    let base = base?;
    let identifier = identifier?;
    let file = base.split_once('#').map_or(base, |(file, _)| file);
    Some(format!("{file}#{identifier}"))
}

/// A feature's own link: explicit link first, then its own test file.
fn feature_link(v: &Value) -> Option<String> {
    opt_str(v, "test_link").or_else(|| opt_str(v, "test_file"))
}

// ── Structured payload ──

pub(crate) fn scope_from_value(scope: Option<&Value>) -> ScopeTree {
    let Some(scope) = scope.filter(|s| s.is_object()) else {
        return ScopeTree::default();
    };
    let links = graph_links_from_value(field(scope, "links"));
    let filter = field(scope, "filter").and_then(filter_label);
    let declared = opt_str(scope, "type")
        .unwrap_or_default()
        .to_ascii_lowercase();

    if FILE_SCOPE_TYPES.contains(&declared.as_str()) {
        let files = get_array(scope, "files")
            .iter()
            .filter_map(file_entry_from_value)
            .collect();
        return ScopeTree {
            variant: ScopeVariant::ExplicitFiles { files },
            links,
        };
    }

    let epics = field(scope, "story_graph")
        .map(|graph| get_array(graph, "epics"))
        .unwrap_or_default();
    if !epics.is_empty() {
        let epics = epics.iter().filter_map(epic_from_value).collect();
        return ScopeTree {
            variant: ScopeVariant::StoryHierarchy { epics, filter },
            links,
        };
    }

    ScopeTree::all_files(filter).with_links(links)
}

fn graph_links_from_value(links: Option<&Value>) -> GraphLinks {
    match links {
        Some(v) => GraphLinks {
            graph: opt_str(v, "graph"),
            map: opt_str(v, "map"),
        },
        None => GraphLinks::default(),
    }
}

fn filter_label(v: &Value) -> Option<String> {
    let label = match v {
        Value::Array(_) => string_list(Some(v)).join(", "),
        other => scalar_text(other).unwrap_or_default(),
    };
    Some(label).filter(|l| !l.is_empty())
}

fn file_entry_from_value(v: &Value) -> Option<FileEntry> {
    let path = match v {
        Value::String(s) => s.trim().to_string(),
        _ => opt_str(v, "path")?,
    };
    if path.is_empty() {
        return None;
    }
    let kind = opt_str(v, "kind")
        .or_else(|| opt_str(v, "type"))
        .and_then(|label| FileKind::from_label(&label))
        .unwrap_or_else(|| FileKind::from_path(&path));
    Some(FileEntry { path, kind })
}

fn epic_from_value(v: &Value) -> Option<Epic> {
    let name = node_name(v)?;
    let features = get_array(v, "sub_epics")
        .iter()
        .filter_map(|f| feature_from_value(f, None))
        .collect();
    Some(Epic { name, features })
}

/// Build a feature and everything below it. `inherited` is the nearest
/// ancestor feature's resolved test link.
fn feature_from_value(v: &Value, inherited: Option<&str>) -> Option<Feature> {
    let name = node_name(v)?;
    let test_link = feature_link(v);
    let scope_link = test_link.as_deref().or(inherited);

    let grouped = get_array(v, "story_groups")
        .iter()
        .flat_map(|group| get_array(group, "stories"));
    let stories = grouped
        .chain(get_array(v, "stories"))
        .filter_map(|s| story_from_value(s, scope_link))
        .collect();

    let nested: Vec<Feature> = get_array(v, "sub_epics")
        .iter()
        .filter_map(|f| feature_from_value(f, scope_link))
        .collect();

    Some(Feature {
        name,
        test_link,
        features: (!nested.is_empty()).then_some(nested),
        stories,
    })
}

fn story_from_value(v: &Value, feature_link: Option<&str>) -> Option<Story> {
    let name = node_name(v)?;
    let story_file = opt_str(v, "story_file");
    let story_file_exists = get_bool(v, "story_file_exists");
    let test_class = opt_str(v, "test_class");

    let story_link = opt_str(v, "story_link").or_else(|| {
        story_file
            .clone()
            .filter(|_| story_file_exists)
    });
    let test_link = opt_str(v, "test_link")
        .or_else(|| fragment_link(feature_link, test_class.as_deref()));

    let scenarios = get_array(v, "scenarios")
        .iter()
        .filter_map(|s| scenario_from_value(s, feature_link))
        .collect();

    Some(Story {
        name,
        story_file,
        story_file_exists,
        test_class,
        story_link,
        test_link,
        scenarios,
    })
}

fn scenario_from_value(v: &Value, feature_link: Option<&str>) -> Option<Scenario> {
    let name = node_name(v)?;
    let test_method = opt_str(v, "test_method");
    let test_link = opt_str(v, "test_link")
        .or_else(|| fragment_link(feature_link, test_method.as_deref()));
    Some(Scenario {
        name,
        test_method,
        test_link,
    })
}

// ── Free text ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Epic,
    Feature,
    Story,
    Scenario,
}

#[derive(Debug)]
struct ScopeRow<'a> {
    kind: RowKind,
    indent: usize,
    name: String,
    links: Vec<(&'a str, &'a str)>,
}

impl ScopeRow<'_> {
    fn link_labelled(&self, wanted: &[&str]) -> Option<String> {
        self.links
            .iter()
            .find(|(label, _)| {
                let label = label.to_ascii_lowercase();
                wanted.iter().any(|w| label.contains(w))
            })
            .map(|(_, target)| target.to_string())
    }

    fn test_link(&self) -> Option<String> {
        self.link_labelled(&["test"])
    }

    fn story_link(&self) -> Option<String> {
        self.link_labelled(&["story", "doc"])
    }
}

/// Classify a hierarchy row by its glyph. A bare `- name` bullet is a
/// scenario candidate; the builder decides whether a story is open.
fn classify_row(line: &str) -> Option<ScopeRow<'_>> {
    let indent = grammar::indent_width(line);
    let trimmed = line.trim_start();
    let unbulleted = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .map(str::trim_start);

    let glyphs = [
        (EPIC_GLYPH, RowKind::Epic),
        (FEATURE_GLYPH, RowKind::Feature),
        (STORY_GLYPH, RowKind::Story),
    ];
    let candidate = unbulleted.unwrap_or(trimmed);
    let (kind, body) = glyphs
        .iter()
        .find_map(|(glyph, kind)| {
            candidate
                .strip_prefix(glyph)
                .map(|rest| (*kind, rest.trim_start_matches('\u{fe0f}')))
        })
        .or_else(|| unbulleted.map(|rest| (RowKind::Scenario, rest)))?;

    let name = grammar::without_links(body);
    let name = name
        .trim()
        .trim_end_matches(['-', ':', '|'])
        .trim()
        .trim_matches('*')
        .trim()
        .to_string();
    if name.is_empty() {
        return None;
    }
    Some(ScopeRow {
        kind,
        indent,
        name,
        links: grammar::link_tokens(body),
    })
}

/// Arena slot for a feature while the text tree is being assembled.
#[derive(Debug, Default)]
struct DraftFeature {
    name: String,
    test_link: Option<String>,
    indent: usize,
    children: Vec<usize>,
    stories: Vec<Story>,
}

#[derive(Debug, Default)]
struct DraftEpic {
    name: String,
    roots: Vec<usize>,
}

/// Story hierarchy from glyph rows. Features nest by indentation; stories
/// attach to the deepest open feature shallower than themselves, or to one
/// at their own indentation.
fn hierarchy_from_lines(lines: &[&str]) -> Vec<Epic> {
    let mut arena: Vec<DraftFeature> = Vec::new();
    let mut epics: Vec<DraftEpic> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    // (feature index, story index, story indent)
    let mut last_story: Option<(usize, usize, usize)> = None;

    for line in lines {
        let Some(row) = classify_row(line) else {
            continue;
        };
        match row.kind {
            RowKind::Epic => {
                epics.push(DraftEpic {
                    name: row.name,
                    roots: Vec::new(),
                });
                open.clear();
                last_story = None;
            }
            RowKind::Feature => {
                let Some(epic) = epics.last_mut() else {
                    continue;
                };
                while open.last().is_some_and(|&i| arena[i].indent >= row.indent) {
                    open.pop();
                }
                let idx = arena.len();
                arena.push(DraftFeature {
                    test_link: row.test_link(),
                    name: row.name,
                    indent: row.indent,
                    ..DraftFeature::default()
                });
                match open.last() {
                    Some(&parent) => arena[parent].children.push(idx),
                    None => epic.roots.push(idx),
                }
                open.push(idx);
                last_story = None;
            }
            RowKind::Story => {
                // Deepest shallower feature, else a feature written level with the story.
                let owner = open
                    .iter()
                    .rev()
                    .copied()
                    .find(|&i| arena[i].indent < row.indent)
                    .or_else(|| {
                        open.iter()
                            .rev()
                            .copied()
                            .find(|&i| arena[i].indent == row.indent)
                    });
                let Some(owner) = owner else {
                    trace!(line = %line, "story row outside any feature");
                    continue;
                };
                let story_link = row.story_link();
                let stories = &mut arena[owner].stories;
                stories.push(Story {
                    story_file: story_link.clone(),
                    story_file_exists: story_link.is_some(),
                    story_link,
                    test_link: row.test_link(),
                    name: row.name,
                    ..Story::default()
                });
                last_story = Some((owner, stories.len() - 1, row.indent));
            }
            RowKind::Scenario => {
                let Some((owner, story, story_indent)) = last_story else {
                    continue;
                };
                if row.indent <= story_indent {
                    continue;
                }
                arena[owner].stories[story].scenarios.push(Scenario {
                    test_link: row.test_link(),
                    name: row.name,
                    test_method: None,
                });
            }
        }
    }

    let mut slots: Vec<Option<DraftFeature>> = arena.into_iter().map(Some).collect();
    epics
        .into_iter()
        .map(|epic| Epic {
            name: epic.name,
            features: epic
                .roots
                .iter()
                .filter_map(|&i| materialize(&mut slots, i))
                .collect(),
        })
        .collect()
}

/// Move a drafted feature and its descendants out of the arena.
fn materialize(slots: &mut [Option<DraftFeature>], idx: usize) -> Option<Feature> {
    let draft = slots.get_mut(idx)?.take()?;
    let nested: Vec<Feature> = draft
        .children
        .iter()
        .filter_map(|&child| materialize(slots, child))
        .collect();
    Some(Feature {
        name: draft.name,
        test_link: draft.test_link,
        features: (!nested.is_empty()).then_some(nested),
        stories: draft.stories,
    })
}

/// `Files:`, `**Files in scope:**` and similar.
fn is_files_header(line: &str) -> bool {
    let cleaned = grammar::strip_noise(line);
    grammar::strip_literal(cleaned, "files").is_some()
        && cleaned
            .trim_end_matches(|c: char| c.is_whitespace() || c == '*')
            .ends_with(':')
}

/// `- path` lines following the first `Files…` header line, or `None` when
/// the section has no file list.
fn file_list_from_lines(lines: &[&str]) -> Option<Vec<FileEntry>> {
    let header = lines.iter().position(|l| is_files_header(l))?;

    let files = lines[header + 1..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map_while(|l| l.trim().strip_prefix("- "))
        .map(|p| p.trim().trim_matches('`').to_string())
        .filter(|p| !p.is_empty())
        .map(|path| FileEntry {
            kind: FileKind::from_path(&path),
            path,
        })
        .collect();
    Some(files)
}

fn graph_links_from_lines(lines: &[&str]) -> GraphLinks {
    let mut links = GraphLinks::default();
    for (label, target) in lines.iter().flat_map(|l| grammar::link_tokens(l)) {
        let label = label.to_ascii_lowercase();
        if label.contains("graph") {
            links.graph.get_or_insert_with(|| target.to_string());
        } else if label.contains("map") {
            links.map.get_or_insert_with(|| target.to_string());
        }
    }
    links
}

pub(crate) fn scope_from_lines(lines: &[&str]) -> ScopeTree {
    let links = graph_links_from_lines(lines);
    let filter = lines
        .iter()
        .find_map(|l| grammar::labelled_value(l, FILTER_KEYS))
        .map(str::to_string);

    if let Some(files) = file_list_from_lines(lines) {
        return ScopeTree {
            variant: ScopeVariant::ExplicitFiles { files },
            links,
        };
    }

    let epics = hierarchy_from_lines(lines);
    if !epics.is_empty() {
        return ScopeTree {
            variant: ScopeVariant::StoryHierarchy { epics, filter },
            links,
        };
    }

    ScopeTree::all_files(filter).with_links(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use botpanel_core::DEFAULT_FILTER_LABEL;
    use serde_json::json;

    fn story_graph_scope(epics: Value) -> Value {
        json!({"storyGraph": {"epics": epics}, "links": {"graph": "docs/story-graph.json", "map": "docs/story-map.md"}})
    }

    #[test]
    fn explicit_files_by_declared_type() {
        let scope = scope_from_value(Some(&json!({
            "type": "files",
            "files": [{"path": "a.py"}, "notes.md", {"path": "cfg.yaml", "kind": "other"}, {"kind": "data"}]
        })));
        assert_eq!(
            scope.files(),
            &[
                FileEntry { path: "a.py".into(), kind: FileKind::Source },
                FileEntry { path: "notes.md".into(), kind: FileKind::Document },
                FileEntry { path: "cfg.yaml".into(), kind: FileKind::Other },
            ]
        );
    }

    #[test]
    fn missing_scope_defaults_to_all_files() {
        let scope = scope_from_value(None);
        assert_eq!(
            scope.variant,
            ScopeVariant::AllFiles { filter: DEFAULT_FILTER_LABEL.into() }
        );
        let empty_graph = scope_from_value(Some(&json!({"storyGraph": {"epics": []}, "filter": ["Orders", "Billing"]})));
        assert_eq!(
            empty_graph.variant,
            ScopeVariant::AllFiles { filter: "Orders, Billing".into() }
        );
    }

    #[test]
    fn graph_links_attach_to_every_variant() {
        let files = scope_from_value(Some(&json!({"type": "files", "links": {"graph": "g.json"}})));
        assert_eq!(files.links.graph.as_deref(), Some("g.json"));
        let all = scope_from_value(Some(&json!({"links": {"map": "m.md"}})));
        assert_eq!(all.links.map.as_deref(), Some("m.md"));
        assert_eq!(all.variant_name(), "all_files");
    }

    #[test]
    fn explicit_link_wins_over_identifiers() {
        let scope = scope_from_value(Some(&story_graph_scope(json!([{
            "name": "Orders",
            "sub_epics": [{
                "name": "Checkout",
                "test_file": "tests/test_checkout.py",
                "stories": [{
                    "name": "Pay",
                    "test_class": "TestPay",
                    "test_link": "/abs/tests/test_pay.py#TestPay",
                    "scenarios": [{"name": "card", "test_method": "test_card", "test_link": "/abs/x.py#test_card"}]
                }]
            }]
        }]))));
        let story = &scope.epics()[0].features[0].stories[0];
        assert_eq!(story.test_link.as_deref(), Some("/abs/tests/test_pay.py#TestPay"));
        assert_eq!(story.scenarios[0].test_link.as_deref(), Some("/abs/x.py#test_card"));
        assert_eq!(scope.links.graph.as_deref(), Some("docs/story-graph.json"));
    }

    #[test]
    fn synthesized_links_use_ancestor_feature_link() {
        let scope = scope_from_value(Some(&story_graph_scope(json!([{
            "name": "Orders",
            "sub_epics": [{
                "name": "Checkout",
                "test_link": "/ws/tests/test_checkout.py",
                "stories": [{
                    "name": "Pay",
                    "test_class": "TestPay",
                    "scenarios": [{"name": "card", "test_method": "test_card"}, {"name": "untested"}]
                }, {"name": "No class"}]
            }]
        }]))));
        let feature = &scope.epics()[0].features[0];
        assert_eq!(feature.test_link.as_deref(), Some("/ws/tests/test_checkout.py"));
        let pay = &feature.stories[0];
        assert_eq!(pay.test_link.as_deref(), Some("/ws/tests/test_checkout.py#TestPay"));
        assert_eq!(
            pay.scenarios[0].test_link.as_deref(),
            Some("/ws/tests/test_checkout.py#test_card")
        );
        assert_eq!(pay.scenarios[1].test_link, None);
        assert_eq!(feature.stories[1].test_link, None);
    }

    #[test]
    fn no_ancestor_link_means_no_link() {
        let scope = scope_from_value(Some(&story_graph_scope(json!([{
            "name": "Orders",
            "sub_epics": [{"name": "Checkout", "stories": [{"name": "Pay", "test_class": "TestPay"}]}]
        }]))));
        let feature = &scope.epics()[0].features[0];
        assert_eq!(feature.test_link, None);
        assert_eq!(feature.stories[0].test_link, None);
    }

    #[test]
    fn story_link_requires_existing_file() {
        let scope = scope_from_value(Some(&story_graph_scope(json!([{
            "name": "E",
            "sub_epics": [{"name": "F", "stories": [
                {"name": "present", "story_file": "docs/present.md", "story_file_exists": true},
                {"name": "absent", "story_file": "docs/absent.md", "story_file_exists": false}
            ]}]
        }]))));
        let stories = &scope.epics()[0].features[0].stories;
        assert_eq!(stories[0].story_link.as_deref(), Some("docs/present.md"));
        assert_eq!(stories[1].story_link, None);
        assert_eq!(stories[1].story_file.as_deref(), Some("docs/absent.md"));
    }

    #[test]
    fn grouped_stories_come_before_flat_stories() {
        let scope = scope_from_value(Some(&story_graph_scope(json!([{
            "name": "E",
            "sub_epics": [{
                "name": "F",
                "stories": [{"name": "flat"}],
                "story_groups": [{"stories": [{"name": "g1"}, {"name": "g2"}]}, {"stories": ["g3"]}]
            }]
        }]))));
        let names: Vec<&str> = scope.epics()[0].features[0]
            .stories
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, ["g1", "g2", "g3", "flat"]);
    }

    #[test]
    fn nested_features_keep_depth_and_own_links() {
        let scope = scope_from_value(Some(&story_graph_scope(json!([{
            "name": "E",
            "sub_epics": [{
                "name": "L1",
                "test_file": "t/l1.py",
                "sub_epics": [{
                    "name": "L2",
                    "sub_epics": [{
                        "name": "L3",
                        "test_link": "t/l3.py",
                        "stories": [{"name": "deep", "test_class": "TestDeep"}]
                    }],
                    "stories": [{"name": "mid", "test_class": "TestMid"}]
                }]
            }, {"name": "Empty"}]
        }]))));
        let l1 = &scope.epics()[0].features[0];
        let l2 = &l1.nested()[0];
        let l3 = &l2.nested()[0];
        assert_eq!(l1.test_link.as_deref(), Some("t/l1.py"));
        assert_eq!(l2.test_link, None);
        assert_eq!(l2.stories[0].test_link.as_deref(), Some("t/l1.py#TestMid"));
        assert_eq!(l3.name, "L3");
        assert_eq!(l3.test_link.as_deref(), Some("t/l3.py"));
        assert_eq!(l3.stories[0].test_link.as_deref(), Some("t/l3.py#TestDeep"));
        assert!(l3.is_leaf());
        assert!(scope.epics()[0].features[1].features.is_none());
        assert!(scope.epics()[0].features[1].stories.is_empty());
    }

    #[test]
    fn fragment_replaces_existing_anchor() {
        assert_eq!(
            fragment_link(Some("t/a.py#Old"), Some("test_new")).as_deref(),
            Some("t/a.py#test_new")
        );
        assert_eq!(fragment_link(None, Some("x")), None);
        assert_eq!(fragment_link(Some("t/a.py"), None), None);
    }

    #[test]
    fn text_file_list() {
        let scope = scope_from_lines(&[
            "Filter: Orders",
            "**Files in scope:**",
            "- src/orders.py",
            "- `docs/orders.md`",
            "",
            "- data/orders.json",
            "Trailing prose",
            "- not/included.rs",
        ]);
        let paths: Vec<(&str, FileKind)> =
            scope.files().iter().map(|f| (f.path.as_str(), f.kind)).collect();
        assert_eq!(
            paths,
            [
                ("src/orders.py", FileKind::Source),
                ("docs/orders.md", FileKind::Document),
                ("data/orders.json", FileKind::Data),
            ]
        );
    }

    #[test]
    fn text_hierarchy_with_nesting_and_links() {
        let lines = [
            "Filter: Orders",
            "[story graph](docs/story-graph.json) [story map](docs/story-map.md)",
            "📦 Orders",
            "  📁 Checkout [test](tests/test_checkout.py)",
            "    📄 Pay [story](docs/pay.md) [test](tests/test_checkout.py#TestPay)",
            "      - pays by card [test](tests/test_checkout.py#test_card)",
            "      - pays by voucher",
            "    📁 Refunds",
            "      📁 Partial",
            "        📄 Refund part",
            "    📄 Confirm",
            "📦 Billing",
            "  📄 Story without a feature",
            "  - scenario without a story",
        ];
        let scope = scope_from_lines(&lines);
        assert_eq!(scope.links.graph.as_deref(), Some("docs/story-graph.json"));
        assert_eq!(scope.links.map.as_deref(), Some("docs/story-map.md"));
        let ScopeVariant::StoryHierarchy { epics, filter } = &scope.variant else {
            panic!("expected story hierarchy, got {:?}", scope.variant);
        };
        assert_eq!(filter.as_deref(), Some("Orders"));
        assert_eq!(epics.len(), 2);

        let checkout = &epics[0].features[0];
        assert_eq!(checkout.name, "Checkout");
        assert_eq!(checkout.test_link.as_deref(), Some("tests/test_checkout.py"));
        assert_eq!(checkout.stories.len(), 2);
        let pay = &checkout.stories[0];
        assert_eq!(pay.name, "Pay");
        assert_eq!(pay.story_link.as_deref(), Some("docs/pay.md"));
        assert_eq!(pay.test_link.as_deref(), Some("tests/test_checkout.py#TestPay"));
        assert_eq!(pay.scenarios.len(), 2);
        assert_eq!(pay.scenarios[1].test_link, None);
        assert_eq!(checkout.stories[1].name, "Confirm");

        let refunds = &checkout.nested()[0];
        assert_eq!(refunds.name, "Refunds");
        assert!(refunds.stories.is_empty());
        let partial = &refunds.nested()[0];
        assert_eq!(partial.stories[0].name, "Refund part");
        assert!(partial.is_leaf());

        assert!(epics[1].features.is_empty());
    }

    #[test]
    fn text_story_level_with_its_feature_attaches_to_it() {
        let lines = [
            "📦 Epic",
            "📁 Feature",
            "📄 Story",
            "  - scenario",
            "📁 Next",
            "  📄 Indented",
        ];
        let scope = scope_from_lines(&lines);
        let features = &scope.epics()[0].features;
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].stories.len(), 1);
        assert_eq!(features[0].stories[0].name, "Story");
        assert_eq!(features[0].stories[0].scenarios[0].name, "scenario");
        assert_eq!(features[1].stories[0].name, "Indented");
    }

    #[test]
    fn text_without_rows_is_all_files() {
        let scope = scope_from_lines(&["Nothing to see"]);
        assert!(scope.is_default());
        let filtered = scope_from_lines(&["**Filter:** Billing"]);
        assert_eq!(filtered.variant, ScopeVariant::AllFiles { filter: "Billing".into() });
    }
}
