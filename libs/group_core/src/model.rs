use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

static COPY_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*) - Copy(?:\(\d+\))?$").expect("static regex"));

/// Positive integer key of a group. "No group selected" is `Option::None`
/// rather than a sentinel value.
pub type GroupId = u32;

pub const DEFAULT_COLUMNS: u32 = 3;
pub const DEFAULT_LABEL_SIZE: u32 = 12;

/// Group names double as folder names, so these are refused.
const FORBIDDEN_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

fn default_columns() -> u32 {
    DEFAULT_COLUMNS
}

fn default_label_size() -> u32 {
    DEFAULT_LABEL_SIZE
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelPosition {
    Right,
    #[default]
    Bottom,
}

/// One launchable entry of a group. `file_path` is unique within its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub file_path: PathBuf,
    pub tooltip: Option<String>,
    pub args: Option<String>,
    pub icon_override: Option<PathBuf>,
}

impl ItemRecord {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            tooltip: None,
            args: None,
            icon_override: None,
        }
    }

    /// Text shown under/next to the icon: the tooltip, else the file stem.
    pub fn label(&self) -> String {
        if let Some(tooltip) = self.tooltip.as_deref().filter(|t| !t.is_empty()) {
            return tooltip.to_string();
        }
        self.file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub group_name: String,
    #[serde(default)]
    pub group_header: bool,
    #[serde(default)]
    pub group_icon: PathBuf,
    #[serde(default = "default_columns")]
    pub group_col: u32,
    #[serde(default)]
    pub show_labels: bool,
    #[serde(default = "default_label_size")]
    pub label_size: u32,
    #[serde(default)]
    pub label_position: LabelPosition,
    /// Serialized as an object keyed by file path; key order is item order.
    #[serde(rename = "path", with = "item_map", default)]
    pub items: Vec<ItemRecord>,
}

impl GroupRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            group_name: name.into(),
            group_header: false,
            group_icon: PathBuf::new(),
            group_col: DEFAULT_COLUMNS,
            show_labels: false,
            label_size: DEFAULT_LABEL_SIZE,
            label_position: LabelPosition::default(),
            items: Vec::new(),
        }
    }

    /// Grid column count, never below one.
    pub fn columns(&self) -> usize {
        self.group_col.max(1) as usize
    }

    /// Appends an item, or replaces the existing one with the same path in place.
    pub fn push_item(&mut self, item: ItemRecord) {
        match self.items.iter_mut().find(|i| i.file_path == item.file_path) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn remove_item(&mut self, file_path: &Path) -> Option<ItemRecord> {
        let index = self.items.iter().position(|i| i.file_path == file_path)?;
        Some(self.items.remove(index))
    }

    /// Moves the item at `from` so that it ends up at `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() || to >= self.items.len() {
            return false;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        true
    }
}

/// The whole `appgroups.json` document: `groupId -> GroupRecord`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    groups: BTreeMap<GroupId, GroupRecord>,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// `1 + max(existing id)`, or `1` for an empty document.
    pub fn next_id(&self) -> GroupId {
        self.groups.keys().next_back().map_or(1, |max| max + 1)
    }

    pub fn get(&self, id: GroupId) -> Option<&GroupRecord> {
        self.groups.get(&id)
    }

    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut GroupRecord> {
        self.groups.get_mut(&id)
    }

    pub fn contains(&self, id: GroupId) -> bool {
        self.groups.contains_key(&id)
    }

    /// Inserts or replaces the record stored under `id`.
    pub fn insert(&mut self, id: GroupId, record: GroupRecord) -> Option<GroupRecord> {
        self.groups.insert(id, record)
    }

    pub fn remove(&mut self, id: GroupId) -> Result<GroupRecord, ConfigError> {
        self.groups
            .remove(&id)
            .ok_or(ConfigError::GroupNotFound(id))
    }

    /// Exact, case-sensitive name lookup. The first id in key order wins if
    /// two records share a name.
    pub fn find_id_by_name(&self, name: &str) -> Result<GroupId, ConfigError> {
        self.groups
            .iter()
            .find(|(_, record)| record.group_name == name)
            .map(|(id, _)| *id)
            .ok_or_else(|| ConfigError::NameNotFound(name.to_string()))
    }

    pub fn find_name_by_id(&self, id: GroupId) -> Option<&str> {
        self.groups.get(&id).map(|r| r.group_name.as_str())
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.values().any(|r| r.group_name == name)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.groups.values().map(|r| r.group_name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &GroupRecord)> {
        self.groups.iter().map(|(id, r)| (*id, r))
    }

    /// Whether `name` may be saved under `id`: non-blank, usable as a folder
    /// name, and not taken by a different group.
    pub fn check_name(&self, id: GroupId, name: &str) -> Result<(), ConfigError> {
        let invalid = |reason| ConfigError::InvalidName {
            name: name.to_string(),
            reason,
        };
        if name.trim().is_empty() {
            return Err(invalid("is empty"));
        }
        if name != name.trim() || name.ends_with('.') {
            return Err(invalid("has leading/trailing spaces or a trailing dot"));
        }
        if name.contains(FORBIDDEN_NAME_CHARS) || name.chars().any(char::is_control) {
            return Err(invalid("contains characters not allowed in folder names"));
        }
        match self.find_id_by_name(name) {
            Ok(owner) if owner != id => Err(ConfigError::DuplicateName(name.to_string())),
            _ => Ok(()),
        }
    }

    /// First free name in the sequence `"<base> - Copy"`, `"<base> - Copy(2)"`, ...
    /// where `<base>` is `name` with any existing copy suffix removed, so
    /// copying a copy continues the same sequence.
    pub fn unique_copy_name(&self, name: &str) -> String {
        let base = COPY_SUFFIX
            .captures(name)
            .and_then(|c| c.get(1))
            .map_or(name, |m| m.as_str());
        let stem = format!("{base} - Copy");
        if !self.has_group(&stem) {
            return stem;
        }
        (2u32..)
            .map(|n| format!("{stem}({n})"))
            .find(|candidate| !self.has_group(candidate))
            .unwrap_or(stem)
    }
}

mod item_map {
    use std::fmt;
    use std::path::PathBuf;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::ItemRecord;

    #[derive(Default, Serialize, Deserialize)]
    struct ItemMeta {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tooltip: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<PathBuf>,
    }

    pub fn serialize<S: Serializer>(items: &[ItemRecord], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(items.len()))?;
        for item in items {
            let meta = ItemMeta {
                tooltip: item.tooltip.clone(),
                args: item.args.clone(),
                icon: item.icon_override.clone(),
            };
            map.serialize_entry(&item.file_path.to_string_lossy(), &meta)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ItemRecord>, D::Error> {
        struct ItemsVisitor;

        impl<'de> Visitor<'de> for ItemsVisitor {
            type Value = Vec<ItemRecord>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object keyed by item file path")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut items: Vec<ItemRecord> = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((path, meta)) = access.next_entry::<String, Option<ItemMeta>>()? {
                    let meta = meta.unwrap_or_default();
                    let item = ItemRecord {
                        file_path: PathBuf::from(path),
                        tooltip: meta.tooltip,
                        args: meta.args,
                        icon_override: meta.icon,
                    };
                    // A repeated key keeps its first position and the last value.
                    match items.iter_mut().find(|i| i.file_path == item.file_path) {
                        Some(existing) => *existing = item,
                        None => items.push(item),
                    }
                }
                Ok(items)
            }
        }

        deserializer.deserialize_map(ItemsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_group() -> GroupRecord {
        let mut group = GroupRecord::new("Dev");
        group.push_item(ItemRecord::new(r"C:\Tools\zed.exe"));
        group.push_item(ItemRecord {
            file_path: PathBuf::from(r"C:\Tools\alacritty.exe"),
            tooltip: Some("Terminal".into()),
            args: Some("--working-directory C:\\src".into()),
            icon_override: None,
        });
        group
    }

    #[test]
    fn next_id_is_one_for_empty_document() {
        assert_eq!(ConfigDocument::new().next_id(), 1);
    }

    #[test]
    fn next_id_follows_max_key_not_count() {
        let mut doc = ConfigDocument::new();
        doc.insert(2, GroupRecord::new("a"));
        doc.insert(7, GroupRecord::new("b"));
        assert_eq!(doc.next_id(), 8);
    }

    #[test]
    fn items_keep_insertion_order_through_json() {
        let mut doc = ConfigDocument::new();
        let mut group = dev_group();
        group.push_item(ItemRecord::new(r"C:\A\first-alphabetically.exe"));
        doc.insert(1, group.clone());

        let json = serde_json::to_string_pretty(&doc).unwrap();
        let back: ConfigDocument = serde_json::from_str(&json).unwrap();
        let paths: Vec<_> = back.get(1).unwrap().items.iter().map(|i| i.file_path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from(r"C:\Tools\zed.exe"),
                PathBuf::from(r"C:\Tools\alacritty.exe"),
                PathBuf::from(r"C:\A\first-alphabetically.exe"),
            ]
        );
        assert_eq!(back, doc);
    }

    #[test]
    fn group_ids_are_string_keys_on_disk() {
        let mut doc = ConfigDocument::new();
        doc.insert(1, dev_group());
        let value: serde_json::Value = serde_json::to_value(&doc).unwrap();
        let group = &value["1"];
        assert_eq!(group["groupName"], "Dev");
        assert_eq!(group["groupCol"], 3);
        assert_eq!(group["labelPosition"], "Bottom");
        assert_eq!(group["path"][r"C:\Tools\alacritty.exe"]["tooltip"], "Terminal");
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        // Forward slashes parse as separators on every platform.
        let json = r#"{"4": {"groupName": "Games", "path": {"D:/Games/steam.exe": null}}}"#;
        let doc: ConfigDocument = serde_json::from_str(json).unwrap();
        let games = doc.get(4).unwrap();
        assert_eq!(games.group_col, DEFAULT_COLUMNS);
        assert_eq!(games.label_size, DEFAULT_LABEL_SIZE);
        assert!(!games.show_labels);
        assert_eq!(games.items.len(), 1);
        assert_eq!(games.items[0].label(), "steam");
    }

    #[test]
    fn non_numeric_keys_are_rejected() {
        let json = r#"{"abc": {"groupName": "x"}}"#;
        assert!(serde_json::from_str::<ConfigDocument>(json).is_err());
    }

    #[test]
    fn name_lookup_is_exact() {
        let mut doc = ConfigDocument::new();
        doc.insert(3, dev_group());
        assert_eq!(doc.find_id_by_name("Dev").unwrap(), 3);
        assert!(doc.find_id_by_name("dev").unwrap_err().is_not_found());
        assert_eq!(doc.find_name_by_id(3), Some("Dev"));
        assert_eq!(doc.find_name_by_id(4), None);
    }

    #[test]
    fn copy_names_count_up_until_free() {
        let mut doc = ConfigDocument::new();
        doc.insert(1, GroupRecord::new("Work"));
        assert_eq!(doc.unique_copy_name("Work"), "Work - Copy");
        doc.insert(2, GroupRecord::new("Work - Copy"));
        assert_eq!(doc.unique_copy_name("Work"), "Work - Copy(2)");
        doc.insert(3, GroupRecord::new("Work - Copy(2)"));
        assert_eq!(doc.unique_copy_name("Work"), "Work - Copy(3)");
    }

    #[test]
    fn copying_a_copy_continues_the_sequence() {
        let mut doc = ConfigDocument::new();
        doc.insert(1, GroupRecord::new("Work"));
        doc.insert(2, GroupRecord::new("Work - Copy"));
        assert_eq!(doc.unique_copy_name("Work - Copy"), "Work - Copy(2)");
        doc.insert(3, GroupRecord::new("Work - Copy(2)"));
        assert_eq!(doc.unique_copy_name("Work - Copy(2)"), "Work - Copy(3)");
    }

    #[test]
    fn names_must_be_folder_safe_and_unique() {
        let mut doc = ConfigDocument::new();
        doc.insert(1, GroupRecord::new("Dev"));
        assert!(doc.check_name(1, "Dev").is_ok());
        assert!(doc.check_name(2, "Games").is_ok());
        assert!(matches!(doc.check_name(2, "Dev"), Err(ConfigError::DuplicateName(_))));
        for bad in ["", "  ", "a/b", "what?", " Dev", "Dev."] {
            assert!(
                matches!(doc.check_name(2, bad), Err(ConfigError::InvalidName { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn move_item_reorders_in_place() {
        let mut group = dev_group();
        assert!(group.move_item(1, 0));
        assert_eq!(group.items[0].label(), "Terminal");
        assert!(!group.move_item(0, 5));
    }
}
