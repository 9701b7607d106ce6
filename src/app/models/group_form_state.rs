use std::path::PathBuf;

use group_core::model::{DEFAULT_COLUMNS, DEFAULT_LABEL_SIZE};
use group_core::{ConfigDocument, GroupId, GroupRecord, ItemRecord, LabelPosition};

/// One editable row of the item list. Text fields map to optional record
/// fields; blank means absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemForm {
    pub file_path: String,
    pub tooltip: String,
    pub args: String,
    pub icon_override: String,
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

impl ItemForm {
    pub fn new(path: PathBuf, args: Option<String>) -> Self {
        Self {
            file_path: path.display().to_string(),
            args: args.unwrap_or_default(),
            ..Default::default()
        }
    }

    fn from_record(item: &ItemRecord) -> Self {
        Self {
            file_path: item.file_path.display().to_string(),
            tooltip: item.tooltip.clone().unwrap_or_default(),
            args: item.args.clone().unwrap_or_default(),
            icon_override: item
                .icon_override
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    fn to_record(&self) -> Option<ItemRecord> {
        let file_path = non_blank(&self.file_path)?;
        Some(ItemRecord {
            file_path: PathBuf::from(file_path),
            tooltip: non_blank(&self.tooltip),
            args: non_blank(&self.args),
            icon_override: non_blank(&self.icon_override).map(PathBuf::from),
        })
    }
}

/// Editor contents for one group. Survives failed saves untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFormState {
    pub id: GroupId,
    /// Name the group was saved under, `None` for a group not yet saved.
    pub original_name: Option<String>,
    pub group_name: String,
    pub group_header: bool,
    pub group_icon: PathBuf,
    /// Image picked in this session; converted to the group icon on save.
    pub icon_source: Option<PathBuf>,
    pub group_col: u32,
    pub show_labels: bool,
    pub label_size: u32,
    pub label_position: LabelPosition,
    pub items: Vec<ItemForm>,
}

impl GroupFormState {
    pub fn new_group(id: GroupId) -> Self {
        Self {
            id,
            original_name: None,
            group_name: String::new(),
            group_header: false,
            group_icon: PathBuf::new(),
            icon_source: None,
            group_col: DEFAULT_COLUMNS,
            show_labels: false,
            label_size: DEFAULT_LABEL_SIZE,
            label_position: LabelPosition::default(),
            items: Vec::new(),
        }
    }

    pub fn from_record(id: GroupId, record: &GroupRecord) -> Self {
        Self {
            id,
            original_name: Some(record.group_name.clone()),
            group_name: record.group_name.clone(),
            group_header: record.group_header,
            group_icon: record.group_icon.clone(),
            icon_source: None,
            group_col: record.group_col.max(1),
            show_labels: record.show_labels,
            label_size: record.label_size,
            label_position: record.label_position,
            items: record.items.iter().map(ItemForm::from_record).collect(),
        }
    }

    /// The saved group with this id, or a blank form that will create it.
    pub fn load(id: GroupId, doc: &ConfigDocument) -> Self {
        match doc.get(id) {
            Some(record) => Self::from_record(id, record),
            None => Self::new_group(id),
        }
    }

    pub fn is_new(&self) -> bool {
        self.original_name.is_none()
    }

    pub fn renamed_from(&self) -> Option<&str> {
        self.original_name
            .as_deref()
            .filter(|old| *old != self.group_name.trim())
    }

    /// Rows with a blank path are dropped; a repeated path keeps the last row
    /// in the first row's position.
    pub fn to_record(&self) -> GroupRecord {
        let mut record = GroupRecord::new(self.group_name.trim());
        record.group_header = self.group_header;
        record.group_icon = self.group_icon.clone();
        record.group_col = self.group_col.max(1);
        record.show_labels = self.show_labels;
        record.label_size = self.label_size;
        record.label_position = self.label_position;
        for item in self.items.iter().filter_map(ItemForm::to_record) {
            record.push_item(item);
        }
        record
    }

    pub fn add_item(&mut self, item: ItemForm) {
        if !self.items.iter().any(|i| i.file_path == item.file_path) {
            self.items.push(item);
        }
    }

    pub fn move_item(&mut self, from: usize, to: usize) {
        if from < self.items.len() && to < self.items.len() {
            let item = self.items.remove(from);
            self.items.insert(to, item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_through_the_form() {
        let mut record = GroupRecord::new("Dev");
        record.group_col = 4;
        record.show_labels = true;
        record.push_item(ItemRecord::new(r"C:\Tools\zed.exe"));
        record.push_item(ItemRecord {
            file_path: PathBuf::from(r"C:\Tools\wt.exe"),
            tooltip: Some("Terminal".into()),
            args: Some("-d C:\\src".into()),
            icon_override: None,
        });

        let form = GroupFormState::from_record(3, &record);
        assert!(!form.is_new());
        assert_eq!(form.to_record(), record);
    }

    #[test]
    fn blank_rows_and_fields_are_dropped() {
        let mut form = GroupFormState::new_group(1);
        form.group_name = "  Games ".into();
        form.items.push(ItemForm::default());
        form.items.push(ItemForm {
            file_path: r"D:\steam.exe".into(),
            tooltip: "   ".into(),
            ..Default::default()
        });

        let record = form.to_record();
        assert_eq!(record.group_name, "Games");
        assert_eq!(record.items, vec![ItemRecord::new(r"D:\steam.exe")]);
    }

    #[test]
    fn rename_is_detected_against_saved_name() {
        let form = GroupFormState::from_record(1, &GroupRecord::new("Dev"));
        assert_eq!(form.renamed_from(), None);

        let mut renamed = form.clone();
        renamed.group_name = "Work".into();
        assert_eq!(renamed.renamed_from(), Some("Dev"));
        assert_eq!(GroupFormState::new_group(2).renamed_from(), None);
    }

    #[test]
    fn duplicate_paths_are_not_added_twice() {
        let mut form = GroupFormState::new_group(1);
        form.add_item(ItemForm::new(PathBuf::from(r"C:\a.exe"), None));
        form.add_item(ItemForm::new(PathBuf::from(r"C:\a.exe"), Some("-x".into())));
        assert_eq!(form.items.len(), 1);
        assert_eq!(form.items[0].args, "");
    }
}
