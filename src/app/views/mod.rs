pub mod error_modal;
pub mod group_editor;
pub mod group_list;
pub mod header;
pub mod logs;
pub mod popup;
pub mod settings;
pub mod shared_elements;
