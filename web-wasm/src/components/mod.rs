//! UIコンポーネント

pub mod action_bar;
pub mod error_panel;
pub mod header;
pub mod image_preview;
pub mod recent_extractions;
pub mod result_table;
pub mod upload_area;
