pub mod status_bar;
pub mod text_entry;
