pub mod content;
pub mod fields;
pub mod records;
