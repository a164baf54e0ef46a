pub mod bbox;
pub mod labels;
pub mod letterbox;
