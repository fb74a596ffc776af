pub mod extractors;
pub mod main_content;
pub mod steps;

pub use main_content::{extract_main_content, meta_thumbnail};
pub use steps::split_inline_steps;
