pub mod clean_reporter;

pub use clean_reporter::{render_text, save_to_file, to_json};
