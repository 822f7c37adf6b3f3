//! Output generation.
//!
//! - [`json`]: writes reports and news collections as pretty-printed JSON
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! ├── pegn_news.json
//! ├── ibge_social.json
//! ├── siconfi_spending.json
//! └── transparency_data.json
//! ```

pub mod json;
