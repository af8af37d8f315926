//! Output generation for eager runs.
//!
//! - [`json`]: writes a [`crate::models::Digest`] to a dated JSON file
//!
//! ```text
//! json_output_dir/
//! └── 2026-10-15/
//!     ├── 08-30-12.json
//!     └── 19-02-45.json
//! ```

pub mod json;
