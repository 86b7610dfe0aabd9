pub mod archive;
pub mod download;
pub mod list;
pub mod types;
pub mod upload;

// Re-export all types
pub use types::*;

// Re-export all handlers
pub use archive::download_archive;
pub use download::get_download_link;
pub use list::list_files;
pub use upload::{update_file, upload_file};
