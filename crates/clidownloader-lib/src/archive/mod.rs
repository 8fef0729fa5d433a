mod entry;
mod extract;
mod unpack;

pub use entry::{
    ArchiveEntry, DEFAULT_FILE_MODE, ExtractOptions, MAX_FILE_SIZE, SAFE_DIR_MODE, base_name,
};
pub use extract::{extract_entry, flattened_destination, hierarchical_destination};
pub(crate) use extract::create_dir_restricted;
pub use unpack::{UnpackMode, unpack_selected, unpack_selected_with_options};
