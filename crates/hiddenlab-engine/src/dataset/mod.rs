pub mod listing;
pub mod walk;

pub use listing::{
    group_paths, list_files_named, list_folders, list_images, natural_cmp, FileEntry, ImageEntry,
    PathGroup,
};
pub use walk::walk_instances;
