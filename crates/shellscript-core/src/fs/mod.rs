//! File and path helpers.
//!
//! - `content` - whole-file reads and writes
//! - `path` - pure path manipulation and the working directory
//! - `ops` - create, remove, move, rename
//! - `copy` - file and tree copies, progress reporting
//! - `split` - numbered chunk files
//! - `meta` - sizes and timestamps
//! - `find` - glob search
//! - `filter` - predicates and sorting over path lists

pub mod content;
pub mod copy;
pub mod filter;
pub mod find;
pub mod meta;
pub mod ops;
pub mod path;
pub mod split;

pub use content::{
    append_text, read_bytes, read_text, read_text_or_empty, write_bytes, write_lines, write_text,
};
pub use copy::{
    copy_dir, copy_file, copy_file_with_progress, cp, format_bytes, render_bar, ConsoleProgress,
    CopyOptions, CopyProgress,
};
pub use filter::{
    filter_by_substring, sort_by_extension, sort_by_modified, sort_by_name, sort_by_size,
    EntryKind, FileFilter, OwnerFilter,
};
pub use find::{find, find_dirs};
pub use meta::{
    accessed_time, changed_time, created_time, file_size, modified_time, set_created_time,
    set_modified_time, total_size,
};
pub use ops::{
    mkdir, move_to_dir, mv, rename_only, rename_recursively, rm, rmdir, touch, RemoveKind,
    RmdirMode, TouchOptions,
};
pub use path::{
    cd, contains_glob_pattern, current_dir, cwd, expand_user, file_name, has_extension,
    set_current_dir, with_extension,
};
pub use split::{combine_files, split_chunks, split_file};
