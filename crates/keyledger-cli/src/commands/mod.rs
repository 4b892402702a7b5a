//! Command handlers, one function per subcommand.

mod entries;
mod init;
mod maintenance;
mod misc;

pub use entries::{
    handle_contains, handle_export, handle_get, handle_history, handle_import, handle_set,
    handle_size,
};
pub use init::handle_init;
pub use maintenance::{
    handle_check, handle_delete, handle_drop, handle_list, handle_purge, handle_purge_nulls,
};
pub use misc::handle_completions;
