pub mod delete_cmd;
pub mod extract_cmd;
pub mod list_cmd;
pub mod save_cmd;
pub mod shell_cmd;
pub mod show_cmd;

pub use delete_cmd::cmd_delete;
pub use extract_cmd::cmd_extract;
pub use list_cmd::cmd_list;
pub use save_cmd::cmd_save;
pub use shell_cmd::cmd_shell;
pub use show_cmd::cmd_show;
