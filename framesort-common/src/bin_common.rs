pub mod args_helper;
pub mod init;
