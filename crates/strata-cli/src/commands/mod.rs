//! Command implementations

pub(crate) mod code;
pub(crate) mod common;
pub(crate) mod init;
pub(crate) mod migrate;
pub(crate) mod new;
pub(crate) mod print_connstring;
pub(crate) mod renumber;
pub(crate) mod status;
