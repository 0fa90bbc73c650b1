pub(crate) mod scan_command;
