pub mod ack;
pub mod check;
pub mod headers;
pub mod init;
pub mod reconcile;
pub mod result;
pub mod watch;
