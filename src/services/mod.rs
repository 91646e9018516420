//! Services used by request handlers that are not storage.

pub mod password;
