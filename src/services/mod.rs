pub mod archive;
pub mod file_service;
pub mod limiter;
pub mod storage;
pub mod transfer;
