pub mod persistence;
pub mod reader;
pub mod report;
pub mod storage;
pub mod writer;
