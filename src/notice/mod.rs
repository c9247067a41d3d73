mod entry;
mod filter;
mod storage;

pub use entry::{Notice, NoticeLevel};
pub use filter::NoticeFilter;
pub use storage::NoticeLog;
