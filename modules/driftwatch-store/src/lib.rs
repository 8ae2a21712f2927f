pub mod log;
pub mod seen;
pub mod session;

pub use log::RecordLog;
pub use seen::SeenSet;
pub use session::{data_dir, SessionPaths};
