mod files;
mod model;

pub use files::{CLIENT_RECORD_FILE, MANIFEST_FILE, SUMMARY_FILE};
pub use model::{ClientRecord, InstallMode, Profile, ProfileSummary};
