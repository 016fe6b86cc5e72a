pub mod device;
pub mod session_history;
pub mod setting;
pub mod time_rule;
pub mod user_preference;

pub use device::Device;
pub use session_history::SessionHistoryEntry;
pub use setting::Setting;
pub use time_rule::TimeRule;
pub use user_preference::UserPreference;
