pub mod types;
pub mod selection;
pub mod themes;
pub mod member_states;
pub mod config;
pub mod error;

pub use types::*;
pub use selection::*;
pub use themes::{ThemeMapping, ThemeRecord};
pub use member_states::{
    current_member_states, member_states_from_csv, member_states_from_json, MemberStateRecord,
};
pub use config::Config;
pub use error::{CrafdError, Result};
