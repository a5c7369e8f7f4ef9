pub mod card;
pub mod list_name;
pub mod section;
pub mod view_state;
pub mod wip;

pub use card::{is_comment, parse_field, CardTraits, BLOCKED_BADGE, COMMENT_PREFIX};
pub use list_name::{are_related, plan_groups, ListName};
pub use section::{SectionChange, SectionMarker};
pub use view_state::{BoardPrefs, BoardViewState, ListViewState, BOARD_SETTINGS_KEY};
pub use wip::{WipBadge, WipStatus};
