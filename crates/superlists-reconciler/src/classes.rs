//! Classes and data keys the reconciler writes. They form the styling
//! contract with the extension stylesheet.

pub const LIST_TOGGLE: &str = "sl-list-toggle";
pub const LIST_PLACEHOLDER: &str = "sl-list-placeholder";
pub const PLACEHOLDER_TITLE: &str = "sl-placeholder-title";
pub const PLACEHOLDER_BADGE: &str = "sl-placeholder-badge";
pub const WIP_BADGE: &str = "sl-wip-badge";
pub const COLLAPSED: &str = "sl-collapsed";

pub const WIP_REACHED: &str = "sl-wip-reached";
pub const WIP_EXCEEDED: &str = "sl-wip-exceeded";
pub const WIP_TOP_BAR: &str = "sl-wip-top-bar";

pub const GROUP_HEADER: &str = "sl-group-header";
pub const GROUP_TITLE: &str = "sl-group-title";
pub const GROUP_BADGE: &str = "sl-group-badge";
pub const GROUP_TOGGLE: &str = "sl-group-toggle";
pub const SUB_LIST: &str = "sl-sub-list";
pub const SUB_LIST_FIRST: &str = "sl-sub-list-first";
pub const SUB_LIST_LAST: &str = "sl-sub-list-last";

pub const SECTION: &str = "sl-section";
pub const SECTION_TITLE: &str = "sl-section-title";
pub const SECTION_COLLAPSED: &str = "sl-section-collapsed";
pub const COMMENT: &str = "sl-comment";
pub const BLOCKED: &str = "sl-blocked";

pub const COMPACT: &str = "sl-compact";
pub const COMPACT_TOGGLE: &str = "sl-compact-toggle";

pub const DATA_GROUP: &str = "sl-group";
pub const DATA_SUB_INDEX: &str = "sl-sub-index";
pub const DATA_LABELS: &str = "sl-labels";
pub const DATA_FIELDS: &str = "sl-fields";
pub const DATA_LIST_WIDTH: &str = "sl-list-width";
