/// Application name
pub const APP_NAME: &str = "Kominukator";

/// Key of the shared slot holding the serialized store document
pub const STORE_KEY: &str = "kominukator_db";

/// Key of the per-tab slot holding the serialized session user
pub const SESSION_KEY: &str = "kominukator_session";

/// Fallback reconciliation interval in milliseconds
pub const SYNC_POLL_INTERVAL_MS: u64 = 1_000;

/// Presence heartbeat interval in seconds
pub const HEARTBEAT_INTERVAL_SECS: u64 = 10;

/// A user whose last heartbeat is younger than this is shown as "Active now"
pub const ACTIVE_NOW_WINDOW_SECS: i64 = 60;

/// Minimum nickname length accepted by the login view
pub const MIN_NICKNAME_LEN: usize = 3;

/// Maximum attachment size in bytes (the whole document lives in one slot)
pub const MAX_ATTACHMENT_SIZE: u64 = 500_000;

/// Number of characters of the target text shown in a reply preview
pub const REPLY_PREVIEW_CHARS: usize = 30;

/// Avatar used when none was chosen
pub const DEFAULT_AVATAR_EMOJI: &str = "👤";
pub const DEFAULT_AVATAR_COLOR: &str = "#888";

/// Colors offered by the avatar picker
pub const PRESET_COLORS: [&str; 19] = [
    "#EF5350", "#EC407A", "#AB47BC", "#7E57C2", "#5C6BC0", "#42A5F5", "#29B6F6", "#26C6DA",
    "#26A69A", "#66BB6A", "#9CCC65", "#D4E157", "#FFEE58", "#FFCA28", "#FFA726", "#FF7043",
    "#8D6E63", "#BDBDBD", "#78909C",
];

/// Emojis offered by the avatar picker's randomize action
pub const DEFAULT_EMOJIS: [&str; 12] = [
    "😀", "😎", "👻", "🤖", "👽", "🐼", "🦊", "🐱", "🐶", "🐯", "🦁", "🐵",
];

/// Avatar preselected on the login form
pub const LOGIN_FORM_EMOJI: &str = "😎";
pub const LOGIN_FORM_COLOR: &str = "#42A5F5";
