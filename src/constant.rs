// Window size constants
pub const DEFAULT_WINDOW_WIDTH: f32 = 900.0;
pub const DEFAULT_WINDOW_HEIGHT: f32 = 600.0;
pub const DEFAULT_WINDOW_TITLE: &str = "FileStamp";

/// Application name and metadata constants
pub const APP_NAME: &str = "FileStamp";

/// App related Magic Numbers
///
/// How many directory entries the walker processes before yielding back to
/// the event loop, so repaints and cancellation stay responsive.
pub const WALK_BATCH_SIZE: usize = 50;

/// Display and edit format shared by all four timestamp fields.
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
