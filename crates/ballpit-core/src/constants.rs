//! Engine constants and tuning parameters.

// --- Frame timing ---

/// Largest simulation step applied in one frame (seconds).
/// Longer gaps (e.g. a backgrounded tab) are clamped to this.
pub const MAX_STEP_SEC: f64 = 1.0 / 30.0;

/// Default global time scale (1.0 = real time).
pub const DEFAULT_TIME_SCALE: f64 = 1.0;

/// Time of death for entities that never expire.
pub const NEVER: f64 = f64::MAX;

/// Interval between fps recomputations (milliseconds of frame time).
pub const FPS_INTERVAL_MS: f64 = 1000.0;

/// Default RNG seed. Same seed = same barrel layout and shake jitter.
pub const DEFAULT_SEED: u64 = 42;

// --- Camera ---

/// Nominal eye distance used for depth parallax: a layer at z = d renders
/// at half scale.
pub const CAMERA_DISTANCE: f32 = 30.0;

/// Default visible world extent (world units across the short axis).
pub const CAMERA_VIEWPORT: f32 = 20.0;

/// Shake low-pass filter smoothing factor.
pub const SHAKE_ALPHA: f32 = 10.0;

/// Rotation low-pass filter smoothing factor.
pub const ANGLE_ALPHA: f32 = 3.0;

/// Fraction of the filtered rotation applied to the canvas.
pub const ANGLE_GAIN: f32 = 0.8;

/// Smoothing factor of the eased camera (centre and viewport).
pub const EASING_ALPHA: f32 = 1.0;

// --- Physics ---

/// Spring frequency used when a distance joint asks for a rigid link.
pub const RIGID_JOINT_FREQUENCY_HZ: f32 = 60.0;

// --- Debug overlay ---

/// Base line width of debug outlines, in screen pixels.
pub const DEBUG_LINE_WIDTH: f32 = 1.0;

/// Font used for stats and debug lines.
pub const DEBUG_FONT: &str = "10px sans-serif";

/// Vertical spacing of debug lines (pixels).
pub const DEBUG_LINE_SPACING: f32 = 20.0;

/// Default clear colour.
pub const DEFAULT_BACKGROUND: &str = "black";
