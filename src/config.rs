//! Global configuration constants for the post-processing stack.

/// Shader names resolved through the material cache.
pub mod shaders {
    pub const UBER: &str = "Hidden/Post FX/Uber Shader";
    pub const FXAA: &str = "Hidden/Post FX/FXAA";
    pub const TAA: &str = "Hidden/Post FX/Temporal Anti-aliasing";
    pub const EYE_ADAPTATION: &str = "Hidden/Post FX/Eye Adaptation";
    pub const DEPTH_OF_FIELD: &str = "Hidden/Post FX/Depth Of Field";
    pub const BLOOM: &str = "Hidden/Post FX/Bloom";
    pub const LUT_GENERATOR: &str = "Hidden/Post FX/Lut Generator";
    pub const AMBIENT_OCCLUSION: &str = "Hidden/Post FX/Ambient Occlusion";
    pub const SCREEN_SPACE_REFLECTION: &str = "Hidden/Post FX/Screen Space Reflection";
    pub const FOG: &str = "Hidden/Post FX/Fog";
    pub const MOTION_BLUR: &str = "Hidden/Post FX/Motion Blur";
    pub const DEBUG_VIEWS: &str = "Hidden/Post FX/Builtin Debug Views";

    /// Every shader the stack may request, in registration order of their owners.
    pub const ALL: [&str; 12] = [
        DEBUG_VIEWS,
        AMBIENT_OCCLUSION,
        SCREEN_SPACE_REFLECTION,
        FOG,
        MOTION_BLUR,
        TAA,
        EYE_ADAPTATION,
        DEPTH_OF_FIELD,
        BLOOM,
        LUT_GENERATOR,
        UBER,
        FXAA,
    ];
}

/// Frame budget used for the post-processing overrun warning (milliseconds).
pub const DEFAULT_FRAME_BUDGET_MS: f32 = 16.6;

/// Delta time assumed until the host supplies one (seconds).
pub const DEFAULT_DELTA_TIME: f32 = 1.0 / 60.0;

/// Free pool targets unused for this many frames are destroyed.
pub const POOL_MAX_IDLE_FRAMES: u32 = 8;

/// Length of the Halton jitter cycle used by temporal antialiasing.
pub const TAA_SAMPLE_COUNT: u32 = 8;

/// Number of previous frames kept for motion-blur frame blending.
pub const MOTION_BLUR_MAX_HISTORY: usize = 4;

/// Edge length of the baked color-grading LUT (stored as a `size² × size` strip).
pub const COLOR_GRADING_LUT_SIZE: u32 = 32;

/// Number of tiled noise patterns cycled by dithering.
pub const DITHERING_TEXTURE_COUNT: u32 = 64;

/// Tile size, in pixels, of the dithering noise pattern.
pub const DITHERING_TILE_SIZE: f32 = 64.0;

/// Tile size, in pixels, of the film-grain pattern.
pub const GRAIN_LOOKUP_SIZE: f32 = 192.0;

/// Largest texture edge the reference device accepts.
pub const MAX_TEXTURE_SIZE: u32 = 16384;

/// Height of the 35mm film back used for depth-of-field lens math (meters).
pub const FILM_HEIGHT: f32 = 0.024;

/// Upper bound on the bloom mip chain.
pub const BLOOM_MAX_ITERATIONS: usize = 16;
