/// Byte budget backing a single command stream. 8MiB
pub const COMMAND_STREAM_SIZE: usize = 1024 * 1024 * 8;

///
pub const MAX_FRAMES_IN_FLIGHT: u32 = 2;

/// Upper bound on descriptors per bindless kind.
pub const MAX_DESCRIPTOR_COUNT: u32 = 65535;

///
pub const MAX_NUM_ATTACHMENTS: usize = 6;

///
pub const MAX_NUM_COLOR_ATTACHMENTS: usize = MAX_NUM_ATTACHMENTS - 1;
