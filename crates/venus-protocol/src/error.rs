/// Vulkan result codes that cross the wire.
///
/// Only the codes the covered commands can actually return are named;
/// anything else decodes as `Unknown` and is treated as failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VkResult {
    Success,
    NotReady,
    Timeout,
    Incomplete,
    ErrorOutOfHostMemory,
    ErrorOutOfDeviceMemory,
    ErrorInitializationFailed,
    ErrorDeviceLost,
    ErrorExtensionNotPresent,
    ErrorFeatureNotPresent,
    Unknown(i32),
}

impl VkResult {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Success,
            1 => Self::NotReady,
            2 => Self::Timeout,
            5 => Self::Incomplete,
            -1 => Self::ErrorOutOfHostMemory,
            -2 => Self::ErrorOutOfDeviceMemory,
            -3 => Self::ErrorInitializationFailed,
            -4 => Self::ErrorDeviceLost,
            -7 => Self::ErrorExtensionNotPresent,
            -8 => Self::ErrorFeatureNotPresent,
            other => Self::Unknown(other),
        }
    }

    pub fn as_raw(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::NotReady => 1,
            Self::Timeout => 2,
            Self::Incomplete => 5,
            Self::ErrorOutOfHostMemory => -1,
            Self::ErrorOutOfDeviceMemory => -2,
            Self::ErrorInitializationFailed => -3,
            Self::ErrorDeviceLost => -4,
            Self::ErrorExtensionNotPresent => -7,
            Self::ErrorFeatureNotPresent => -8,
            Self::Unknown(raw) => *raw,
        }
    }

    /// Success and the non-error status codes (VK_NOT_READY etc).
    pub fn is_ok(&self) -> bool {
        self.as_raw() >= 0 && !matches!(self, Self::Unknown(_))
    }
}

/// Errors raised while encoding or decoding a command stream.
///
/// These are sticky on the cursor that raised them; by the time one is
/// observed the stream is unusable and the connection should be torn down.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StreamError {
    #[error("read past the end of the stream")]
    OutOfBounds,

    #[error("encoder could not grow the output stream")]
    OutOfSpace,

    #[error("array size {got} exceeds the caller limit {max}")]
    ArraySize { got: u64, max: u64 },

    #[error("unrecognized sType {0} in a pNext chain")]
    UnexpectedStructureType(i32),

    #[error("unrecognized command type {0}")]
    UnknownCommand(u32),

    #[error("reply echoes command {got:#x}, expected {expected:#x}")]
    CommandMismatch { expected: u32, got: u32 },

    #[error("command failed with {0:?}")]
    Vk(VkResult),
}
