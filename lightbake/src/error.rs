use thiserror::Error;

#[derive(Debug, Error)]
pub enum BakeError {
    #[error("`{name}` holds {actual} items, but {expected} were expected")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("light #{index} has unknown type: {ty}")]
    UnknownLightType { index: usize, ty: u32 },

    #[error(
        "environment map has {actual} texels, but {expected} were expected \
         for dim={dim} and num_mips={num_mips}"
    )]
    InvalidEnvironment {
        dim: i32,
        num_mips: i32,
        expected: usize,
        actual: usize,
    },

    #[error("image width must be positive")]
    ZeroImageWidth,

    #[error("adapter is missing required features: {0:?}")]
    MissingFeatures(wgpu::Features),

    #[error(
        "push constants of {required} bytes are required, but the adapter \
         supports only {supported}"
    )]
    PushConstantsTooSmall { required: u32, supported: u32 },

    #[error(
        "dispatch of {count} work-items needs {workgroups} workgroups, but \
         the adapter supports at most {supported}"
    )]
    DispatchTooLarge {
        count: usize,
        workgroups: u32,
        supported: u32,
    },

    #[error("couldn't read buffer `{label}` back")]
    BufferMapping {
        label: String,
        #[source]
        source: wgpu::BufferAsyncError,
    },

    #[error("buffer `{label}` was dropped before it got mapped")]
    BufferMappingAborted { label: String },
}

impl BakeError {
    pub(crate) fn ensure_len(
        name: &'static str,
        expected: usize,
        actual: usize,
    ) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::LengthMismatch {
                name,
                expected,
                actual,
            })
        }
    }
}
