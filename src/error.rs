use thiserror::Error;

#[derive(Error, Debug)]
pub enum CisoError {
    /// The source matched neither the Redump nor the raw XDVDFS layout.
    #[error("could not detect ISO type: {0}")]
    LayoutDetection(String),

    /// The block codec could not be set up.
    #[error("compression context creation failed: {0}")]
    CodecInit(String),

    /// Propagated I/O error with a short description of the operation.
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while reading, compressing or writing one block.
    #[error("block {block} failed: {source}")]
    Block {
        block: u64,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while opening, padding or sealing an output volume.
    #[error("volume {volume} failed: {source}")]
    Volume {
        volume: u32,
        #[source]
        source: std::io::Error,
    },

    /// Geometry that cannot be represented in the container format.
    #[error("format error: {0}")]
    Format(String),
}

impl CisoError {
    /// Wrap an I/O error with the operation that produced it.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CisoError::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit status reported by the command line tool.
    pub fn exit_code(&self) -> i32 {
        match self {
            CisoError::LayoutDetection(_) => 1,
            CisoError::CodecInit(_) => 2,
            _ => 1,
        }
    }
}
