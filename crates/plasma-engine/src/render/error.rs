use thiserror::Error;

/// Recoverable problems found while decoding one frame's command stream.
///
/// None of these abort the frame; the interpreter records them in its
/// [`FrameReport`](super::FrameReport) and keeps going where it can.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("command stream read past its end (at byte {position})")]
    OutOfBounds { position: usize },

    #[error("unknown opcode {opcode} at byte {position}")]
    UnknownOpcode { opcode: i32, position: usize },

    #[error("opcode {opcode} is not valid in the {state} section (byte {position})")]
    UnexpectedOpcode {
        opcode: i32,
        state: &'static str,
        position: usize,
    },

    #[error("{kind} {id} is not defined")]
    MissingResource { kind: &'static str, id: i32 },

    #[error("offscreen canvas {canvas_id} skipped ({byte_size} bytes)")]
    UnsupportedCanvas { canvas_id: i32, byte_size: usize },
}

/// Resource-creation failures at the GPU boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("pipeline creation failed: {0}")]
    Pipeline(String),

    #[error("unknown shader program `{0}`")]
    UnknownProgram(String),

    #[error("texture error: {0}")]
    Texture(String),

    #[error("batch has {have} {attribute} for {need} positions")]
    ShortAttribute {
        attribute: &'static str,
        have: u32,
        need: u32,
    },
}
