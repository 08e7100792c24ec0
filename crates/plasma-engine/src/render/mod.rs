//! Render command interpreter and its GPU backend.
//!
//! A frame arrives as one [`Message`](plasma_wire::Message) holding an opcode
//! stream. The [`Interpreter`] decodes it, keeps the transform stacks and the
//! active render mode, appends geometry to per-frame rings, and flushes
//! batches to a [`DrawBackend`] as [`DrawCall`]s.
//!
//! | Module | Contents |
//! |--------|----------|
//! | `cmd` | opcode numbering, stack selector |
//! | `interp` | stream state machine, convenience primitives |
//! | `mode` | render modes, batch activation and flush |
//! | `transform` | object/view/projection/world stacks |
//! | `ring`, `data` | frame-slotted geometry and constants |
//! | `writer` | stream encoder |
//! | `gpu` | wgpu backend |

mod backend;
mod cmd;
mod config;
mod ctx;
mod data;
mod error;
mod interp;
mod mode;
mod ring;
mod transform;
mod writer;

pub mod gpu;

pub use backend::{DrawBackend, DrawCall, PipelineId, KNOWN_PROGRAMS};
#[cfg(test)]
pub(crate) use backend::RecordingBackend;
pub use cmd::{RenderCmd, StackKind};
pub use config::RenderConfig;
pub use ctx::{RenderCtx, RenderTarget};
pub use data::{argb_to_rgba, Constants, Position, RenderData, Uv, VertexColor};
pub use error::{BackendError, DecodeError};
pub use interp::{FrameReport, Interpreter};
pub use mode::{Batch, BlendFactor, ModeDef, ModeEntry, ModeTable, Shape, FILL_MODE, IMAGE_MODE, LINE_MODE};
pub use ring::FrameRing;
pub use transform::TransformStacks;
pub use writer::CommandWriter;
