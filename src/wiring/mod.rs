//! Wiring Module - literal nodes and the edges that feed parameters
//!
//! - `primitives`: `PrimitiveNodeManager` (normalize, allocate ids, create)
//! - `wirer`: connect / disconnect / find_sources on `WorkflowVersionGraph`

mod primitives;
mod wirer;

pub use primitives::{
    basename, infer_kind, mirror_value, normalize, FileProbe, IdAllocator, Literal, LocalFiles,
    NoLocalFiles, PrimitiveNodeManager, UPLOADED_FILE_PREFIX,
};
