//! PDF Markup Core Library
//!
//! Interactive authoring core for the page markup overlay: coordinate
//! conversion, the annotation and edit-operation stores with undo/redo,
//! source-text correlation, and the per-page authoring state machine.

pub mod annotation_store;
pub mod authoring;
pub mod coords;
pub mod correlator;
pub mod edit_store;
pub mod engine;
pub mod fonts;
pub mod handles;
pub mod history;
pub mod render;
pub mod session;
pub mod text_blocks;
pub mod text_buffer;

pub use annotation_store::{AnnotationStore, AnnotationTool, NewAnnotation};
pub use authoring::{
    AuthoringConfig, AuthoringState, AuthoringStateMachine, Draft, EntityRef, OverlayContext,
    OverlayEvent, OverlayMode, OverlayOutcome,
};
pub use coords::{PageSize, PageViewport, PixelPoint, PixelRect};
pub use correlator::{SourceRegion, TextBlockCorrelator};
pub use edit_store::{EditOperationStore, EditTool};
pub use engine::{ApplyOutcome, ApplyRequest, ApplyTarget, EngineError, PdfEngine, RasterImage};
pub use fonts::{map_font_family, FontCategory};
pub use handles::{generate_handles, HandleType, ManipulationHandle};
pub use history::History;
pub use render::{DrawCommand, RenderContext};
pub use session::{DocumentSession, SaveError, SaveTicket};
pub use text_blocks::{parse_text_blocks, TextBlock, TextLine};
pub use text_buffer::TextBufferHistory;
