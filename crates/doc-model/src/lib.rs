//! Persisted entity model for the page markup overlay.
//!
//! Every geometric value in this crate is normalized: a fraction in `[0, 1]`
//! of the current page width or height, so entities survive any zoom or DPI.

pub mod annotation;
pub mod color;
pub mod editor_op;
pub mod geometry;
pub mod preferences;

pub use annotation::{
    Annotation, AnnotationId, AnnotationKind, AnnotationPatch, AnnotationType, ArrowHead, Fill,
    InkPath, LineStyle,
};
pub use color::Color;
pub use editor_op::{
    EditGranularity, EditorOp, EditorOpKind, EditorOpPatch, EditorOpType, OpId, ShapeKind,
    SourceLine, TextAlign, TextStyle, TextStylePatch,
};
pub use geometry::{Point, Rect};
pub use preferences::{AnnotationDefaults, OverlayPreferences, ShapeDefaults};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("invalid color `{0}`: expected #rgb, #rrggbb or #rrggbbaa")]
    InvalidColor(String),
}
