//! Annotation store
//!
//! Owns every markup annotation in the open document, the active annotation
//! tool, the session-default style channels, the single selection, and the
//! snapshot history. All mutations go through this type so that undo/redo
//! covers them.

use crate::history::History;
use chrono::Utc;
use doc_model::{
    Annotation, AnnotationDefaults, AnnotationId, AnnotationKind, AnnotationPatch, AnnotationType,
    Color, InkPath, Point, Rect,
};
use std::collections::BTreeMap;

/// Tool selected in annotate mode. `None` on the store means select mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationTool {
    Draw(AnnotationType),
    /// Drag out a rectangle without creating an entity
    AreaSelect,
}

/// Caller-supplied fields of a new annotation; id and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnnotation {
    pub page: u32,
    pub rect: Rect,
    pub kind: AnnotationKind,
    /// Falls back to the default color channel
    pub color: Option<Color>,
    /// Falls back to the default opacity channel
    pub opacity: Option<f32>,
}

impl NewAnnotation {
    pub fn new(page: u32, rect: Rect, kind: AnnotationKind) -> Self {
        Self { page, rect, kind, color: None, opacity: None }
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    active_tool: Option<AnnotationTool>,
    defaults: AnnotationDefaults,
    author: Option<String>,
    selected: Option<AnnotationId>,
    history: History<Annotation>,
}

impl AnnotationStore {
    pub fn new(defaults: AnnotationDefaults, history_limit: usize) -> Self {
        Self {
            annotations: Vec::new(),
            active_tool: None,
            defaults,
            author: None,
            selected: None,
            history: History::new(history_limit),
        }
    }

    pub fn add_annotation(&mut self, new: NewAnnotation) -> Annotation {
        let color = new.color.unwrap_or(self.defaults.color);
        let opacity = new.opacity.unwrap_or(self.defaults.opacity).clamp(0.0, 1.0);
        let mut annotation =
            Annotation::new(new.page, new.rect.clamped_to_page(), color, opacity, new.kind);
        annotation.author = self.author.clone();

        self.history.record(&self.annotations);
        self.annotations.push(annotation.clone());
        tracing::debug!(
            id = %annotation.id,
            kind = ?annotation.annotation_type(),
            page = annotation.page,
            "annotation added"
        );
        annotation
    }

    /// Merge `patch` into the annotation. Unknown ids are a logged no-op.
    pub fn update_annotation(&mut self, id: AnnotationId, patch: &AnnotationPatch) -> bool {
        let Some(index) = self.index_of(id) else {
            tracing::debug!(%id, "update for unknown annotation ignored");
            return false;
        };

        self.history.record(&self.annotations);
        let annotation = &mut self.annotations[index];
        annotation.apply(patch);
        annotation.rect = annotation.rect.clamped_to_page();
        annotation.modified_at = Utc::now();
        true
    }

    pub fn delete_annotation(&mut self, id: AnnotationId) -> bool {
        let Some(index) = self.index_of(id) else {
            tracing::debug!(%id, "delete for unknown annotation ignored");
            return false;
        };

        self.history.record(&self.annotations);
        self.annotations.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        true
    }

    /// Remove an annotation created by the gesture that is now being
    /// abandoned. When its creation is the newest undo entry, that entry is
    /// dropped too so no history trace remains.
    pub fn discard_annotation(&mut self, id: AnnotationId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };

        let mut remaining = self.annotations.clone();
        remaining.remove(index);
        if self.history.peek_undo() == Some(remaining.as_slice()) {
            self.history.pop_undo();
            self.annotations = remaining;
            if self.selected == Some(id) {
                self.selected = None;
            }
            return true;
        }
        self.delete_annotation(id)
    }

    /// Remove every annotation as a single undoable change.
    pub fn clear(&mut self) {
        if self.annotations.is_empty() {
            return;
        }
        self.history.record(&self.annotations);
        self.annotations.clear();
        self.selected = None;
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.annotations);
        self.drop_stale_selection();
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.annotations);
        self.drop_stale_selection();
        changed
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Coalesce the following updates (a drag gesture) into one undo step.
    pub fn begin_gesture(&mut self) {
        self.history.begin_batch(&self.annotations);
    }

    pub fn end_gesture(&mut self) {
        self.history.end_batch(&self.annotations);
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Annotations on `page` in insertion order (bottom to top).
    pub fn annotations_for_page(&self, page: u32) -> Vec<&Annotation> {
        self.annotations.iter().filter(|a| a.page == page).collect()
    }

    /// Topmost annotation on `page` under `point`.
    pub fn hit_test(&self, page: u32, point: &Point, tolerance: f32) -> Option<&Annotation> {
        self.annotations
            .iter()
            .rev()
            .filter(|a| a.page == page)
            .find(|a| annotation_contains(a, point, tolerance))
    }

    pub fn select_annotation(&mut self, id: Option<AnnotationId>) {
        match id {
            Some(id) if self.index_of(id).is_none() => {
                tracing::debug!(%id, "selection of unknown annotation ignored");
            }
            _ => self.selected = id,
        }
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    pub fn selected_annotation(&self) -> Option<&Annotation> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn set_active_tool(&mut self, tool: Option<AnnotationTool>) {
        self.active_tool = tool;
    }

    pub fn active_tool(&self) -> Option<AnnotationTool> {
        self.active_tool
    }

    pub fn defaults(&self) -> &AnnotationDefaults {
        &self.defaults
    }

    pub fn defaults_mut(&mut self) -> &mut AnnotationDefaults {
        &mut self.defaults
    }

    pub fn set_author(&mut self, author: Option<String>) {
        self.author = author;
    }

    /// Next sequence marker value: one past the largest on any page.
    pub fn next_sequence_number(&self) -> u32 {
        self.annotations
            .iter()
            .filter_map(|a| match a.kind {
                AnnotationKind::SequenceNumber { sequence_number } => Some(sequence_number),
                _ => None,
            })
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Text markup over selected source text, one annotation per line rect,
    /// recorded as a single undo step. Only highlight, underline and
    /// strikethrough apply.
    pub fn add_text_markup(
        &mut self,
        page: u32,
        annotation_type: AnnotationType,
        line_rects: &[Rect],
    ) -> Vec<Annotation> {
        if !matches!(
            annotation_type,
            AnnotationType::Highlight | AnnotationType::Underline | AnnotationType::Strikethrough
        ) {
            tracing::debug!(kind = ?annotation_type, "not a text markup type");
            return Vec::new();
        }

        self.begin_gesture();
        let created = line_rects
            .iter()
            .filter(|rect| rect.width > 0.0 && rect.height > 0.0)
            .map(|rect| {
                let kind = self.template(annotation_type);
                self.add_annotation(NewAnnotation::new(page, *rect, kind))
            })
            .collect();
        self.end_gesture();
        created
    }

    /// Variant fields for a new annotation of `annotation_type`, filled from
    /// the default channels. Geometry (line endpoints, ink paths) is left
    /// empty for the caller to set.
    pub fn template(&self, annotation_type: AnnotationType) -> AnnotationKind {
        let defaults = &self.defaults;
        match annotation_type {
            AnnotationType::Highlight => AnnotationKind::Highlight,
            AnnotationType::Underline => AnnotationKind::Underline,
            AnnotationType::Strikethrough => AnnotationKind::Strikethrough,
            AnnotationType::Comment => AnnotationKind::Comment { text: String::new() },
            AnnotationType::Freetext => {
                AnnotationKind::Freetext { text: String::new(), fontsize: defaults.font_size }
            }
            AnnotationType::Ink => AnnotationKind::Ink { paths: Vec::new() },
            AnnotationType::Rectangle => AnnotationKind::Rectangle {
                stroke_width: defaults.stroke_width,
                line_style: defaults.line_style,
                fill: defaults.fill,
            },
            AnnotationType::Ellipse => AnnotationKind::Ellipse {
                stroke_width: defaults.stroke_width,
                line_style: defaults.line_style,
                fill: defaults.fill,
            },
            AnnotationType::Line => AnnotationKind::Line {
                stroke_width: defaults.stroke_width,
                line_style: defaults.line_style,
                start_point: Point::default(),
                end_point: Point::default(),
            },
            AnnotationType::Arrow => AnnotationKind::Arrow {
                stroke_width: defaults.stroke_width,
                line_style: defaults.line_style,
                start_point: Point::default(),
                end_point: Point::default(),
                start_arrow: defaults.start_arrow,
                end_arrow: defaults.end_arrow,
            },
            AnnotationType::SequenceNumber => {
                AnnotationKind::SequenceNumber { sequence_number: self.next_sequence_number() }
            }
            AnnotationType::Stamp => AnnotationKind::Stamp {
                stamp_type: defaults.stamp_type.clone(),
                image_data: None,
                rotation: 0.0,
            },
        }
    }

    /// Single ink stroke styled from the default channels.
    pub fn ink_path(&self, points: Vec<Point>) -> InkPath {
        InkPath { points, stroke_width: self.defaults.ink_width, color: self.defaults.color }
    }

    /// Annotations grouped by page, the layout persisted next to the document.
    pub fn export_by_page(&self) -> BTreeMap<u32, Vec<Annotation>> {
        let mut pages: BTreeMap<u32, Vec<Annotation>> = BTreeMap::new();
        for annotation in &self.annotations {
            pages.entry(annotation.page).or_default().push(annotation.clone());
        }
        pages
    }

    /// Replace all annotations with previously saved ones; history starts fresh.
    pub fn load(&mut self, pages: BTreeMap<u32, Vec<Annotation>>) {
        self.annotations = pages
            .into_iter()
            .flat_map(|(page, annotations)| {
                annotations.into_iter().map(move |mut annotation| {
                    annotation.page = page;
                    annotation
                })
            })
            .collect();
        self.selected = None;
        self.history.clear();
        tracing::info!(count = self.annotations.len(), "annotations loaded");
    }

    fn index_of(&self, id: AnnotationId) -> Option<usize> {
        self.annotations.iter().position(|a| a.id == id)
    }

    fn drop_stale_selection(&mut self) {
        if let Some(id) = self.selected {
            if self.index_of(id).is_none() {
                self.selected = None;
            }
        }
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new(AnnotationDefaults::default(), 100)
    }
}

/// Whether `point` lies on the annotation, within `tolerance` (normalized).
pub fn annotation_contains(annotation: &Annotation, point: &Point, tolerance: f32) -> bool {
    match &annotation.kind {
        AnnotationKind::Line { start_point, end_point, .. }
        | AnnotationKind::Arrow { start_point, end_point, .. } => {
            point_near_segment(point, start_point, end_point, tolerance)
        }
        AnnotationKind::Ink { paths } => paths.iter().any(|path| {
            path.points
                .windows(2)
                .any(|pair| point_near_segment(point, &pair[0], &pair[1], tolerance))
                || (path.points.len() == 1 && path.points[0].distance_to(point) <= tolerance)
        }),
        _ => rect_contains(&annotation.rect, point, tolerance),
    }
}

pub(crate) fn rect_contains(rect: &Rect, point: &Point, tolerance: f32) -> bool {
    point.x >= rect.x - tolerance
        && point.x <= rect.right() + tolerance
        && point.y >= rect.y - tolerance
        && point.y <= rect.bottom() + tolerance
}

pub(crate) fn point_near_segment(point: &Point, start: &Point, end: &Point, tolerance: f32) -> bool {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-12 {
        return point.distance_to(start) <= tolerance;
    }

    let t = (((point.x - start.x) * dx + (point.y - start.y) * dy) / length_sq).clamp(0.0, 1.0);
    let closest = Point::new(start.x + t * dx, start.y + t * dy);
    point.distance_to(&closest) <= tolerance
}
