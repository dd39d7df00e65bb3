//! Edit-operation store
//!
//! Same shape as the annotation store, for content edits. It also tracks
//! the last saved list so the host can show a dirty indicator and warn
//! before leaving with unsaved edits.

use crate::annotation_store::{point_near_segment, rect_contains};
use crate::history::History;
use doc_model::{
    EditGranularity, EditorOp, EditorOpKind, EditorOpPatch, OpId, Point, Rect, ShapeDefaults,
    ShapeKind, TextStyle,
};

/// Tool selected in edit mode. `None` on the store means select mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditTool {
    InsertText,
    InsertImage,
    DrawShape(ShapeKind),
}

#[derive(Debug, Clone)]
pub struct EditOperationStore {
    ops: Vec<EditorOp>,
    active_tool: Option<EditTool>,
    text_style: TextStyle,
    shape: ShapeDefaults,
    granularity: EditGranularity,
    selected: Option<OpId>,
    history: History<EditorOp>,
    saved: Vec<EditorOp>,
}

impl EditOperationStore {
    pub fn new(text_style: TextStyle, shape: ShapeDefaults, history_limit: usize) -> Self {
        Self {
            ops: Vec::new(),
            active_tool: None,
            text_style,
            shape,
            granularity: EditGranularity::default(),
            selected: None,
            history: History::new(history_limit),
            saved: Vec::new(),
        }
    }

    pub fn add_op(&mut self, page: u32, rect: Rect, kind: EditorOpKind) -> EditorOp {
        let op = EditorOp::new(page, rect.clamped_to_page(), kind);
        self.history.record(&self.ops);
        self.ops.push(op.clone());
        tracing::debug!(id = %op.id, kind = ?op.op_type(), page, "edit operation added");
        op
    }

    /// Merge `patch` into the op. Unknown ids are a logged no-op.
    pub fn update_op(&mut self, id: OpId, patch: &EditorOpPatch) -> bool {
        let Some(index) = self.index_of(id) else {
            tracing::debug!(%id, "update for unknown edit operation ignored");
            return false;
        };

        self.history.record(&self.ops);
        let op = &mut self.ops[index];
        op.apply(patch);
        op.rect = op.rect.clamped_to_page();
        true
    }

    pub fn delete_op(&mut self, id: OpId) -> bool {
        let Some(index) = self.index_of(id) else {
            tracing::debug!(%id, "delete for unknown edit operation ignored");
            return false;
        };

        self.history.record(&self.ops);
        self.ops.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        true
    }

    /// Remove an op whose authoring gesture was abandoned. If its creation is
    /// the newest undo entry that entry goes too, so the source region looks
    /// as if it was never clicked.
    pub fn discard_op(&mut self, id: OpId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };

        let mut remaining = self.ops.clone();
        remaining.remove(index);
        if self.history.peek_undo() == Some(remaining.as_slice()) {
            self.history.pop_undo();
            self.ops = remaining;
            if self.selected == Some(id) {
                self.selected = None;
            }
            return true;
        }
        self.delete_op(id)
    }

    /// Drop every op as one undoable change.
    pub fn clear_ops(&mut self) {
        if self.ops.is_empty() {
            return;
        }
        self.history.record(&self.ops);
        self.ops.clear();
        self.selected = None;
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.ops);
        self.drop_stale_selection();
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.ops);
        self.drop_stale_selection();
        changed
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn begin_gesture(&mut self) {
        self.history.begin_batch(&self.ops);
    }

    pub fn end_gesture(&mut self) {
        self.history.end_batch(&self.ops);
    }

    pub fn get(&self, id: OpId) -> Option<&EditorOp> {
        self.ops.iter().find(|op| op.id == id)
    }

    pub fn ops(&self) -> &[EditorOp] {
        &self.ops
    }

    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    pub fn ops_for_page(&self, page: u32) -> Vec<&EditorOp> {
        self.ops.iter().filter(|op| op.page == page).collect()
    }

    /// Topmost op on `page` under `point`.
    pub fn hit_test(&self, page: u32, point: &Point, tolerance: f32) -> Option<&EditorOp> {
        self.ops
            .iter()
            .rev()
            .filter(|op| op.page == page)
            .find(|op| op_contains(op, point, tolerance))
    }

    pub fn select_op(&mut self, id: Option<OpId>) {
        match id {
            Some(id) if self.index_of(id).is_none() => {
                tracing::debug!(%id, "selection of unknown edit operation ignored");
            }
            _ => self.selected = id,
        }
    }

    pub fn selected(&self) -> Option<OpId> {
        self.selected
    }

    pub fn selected_op(&self) -> Option<&EditorOp> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn set_active_tool(&mut self, tool: Option<EditTool>) {
        self.active_tool = tool;
    }

    pub fn active_tool(&self) -> Option<EditTool> {
        self.active_tool
    }

    pub fn text_style(&self) -> &TextStyle {
        &self.text_style
    }

    pub fn text_style_mut(&mut self) -> &mut TextStyle {
        &mut self.text_style
    }

    pub fn shape_defaults(&self) -> &ShapeDefaults {
        &self.shape
    }

    pub fn shape_defaults_mut(&mut self) -> &mut ShapeDefaults {
        &mut self.shape
    }

    pub fn granularity(&self) -> EditGranularity {
        self.granularity
    }

    pub fn set_granularity(&mut self, granularity: EditGranularity) {
        self.granularity = granularity;
    }

    pub fn insert_text_kind(&self) -> EditorOpKind {
        EditorOpKind::InsertText { text: String::new(), style: self.text_style.clone() }
    }

    pub fn insert_image_kind(&self) -> EditorOpKind {
        EditorOpKind::InsertImage { image_data: None, keep_aspect: true }
    }

    pub fn draw_shape_kind(&self, shape: ShapeKind) -> EditorOpKind {
        EditorOpKind::DrawShape {
            shape,
            stroke_color: self.shape.stroke_color,
            stroke_width: self.shape.stroke_width,
            fill_color: self.shape.fill_color,
        }
    }

    /// Whether the list differs from what was last saved.
    pub fn is_dirty(&self) -> bool {
        self.ops != self.saved
    }

    /// Ops as of the last successful save.
    pub fn saved_ops(&self) -> &[EditorOp] {
        &self.saved
    }

    /// Record `saved` as the persisted baseline.
    pub fn mark_saved(&mut self, saved: Vec<EditorOp>) {
        self.saved = saved;
    }

    fn index_of(&self, id: OpId) -> Option<usize> {
        self.ops.iter().position(|op| op.id == id)
    }

    fn drop_stale_selection(&mut self) {
        if let Some(id) = self.selected {
            if self.index_of(id).is_none() {
                self.selected = None;
            }
        }
    }
}

impl Default for EditOperationStore {
    fn default() -> Self {
        Self::new(TextStyle::default(), ShapeDefaults::default(), 100)
    }
}

/// Endpoints of a line shape: bottom-left to top-right of its rect.
pub fn line_shape_endpoints(rect: &Rect) -> (Point, Point) {
    (Point::new(rect.x, rect.bottom()), Point::new(rect.right(), rect.y))
}

fn op_contains(op: &EditorOp, point: &Point, tolerance: f32) -> bool {
    match op.kind {
        EditorOpKind::DrawShape { shape: ShapeKind::Line, .. } => {
            let (start, end) = line_shape_endpoints(&op.rect);
            point_near_segment(point, &start, &end, tolerance)
        }
        _ => rect_contains(&op.rect, point, tolerance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{SourceLine, TextStylePatch};

    fn replace_kind(text: &str) -> EditorOpKind {
        EditorOpKind::ReplaceText {
            text: text.to_owned(),
            style: TextStyle::default(),
            original_text: text.to_owned(),
            original_lines: vec![SourceLine { text: text.to_owned(), rect: Rect::new(0.1, 0.1, 0.3, 0.02) }],
        }
    }

    #[test]
    fn undo_and_redo_restore_ids() {
        let mut store = EditOperationStore::default();
        let ids: Vec<_> = (0..3)
            .map(|_| store.add_op(1, Rect::new(0.1, 0.1, 0.2, 0.1), store.insert_text_kind()).id)
            .collect();

        while store.undo() {}
        assert_eq!(store.op_count(), 0);
        while store.redo() {}
        assert_eq!(store.ops().iter().map(|op| op.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn dirty_tracks_saved_baseline() {
        let mut store = EditOperationStore::default();
        assert!(!store.is_dirty());

        let op = store.add_op(1, Rect::new(0.1, 0.1, 0.2, 0.1), replace_kind("Hello"));
        assert!(store.is_dirty());

        store.mark_saved(store.ops().to_vec());
        assert!(!store.is_dirty());

        store.update_op(op.id, &EditorOpPatch::text("World"));
        assert!(store.is_dirty());
        store.undo();
        assert!(!store.is_dirty());
    }

    #[test]
    fn discard_removes_fresh_op_without_history() {
        let mut store = EditOperationStore::default();
        let op = store.add_op(2, Rect::new(0.1, 0.1, 0.3, 0.02), replace_kind("Hello"));
        store.select_op(Some(op.id));

        assert!(store.discard_op(op.id));
        assert_eq!(store.op_count(), 0);
        assert_eq!(store.selected(), None);
        assert!(!store.can_undo());
    }

    #[test]
    fn discard_after_later_changes_is_undoable_delete() {
        let mut store = EditOperationStore::default();
        let op = store.add_op(2, Rect::new(0.1, 0.1, 0.3, 0.02), replace_kind("Hello"));
        store.update_op(
            op.id,
            &EditorOpPatch {
                style: TextStylePatch { bold: Some(true), ..Default::default() },
                ..Default::default()
            },
        );

        assert!(store.discard_op(op.id));
        assert_eq!(store.op_count(), 0);
        assert!(store.undo());
        assert_eq!(store.op_count(), 1);
    }

    #[test]
    fn shape_kind_uses_defaults() {
        let mut store = EditOperationStore::default();
        store.shape_defaults_mut().fill_color = Some(doc_model::Color::WHITE);
        let kind = store.draw_shape_kind(ShapeKind::Ellipse);
        assert!(matches!(
            kind,
            EditorOpKind::DrawShape { shape: ShapeKind::Ellipse, fill_color: Some(_), stroke_width, .. }
                if stroke_width == 1.0
        ));
    }

    #[test]
    fn line_shape_hit_follows_diagonal() {
        let mut store = EditOperationStore::default();
        store.add_op(1, Rect::new(0.0, 0.0, 0.4, 0.4), store.draw_shape_kind(ShapeKind::Line));

        assert!(store.hit_test(1, &Point::new(0.2, 0.2), 0.01).is_some());
        assert!(store.hit_test(1, &Point::new(0.05, 0.05), 0.01).is_none());
    }

    #[test]
    fn clear_is_single_undo_step() {
        let mut store = EditOperationStore::default();
        store.add_op(1, Rect::new(0.1, 0.1, 0.1, 0.1), store.insert_image_kind());
        store.add_op(1, Rect::new(0.3, 0.1, 0.1, 0.1), store.insert_image_kind());
        store.clear_ops();
        assert_eq!(store.op_count(), 0);
        assert!(store.undo());
        assert_eq!(store.op_count(), 2);
    }
}
