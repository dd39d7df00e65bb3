//! Per-page authoring state machine
//!
//! Turns pointer and keyboard events on one page overlay into store
//! mutations. States are Idle, Drawing, Dragging and EditingText; Idle is
//! both initial and terminal. Events are handled to completion one at a
//! time, and the stores are borrowed for the duration of a single event.

use crate::annotation_store::{AnnotationStore, AnnotationTool, NewAnnotation};
use crate::coords::{PageSize, PageViewport, PixelPoint};
use crate::correlator::{region_at, replace_text_kind, TextBlockCorrelator};
use crate::edit_store::{EditOperationStore, EditTool};
use crate::handles::{generate_handles, hit_handle, moved_rect, resized_rect, HandleType};
use crate::text_blocks::TextBlock;
use crate::text_buffer::TextBufferHistory;
use doc_model::{
    AnnotationId, AnnotationKind, AnnotationPatch, AnnotationType, EditorOpPatch, EditorOpType,
    OpId, OverlayPreferences, Point, Rect,
};
use std::time::{Duration, Instant};

/// Which store the overlay authors into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    #[default]
    Annotate,
    Edit,
}

/// An entity in either store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Annotation(AnnotationId),
    Op(OpId),
}

/// Everything one event needs: the document's stores plus this page's geometry.
pub struct OverlayContext<'a> {
    pub annotations: &'a mut AnnotationStore,
    pub edits: &'a mut EditOperationStore,
    pub mode: OverlayMode,
    /// 1-indexed page
    pub page: u32,
    pub viewport: PageViewport,
    pub page_size: PageSize,
    pub text_blocks: &'a [TextBlock],
}

/// Input delivered to one page overlay
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    /// Pointer positions are rendered pixels relative to the page's top-left corner
    PointerDown(PixelPoint),
    PointerMove(PixelPoint),
    PointerUp(PixelPoint),
    /// Full buffer content after an edit
    TextInput { content: String, at: Instant },
    /// Re-open the selected text entity for typing
    EditSelected,
    /// Explicit confirm or loss of focus
    Confirm,
    /// Escape
    Cancel,
    /// Delete the selected entity
    Delete,
    /// Local text undo while editing, document undo otherwise
    Undo,
    Redo,
}

/// What handling an event did, for the host to react to
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayOutcome {
    /// Event had no effect in the current state
    Ignored,
    SelectionChanged(Option<EntityRef>),
    /// Drawing, moving or resizing began
    GestureStarted,
    Created(EntityRef),
    /// Geometry or content written through to the store
    Updated(EntityRef),
    Deleted(EntityRef),
    /// Degenerate or abandoned gesture; nothing stored
    Discarded,
    /// Area-select tool finished; the host picks the text under the rect
    AreaSelected(Rect),
    /// Text entity open for typing; input is buffered from here on
    EditingStarted(EntityRef),
    /// Input kept in the local buffer, store untouched
    Buffered,
    /// Local text undo/redo produced new buffer content for the host to show
    BufferRestored(String),
    /// Buffer flushed into the entity
    Committed(EntityRef),
    /// Document undo or redo changed the store
    HistoryChanged,
}

/// In-progress geometry for preview rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    Rect(Rect),
    Segment { start: Point, end: Point },
    Path(Vec<Point>),
}

/// Tool that started a Drawing gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawTool {
    Annotation(AnnotationType),
    AreaSelect,
    Edit(EditTool),
}

/// Drawing state. Points are normalized and clamped to the page.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawGesture {
    pub tool: DrawTool,
    /// Pointer-down position
    pub anchor: Point,
    /// Latest pointer position
    pub current: Point,
    /// Ink samples
    pub path: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Position only
    Move,
    /// Bottom-right corner, top-left fixed
    Resize,
}

/// Dragging state of a selected entity
#[derive(Debug, Clone, PartialEq)]
pub struct DragGesture {
    pub target: EntityRef,
    pub mode: DragMode,
    /// Pointer minus rect origin at grab time
    pub grab_offset: Point,
    /// Whether any pointer move changed the rect
    pub moved: bool,
}

/// EditingText state: content typed since the entity was opened
#[derive(Debug, Clone)]
pub struct TextSession {
    pub target: EntityRef,
    /// Uncommitted content
    pub buffer: String,
    history: TextBufferHistory,
}

#[derive(Debug, Clone, Default)]
pub enum AuthoringState {
    #[default]
    Idle,
    Drawing(DrawGesture),
    Dragging(DragGesture),
    EditingText(TextSession),
}

/// Tunables taken from [`OverlayPreferences`]
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoringConfig {
    /// Normalized; a rect gesture needs width or height above this
    pub min_draw_size: f32,
    /// Keep every Nth ink sample
    pub ink_decimation_step: usize,
    pub text_debounce: Duration,
    pub text_history_capacity: usize,
    pub handle_size_px: f32,
    /// Normalized width of a sequence marker
    pub marker_size: f32,
}

impl From<&OverlayPreferences> for AuthoringConfig {
    fn from(prefs: &OverlayPreferences) -> Self {
        Self {
            min_draw_size: prefs.min_draw_size,
            ink_decimation_step: prefs.ink_decimation_step,
            text_debounce: Duration::from_millis(prefs.text_debounce_ms),
            text_history_capacity: prefs.text_history_capacity,
            handle_size_px: prefs.handle_size_px,
            marker_size: prefs.marker_size,
        }
    }
}

impl Default for AuthoringConfig {
    fn default() -> Self {
        Self::from(&OverlayPreferences::default())
    }
}

type Transition = (AuthoringState, OverlayOutcome);

#[derive(Debug, Clone, Default)]
pub struct AuthoringStateMachine {
    state: AuthoringState,
    config: AuthoringConfig,
}

impl AuthoringStateMachine {
    pub fn new(config: AuthoringConfig) -> Self {
        Self { state: AuthoringState::Idle, config }
    }

    pub fn state(&self) -> &AuthoringState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, AuthoringState::Idle)
    }

    /// Live buffer while editing text.
    pub fn buffer(&self) -> Option<&str> {
        match &self.state {
            AuthoringState::EditingText(session) => Some(&session.buffer),
            _ => None,
        }
    }

    pub fn draft(&self) -> Option<Draft> {
        let AuthoringState::Drawing(gesture) = &self.state else {
            return None;
        };
        Some(match gesture.tool {
            DrawTool::Annotation(AnnotationType::Ink) => Draft::Path(gesture.path.clone()),
            DrawTool::Annotation(AnnotationType::Line | AnnotationType::Arrow) => {
                Draft::Segment { start: gesture.anchor, end: gesture.current }
            }
            _ => Draft::Rect(Rect::from_corners(gesture.anchor, gesture.current)),
        })
    }

    pub fn handle(&mut self, ctx: &mut OverlayContext<'_>, event: OverlayEvent) -> OverlayOutcome {
        let state = std::mem::take(&mut self.state);
        let (next, outcome) = match state {
            AuthoringState::Idle => self.on_idle(ctx, event),
            AuthoringState::Drawing(gesture) => self.on_drawing(ctx, gesture, event),
            AuthoringState::Dragging(gesture) => self.on_dragging(ctx, gesture, event),
            AuthoringState::EditingText(session) => self.on_editing(ctx, session, event),
        };
        self.state = next;
        outcome
    }

    fn on_idle(&self, ctx: &mut OverlayContext<'_>, event: OverlayEvent) -> Transition {
        match event {
            // Handles of an entity at the page edge can sit outside the page
            OverlayEvent::PointerDown(px) => match self.press_handle(ctx, px) {
                Some(transition) => transition,
                None if ctx.viewport.contains(px) => self.pointer_down(ctx, px),
                None => idle(OverlayOutcome::Ignored),
            },
            OverlayEvent::Delete => match selected(ctx) {
                Some((target, _)) => {
                    delete(ctx, target);
                    (AuthoringState::Idle, OverlayOutcome::Deleted(target))
                }
                None => idle(OverlayOutcome::Ignored),
            },
            OverlayEvent::Cancel => {
                select(ctx, None);
                idle(OverlayOutcome::SelectionChanged(None))
            }
            OverlayEvent::Undo | OverlayEvent::Redo => {
                let redo = event == OverlayEvent::Redo;
                let changed = match (ctx.mode, redo) {
                    (OverlayMode::Annotate, false) => ctx.annotations.undo(),
                    (OverlayMode::Annotate, true) => ctx.annotations.redo(),
                    (OverlayMode::Edit, false) => ctx.edits.undo(),
                    (OverlayMode::Edit, true) => ctx.edits.redo(),
                };
                idle(if changed { OverlayOutcome::HistoryChanged } else { OverlayOutcome::Ignored })
            }
            OverlayEvent::EditSelected => match selected(ctx) {
                Some((target, _)) if is_text_entry(ctx, target) => {
                    let text = entity_text(ctx, target).unwrap_or_default();
                    (
                        AuthoringState::EditingText(self.text_session(target, text)),
                        OverlayOutcome::EditingStarted(target),
                    )
                }
                _ => idle(OverlayOutcome::Ignored),
            },
            _ => idle(OverlayOutcome::Ignored),
        }
    }

    fn pointer_down(&self, ctx: &mut OverlayContext<'_>, px: PixelPoint) -> Transition {
        let point = ctx.viewport.point_to_normalized(px);

        match ctx.mode {
            OverlayMode::Annotate => match ctx.annotations.active_tool() {
                None => self.select_at(ctx, point),
                Some(AnnotationTool::Draw(
                    ty @ (AnnotationType::SequenceNumber | AnnotationType::Stamp),
                )) => self.place_marker(ctx, ty, point),
                Some(AnnotationTool::Draw(ty)) => start_drawing(DrawTool::Annotation(ty), point),
                Some(AnnotationTool::AreaSelect) => start_drawing(DrawTool::AreaSelect, point),
            },
            OverlayMode::Edit => match ctx.edits.active_tool() {
                None => self.select_at(ctx, point),
                Some(EditTool::InsertText) => match self.claim_source_text(ctx, point) {
                    Some(transition) => transition,
                    None => start_drawing(DrawTool::Edit(EditTool::InsertText), point),
                },
                Some(tool) => start_drawing(DrawTool::Edit(tool), point),
            },
        }
    }

    /// Select-mode press on one of the current selection's handles.
    fn press_handle(&self, ctx: &mut OverlayContext<'_>, px: PixelPoint) -> Option<Transition> {
        let select_tool = match ctx.mode {
            OverlayMode::Annotate => ctx.annotations.active_tool().is_none(),
            OverlayMode::Edit => ctx.edits.active_tool().is_none(),
        };
        if !select_tool {
            return None;
        }

        let (target, rect) = selected(ctx)?;
        let on_page = match target {
            EntityRef::Annotation(id) => ctx.annotations.get(id).is_some_and(|a| a.page == ctx.page),
            EntityRef::Op(id) => ctx.edits.get(id).is_some_and(|op| op.page == ctx.page),
        };
        if !on_page {
            return None;
        }
        let handles = generate_handles(&rect, &ctx.viewport, self.config.handle_size_px);
        let point = ctx.viewport.point_to_normalized(px);
        match hit_handle(&handles, px)? {
            HandleType::Delete => {
                delete(ctx, target);
                Some(idle(OverlayOutcome::Deleted(target)))
            }
            HandleType::Move => Some(start_dragging(ctx, target, DragMode::Move, point, &rect)),
            HandleType::Resize => Some(start_dragging(ctx, target, DragMode::Resize, point, &rect)),
        }
    }

    /// Select-mode click: entities topmost first, then (edit mode) unclaimed
    /// source text.
    fn select_at(&self, ctx: &mut OverlayContext<'_>, point: Point) -> Transition {
        let tolerance = ctx.viewport.length_to_normalized(self.config.handle_size_px / 2.0);
        let hit = match ctx.mode {
            OverlayMode::Annotate => ctx
                .annotations
                .hit_test(ctx.page, &point, tolerance)
                .map(|a| (EntityRef::Annotation(a.id), a.rect)),
            OverlayMode::Edit => {
                ctx.edits.hit_test(ctx.page, &point, tolerance).map(|op| (EntityRef::Op(op.id), op.rect))
            }
        };
        if let Some((target, rect)) = hit {
            select(ctx, Some(target));
            let (state, _) = start_dragging(ctx, target, DragMode::Move, point, &rect);
            return (state, OverlayOutcome::SelectionChanged(Some(target)));
        }

        if ctx.mode == OverlayMode::Edit {
            if let Some(transition) = self.claim_source_text(ctx, point) {
                return transition;
            }
        }

        select(ctx, None);
        idle(OverlayOutcome::SelectionChanged(None))
    }

    /// Seed a replace_text op from the unclaimed source region under `point`.
    fn claim_source_text(&self, ctx: &mut OverlayContext<'_>, point: Point) -> Option<Transition> {
        let regions = TextBlockCorrelator::new(ctx.edits, ctx.page)
            .clickable_regions(ctx.text_blocks, ctx.edits.granularity());
        let region = region_at(&regions, &point)?;
        let block = ctx.text_blocks.get(region.block_index)?;
        let kind = replace_text_kind(region, block, &ctx.page_size, ctx.edits.text_style());

        let op = ctx.edits.add_op(ctx.page, region.rect, kind);
        let target = EntityRef::Op(op.id);
        select(ctx, Some(target));
        tracing::debug!(id = %op.id, page = ctx.page, "source text claimed for replacement");
        Some((
            AuthoringState::EditingText(self.text_session(target, region.text.clone())),
            OverlayOutcome::EditingStarted(target),
        ))
    }

    /// Click-placed entities (sequence markers, stamps), centered on the pointer.
    fn place_marker(
        &self,
        ctx: &mut OverlayContext<'_>,
        ty: AnnotationType,
        point: Point,
    ) -> Transition {
        let aspect = ctx.viewport.rendered_width() / ctx.viewport.rendered_height();
        let size = self.config.marker_size;
        let (width, height) = match ty {
            AnnotationType::Stamp => (size * 5.0, size * 2.0 * aspect),
            _ => (size, size * aspect),
        };
        let rect = Rect::new(point.x - width / 2.0, point.y - height / 2.0, width, height);
        let kind = ctx.annotations.template(ty);
        let created = ctx.annotations.add_annotation(NewAnnotation::new(ctx.page, rect, kind));
        let target = EntityRef::Annotation(created.id);
        select(ctx, Some(target));
        idle(OverlayOutcome::Created(target))
    }

    fn on_drawing(
        &self,
        ctx: &mut OverlayContext<'_>,
        mut gesture: DrawGesture,
        event: OverlayEvent,
    ) -> Transition {
        match event {
            OverlayEvent::PointerMove(px) => {
                gesture.current = clamp_point(ctx.viewport.point_to_normalized(px));
                if gesture.tool == DrawTool::Annotation(AnnotationType::Ink)
                    && gesture.path.last() != Some(&gesture.current)
                {
                    gesture.path.push(gesture.current);
                }
                (AuthoringState::Drawing(gesture), OverlayOutcome::Ignored)
            }
            OverlayEvent::PointerUp(px) => {
                gesture.current = clamp_point(ctx.viewport.point_to_normalized(px));
                if gesture.tool == DrawTool::Annotation(AnnotationType::Ink)
                    && gesture.path.last() != Some(&gesture.current)
                {
                    gesture.path.push(gesture.current);
                }
                self.commit_drawing(ctx, gesture)
            }
            OverlayEvent::Cancel => idle(OverlayOutcome::Discarded),
            _ => (AuthoringState::Drawing(gesture), OverlayOutcome::Ignored),
        }
    }

    fn commit_drawing(&self, ctx: &mut OverlayContext<'_>, gesture: DrawGesture) -> Transition {
        if gesture.tool == DrawTool::Annotation(AnnotationType::Ink) {
            if gesture.path.len() <= 2 {
                tracing::debug!(points = gesture.path.len(), "ink stroke too short, discarded");
                return idle(OverlayOutcome::Discarded);
            }
            let points = decimate(&gesture.path, self.config.ink_decimation_step);
            let rect = Rect::bounding(&points).unwrap_or_default();
            let kind = AnnotationKind::Ink { paths: vec![ctx.annotations.ink_path(points)] };
            let created = ctx.annotations.add_annotation(NewAnnotation::new(ctx.page, rect, kind));
            let target = EntityRef::Annotation(created.id);
            select(ctx, Some(target));
            return idle(OverlayOutcome::Created(target));
        }

        let rect = Rect::from_corners(gesture.anchor, gesture.current);
        let min = self.config.min_draw_size;
        if !(rect.width > min || rect.height > min) {
            tracing::debug!(
                width = rect.width,
                height = rect.height,
                "gesture below minimum size, discarded"
            );
            return idle(OverlayOutcome::Discarded);
        }

        let target = match gesture.tool {
            DrawTool::AreaSelect => return idle(OverlayOutcome::AreaSelected(rect)),
            DrawTool::Annotation(ty) => {
                let mut kind = ctx.annotations.template(ty);
                if let AnnotationKind::Line { start_point, end_point, .. }
                | AnnotationKind::Arrow { start_point, end_point, .. } = &mut kind
                {
                    *start_point = gesture.anchor;
                    *end_point = gesture.current;
                }
                let created = ctx.annotations.add_annotation(NewAnnotation::new(ctx.page, rect, kind));
                EntityRef::Annotation(created.id)
            }
            DrawTool::Edit(tool) => {
                let kind = match tool {
                    EditTool::InsertText => ctx.edits.insert_text_kind(),
                    EditTool::InsertImage => ctx.edits.insert_image_kind(),
                    EditTool::DrawShape(shape) => ctx.edits.draw_shape_kind(shape),
                };
                EntityRef::Op(ctx.edits.add_op(ctx.page, rect, kind).id)
            }
        };

        select(ctx, Some(target));
        if is_text_entry(ctx, target) {
            (
                AuthoringState::EditingText(self.text_session(target, String::new())),
                OverlayOutcome::Created(target),
            )
        } else {
            idle(OverlayOutcome::Created(target))
        }
    }

    fn on_dragging(
        &self,
        ctx: &mut OverlayContext<'_>,
        mut gesture: DragGesture,
        event: OverlayEvent,
    ) -> Transition {
        match event {
            OverlayEvent::PointerMove(px) => {
                let Some(rect) = entity_rect(ctx, gesture.target) else {
                    end_gesture(ctx, gesture.target);
                    return idle(OverlayOutcome::Ignored);
                };
                let point = ctx.viewport.point_to_normalized(px);
                let next = match gesture.mode {
                    DragMode::Move => moved_rect(&rect, gesture.grab_offset, point),
                    DragMode::Resize => resized_rect(&rect, point, self.config.min_draw_size),
                };
                if next == rect {
                    return (AuthoringState::Dragging(gesture), OverlayOutcome::Ignored);
                }
                update_rect(ctx, gesture.target, next);
                gesture.moved = true;
                let target = gesture.target;
                (AuthoringState::Dragging(gesture), OverlayOutcome::Updated(target))
            }
            OverlayEvent::PointerUp(_) | OverlayEvent::Cancel => {
                end_gesture(ctx, gesture.target);
                if gesture.moved {
                    idle(OverlayOutcome::Updated(gesture.target))
                } else {
                    idle(OverlayOutcome::Ignored)
                }
            }
            _ => (AuthoringState::Dragging(gesture), OverlayOutcome::Ignored),
        }
    }

    fn on_editing(
        &self,
        ctx: &mut OverlayContext<'_>,
        mut session: TextSession,
        event: OverlayEvent,
    ) -> Transition {
        match event {
            OverlayEvent::TextInput { content, at } => {
                session.history.record(&content, at);
                session.buffer = content;
                (AuthoringState::EditingText(session), OverlayOutcome::Buffered)
            }
            OverlayEvent::Undo | OverlayEvent::Redo => {
                let restored = if event == OverlayEvent::Undo {
                    session.history.undo().map(str::to_owned)
                } else {
                    session.history.redo().map(str::to_owned)
                };
                match restored {
                    Some(text) => {
                        session.buffer = text.clone();
                        (AuthoringState::EditingText(session), OverlayOutcome::BufferRestored(text))
                    }
                    None => (AuthoringState::EditingText(session), OverlayOutcome::Ignored),
                }
            }
            OverlayEvent::Confirm => commit_text(ctx, session),
            OverlayEvent::Cancel => cancel_text(ctx, session),
            OverlayEvent::PointerDown(px) => {
                let point = ctx.viewport.point_to_normalized(px);
                match entity_rect(ctx, session.target) {
                    Some(rect) if rect.contains(&point) => {
                        (AuthoringState::EditingText(session), OverlayOutcome::Ignored)
                    }
                    _ => commit_text(ctx, session),
                }
            }
            _ => (AuthoringState::EditingText(session), OverlayOutcome::Ignored),
        }
    }

    fn text_session(&self, target: EntityRef, text: String) -> TextSession {
        let history = TextBufferHistory::new(
            text.clone(),
            self.config.text_history_capacity,
            self.config.text_debounce,
        );
        TextSession { target, buffer: text, history }
    }
}

fn idle(outcome: OverlayOutcome) -> Transition {
    (AuthoringState::Idle, outcome)
}

fn start_drawing(tool: DrawTool, point: Point) -> Transition {
    let gesture = DrawGesture { tool, anchor: point, current: point, path: vec![point] };
    (AuthoringState::Drawing(gesture), OverlayOutcome::GestureStarted)
}

fn start_dragging(
    ctx: &mut OverlayContext<'_>,
    target: EntityRef,
    mode: DragMode,
    point: Point,
    rect: &Rect,
) -> Transition {
    match target {
        EntityRef::Annotation(_) => ctx.annotations.begin_gesture(),
        EntityRef::Op(_) => ctx.edits.begin_gesture(),
    }
    let grab_offset = Point::new(point.x - rect.x, point.y - rect.y);
    let gesture = DragGesture { target, mode, grab_offset, moved: false };
    (AuthoringState::Dragging(gesture), OverlayOutcome::GestureStarted)
}

fn end_gesture(ctx: &mut OverlayContext<'_>, target: EntityRef) {
    match target {
        EntityRef::Annotation(_) => ctx.annotations.end_gesture(),
        EntityRef::Op(_) => ctx.edits.end_gesture(),
    }
}

/// Flush the buffer into the entity and return to Idle.
fn commit_text(ctx: &mut OverlayContext<'_>, session: TextSession) -> Transition {
    let target = session.target;
    if entity_text(ctx, target).as_deref() != Some(session.buffer.as_str()) {
        match target {
            EntityRef::Annotation(id) => {
                ctx.annotations.update_annotation(id, &AnnotationPatch::text(session.buffer));
            }
            EntityRef::Op(id) => {
                ctx.edits.update_op(id, &EditorOpPatch::text(session.buffer));
            }
        }
    }
    idle(OverlayOutcome::Committed(target))
}

/// Escape: replaced source text is always restored; other text entities
/// are dropped only when left blank.
fn cancel_text(ctx: &mut OverlayContext<'_>, session: TextSession) -> Transition {
    let target = session.target;
    let always_discard = match target {
        EntityRef::Op(id) => ctx.edits.get(id).is_some_and(|op| op.op_type() == EditorOpType::ReplaceText),
        EntityRef::Annotation(_) => false,
    };

    if always_discard || session.buffer.trim().is_empty() {
        match target {
            EntityRef::Annotation(id) => ctx.annotations.discard_annotation(id),
            EntityRef::Op(id) => ctx.edits.discard_op(id),
        };
        return idle(OverlayOutcome::Deleted(target));
    }
    commit_text(ctx, session)
}

fn selected(ctx: &OverlayContext<'_>) -> Option<(EntityRef, Rect)> {
    match ctx.mode {
        OverlayMode::Annotate => {
            ctx.annotations.selected_annotation().map(|a| (EntityRef::Annotation(a.id), a.rect))
        }
        OverlayMode::Edit => ctx.edits.selected_op().map(|op| (EntityRef::Op(op.id), op.rect)),
    }
}

fn select(ctx: &mut OverlayContext<'_>, target: Option<EntityRef>) {
    match target {
        Some(EntityRef::Annotation(id)) => {
            ctx.annotations.select_annotation(Some(id));
            ctx.edits.select_op(None);
        }
        Some(EntityRef::Op(id)) => {
            ctx.edits.select_op(Some(id));
            ctx.annotations.select_annotation(None);
        }
        None => {
            ctx.annotations.select_annotation(None);
            ctx.edits.select_op(None);
        }
    }
}

fn delete(ctx: &mut OverlayContext<'_>, target: EntityRef) {
    match target {
        EntityRef::Annotation(id) => ctx.annotations.delete_annotation(id),
        EntityRef::Op(id) => ctx.edits.delete_op(id),
    };
}

fn entity_rect(ctx: &OverlayContext<'_>, target: EntityRef) -> Option<Rect> {
    match target {
        EntityRef::Annotation(id) => ctx.annotations.get(id).map(|a| a.rect),
        EntityRef::Op(id) => ctx.edits.get(id).map(|op| op.rect),
    }
}

fn entity_text(ctx: &OverlayContext<'_>, target: EntityRef) -> Option<String> {
    match target {
        EntityRef::Annotation(id) => ctx.annotations.get(id).and_then(|a| a.kind.text()).map(str::to_owned),
        EntityRef::Op(id) => ctx.edits.get(id).and_then(|op| op.kind.text()).map(str::to_owned),
    }
}

fn is_text_entry(ctx: &OverlayContext<'_>, target: EntityRef) -> bool {
    match target {
        EntityRef::Annotation(id) => {
            ctx.annotations.get(id).is_some_and(|a| a.annotation_type().is_text_entry())
        }
        EntityRef::Op(id) => ctx.edits.get(id).is_some_and(|op| op.op_type().is_text_entry()),
    }
}

fn update_rect(ctx: &mut OverlayContext<'_>, target: EntityRef, rect: Rect) {
    match target {
        EntityRef::Annotation(id) => ctx.annotations.update_annotation(id, &AnnotationPatch::rect(rect)),
        EntityRef::Op(id) => ctx.edits.update_op(id, &EditorOpPatch::rect(rect)),
    };
}

fn clamp_point(point: Point) -> Point {
    Point::new(point.x.clamp(0.0, 1.0), point.y.clamp(0.0, 1.0))
}

/// Keep every `step`th sample plus the first and last.
fn decimate(points: &[Point], step: usize) -> Vec<Point> {
    let step = step.max(1);
    let last = points.len().saturating_sub(1);
    points
        .iter()
        .enumerate()
        .filter(|(index, _)| index % step == 0 || *index == last)
        .map(|(_, point)| *point)
        .collect()
}
