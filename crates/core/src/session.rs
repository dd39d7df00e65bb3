//! One open document: store ownership, per-page overlays and the save guard

use crate::annotation_store::AnnotationStore;
use crate::authoring::{
    AuthoringConfig, AuthoringStateMachine, Draft, OverlayContext, OverlayEvent, OverlayMode,
    OverlayOutcome,
};
use crate::coords::{PageSize, PageViewport};
use crate::correlator::{SourceRegion, TextBlockCorrelator};
use crate::edit_store::EditOperationStore;
use crate::engine::{ApplyOutcome, ApplyRequest, ApplyTarget, EngineError, PdfEngine};
use crate::render::{
    annotation_commands, op_commands, selection_commands, DrawCommand, RenderContext, Stroke,
};
use crate::text_blocks::TextBlock;
use doc_model::{Annotation, AnnotationType, EditorOp, OverlayPreferences, Rect};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("engine rejected the edits: {0}")]
    Rejected(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A save in progress: the payload to hand to the engine and the baseline
/// the document will have once the engine accepts it.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    target: ApplyTarget,
    request: ApplyRequest,
    snapshot: Vec<EditorOp>,
}

impl SaveTicket {
    pub fn target(&self) -> ApplyTarget {
        self.target
    }

    pub fn request(&self) -> &ApplyRequest {
        &self.request
    }
}

/// Owns both stores of one document. Every page shares them, filtered by
/// page number, and each page gets its own authoring state machine.
#[derive(Debug)]
pub struct DocumentSession {
    annotations: AnnotationStore,
    edits: EditOperationStore,
    mode: OverlayMode,
    config: AuthoringConfig,
    overlays: BTreeMap<u32, AuthoringStateMachine>,
    page_sizes: BTreeMap<u32, PageSize>,
    text_blocks: BTreeMap<u32, Vec<TextBlock>>,
    save_in_flight: bool,
}

impl DocumentSession {
    pub fn new(prefs: &OverlayPreferences) -> Self {
        let mut annotations = AnnotationStore::new(prefs.annotation.clone(), prefs.history_limit);
        annotations.set_author(prefs.author.clone());
        let mut edits = EditOperationStore::new(
            prefs.text_style.clone(),
            prefs.shape.clone(),
            prefs.history_limit,
        );
        edits.set_granularity(prefs.granularity);

        Self {
            annotations,
            edits,
            mode: OverlayMode::default(),
            config: AuthoringConfig::from(prefs),
            overlays: BTreeMap::new(),
            page_sizes: BTreeMap::new(),
            text_blocks: BTreeMap::new(),
            save_in_flight: false,
        }
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut AnnotationStore {
        &mut self.annotations
    }

    pub fn edits(&self) -> &EditOperationStore {
        &self.edits
    }

    pub fn edits_mut(&mut self) -> &mut EditOperationStore {
        &mut self.edits
    }

    pub fn mode(&self) -> OverlayMode {
        self.mode
    }

    /// Switching modes abandons in-progress gestures and clears selection.
    pub fn set_mode(&mut self, mode: OverlayMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.overlays.clear();
        self.annotations.select_annotation(None);
        self.edits.select_op(None);
    }

    pub fn overlay(&self, page: u32) -> Option<&AuthoringStateMachine> {
        self.overlays.get(&page)
    }

    pub fn set_page_size(&mut self, page: u32, size: PageSize) {
        self.page_sizes.insert(page, size);
    }

    /// Source size in points; US Letter until the engine reports one.
    pub fn page_size(&self, page: u32) -> PageSize {
        self.page_sizes.get(&page).copied().unwrap_or_default()
    }

    pub fn set_text_blocks(&mut self, page: u32, blocks: Vec<TextBlock>) {
        self.text_blocks.insert(page, blocks);
    }

    pub fn text_blocks(&self, page: u32) -> &[TextBlock] {
        self.text_blocks.get(&page).map(Vec::as_slice).unwrap_or_default()
    }

    /// Fetch source text for `page`. Extraction failures leave the page with
    /// no editable regions rather than failing the overlay.
    pub fn load_text_blocks(&mut self, engine: &mut impl PdfEngine, page: u32) -> usize {
        let blocks = match engine.text_blocks(page) {
            Ok(blocks) => blocks,
            Err(error) => {
                tracing::warn!(page, %error, "text extraction failed, no editable regions");
                Vec::new()
            }
        };
        let count = blocks.len();
        self.text_blocks.insert(page, blocks);
        count
    }

    /// Source regions on `page` that are not already covered by a replace_text op.
    pub fn clickable_regions(&self, page: u32) -> Vec<SourceRegion> {
        TextBlockCorrelator::new(&self.edits, page)
            .clickable_regions(self.text_blocks(page), self.edits.granularity())
    }

    /// Highlight, underline or strike out every source line touching `area`,
    /// typically the rect reported by an area-select gesture.
    pub fn markup_text_in(
        &mut self,
        page: u32,
        annotation_type: AnnotationType,
        area: &Rect,
    ) -> Vec<Annotation> {
        let line_rects: Vec<Rect> = self
            .text_blocks(page)
            .iter()
            .flat_map(|block| &block.lines)
            .filter(|line| line.rect.intersection_area(area) > 0.0)
            .map(|line| line.rect)
            .collect();
        self.annotations.add_text_markup(page, annotation_type, &line_rects)
    }

    pub fn handle_event(
        &mut self,
        page: u32,
        viewport: PageViewport,
        event: OverlayEvent,
    ) -> OverlayOutcome {
        let config = &self.config;
        let machine =
            self.overlays.entry(page).or_insert_with(|| AuthoringStateMachine::new(config.clone()));
        let mut ctx = OverlayContext {
            annotations: &mut self.annotations,
            edits: &mut self.edits,
            mode: self.mode,
            page,
            viewport,
            page_size: self.page_sizes.get(&page).copied().unwrap_or_default(),
            text_blocks: self.text_blocks.get(&page).map(Vec::as_slice).unwrap_or_default(),
        };
        machine.handle(&mut ctx, event)
    }

    /// Everything drawn over the rendered page, in paint order: edit ops,
    /// annotations, the in-progress draft, then the selection.
    pub fn page_commands(&self, page: u32, viewport: PageViewport) -> Vec<DrawCommand> {
        let ctx = RenderContext {
            viewport,
            pdf_to_pixel_scale: viewport.pdf_to_pixel_scale(&self.page_size(page)),
        };

        let mut commands: Vec<DrawCommand> =
            self.edits.ops_for_page(page).into_iter().flat_map(|op| op_commands(op, &ctx)).collect();
        commands.extend(
            self.annotations
                .annotations_for_page(page)
                .into_iter()
                .flat_map(|a| annotation_commands(a, &ctx)),
        );

        if let Some(draft) = self.overlays.get(&page).and_then(AuthoringStateMachine::draft) {
            commands.extend(self.draft_commands(&draft, &viewport));
        }

        let selected = match self.mode {
            OverlayMode::Annotate => {
                self.annotations.selected_annotation().filter(|a| a.page == page).map(|a| a.rect)
            }
            OverlayMode::Edit => {
                self.edits.selected_op().filter(|op| op.page == page).map(|op| op.rect)
            }
        };
        if let Some(rect) = selected {
            commands.extend(selection_commands(&rect, &viewport, self.config.handle_size_px));
        }
        commands
    }

    fn draft_commands(&self, draft: &Draft, viewport: &PageViewport) -> Vec<DrawCommand> {
        let defaults = self.annotations.defaults();
        let stroke = Stroke {
            color: defaults.color,
            opacity: defaults.opacity,
            width: defaults.stroke_width,
            dash: Vec::new(),
        };
        match draft {
            Draft::Rect(rect) => {
                vec![DrawCommand::SelectionOutline { rect: viewport.rect_to_pixels(rect) }]
            }
            Draft::Segment { start, end } => vec![DrawCommand::Line {
                from: viewport.point_to_pixels(start),
                to: viewport.point_to_pixels(end),
                stroke,
            }],
            Draft::Path(points) => vec![DrawCommand::Polyline {
                points: points.iter().map(|point| viewport.point_to_pixels(point)).collect(),
                stroke: Stroke { width: defaults.ink_width, ..stroke },
            }],
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.edits.is_dirty()
    }

    pub fn is_saving(&self) -> bool {
        self.save_in_flight
    }

    /// Start a whole-document save. Returns `None` while another save is
    /// outstanding; the second request is dropped, not queued.
    pub fn begin_save(&mut self) -> Option<SaveTicket> {
        self.begin(ApplyTarget::Document)
    }

    /// Start a save of one 1-indexed page. Ops on other pages keep their
    /// saved state.
    pub fn begin_page_save(&mut self, page: u32) -> Option<SaveTicket> {
        self.begin(ApplyTarget::Page(page))
    }

    fn begin(&mut self, target: ApplyTarget) -> Option<SaveTicket> {
        if self.save_in_flight {
            tracing::warn!(scope = ?target, "save already in flight, request dropped");
            return None;
        }
        self.save_in_flight = true;
        let request = ApplyRequest::new(self.edits.ops(), &self.page_sizes);
        let (request, snapshot) = match target {
            ApplyTarget::Document => (request, self.edits.ops().to_vec()),
            ApplyTarget::Page(page) => (
                request.for_page(page),
                baseline_with_page(self.edits.ops(), self.edits.saved_ops(), page),
            ),
        };
        Some(SaveTicket { target, request, snapshot })
    }

    /// Give up on a save whose engine call will never settle. The document
    /// stays dirty and the next save may start.
    pub fn abort_save(&mut self, ticket: SaveTicket) {
        self.save_in_flight = false;
        tracing::debug!(scope = ?ticket.target, "save aborted");
    }

    /// Settle a save. Success makes the ticket's ops the clean baseline;
    /// failure leaves the document dirty for a retry.
    pub fn finish_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<ApplyOutcome, EngineError>,
    ) -> Result<ApplyOutcome, SaveError> {
        self.save_in_flight = false;
        let outcome = result.inspect_err(|error| tracing::warn!(%error, "save failed"))?;
        if !outcome.success {
            tracing::warn!(message = %outcome.message, "engine rejected save");
            return Err(SaveError::Rejected(outcome.message));
        }
        tracing::info!(applied = outcome.applied, "edits saved");
        self.edits.mark_saved(ticket.snapshot);
        Ok(outcome)
    }

    /// Apply every op through `engine`. `Ok(None)` when a save was already running.
    pub fn save_with(
        &mut self,
        engine: &mut impl PdfEngine,
    ) -> Result<Option<ApplyOutcome>, SaveError> {
        let ticket = self.begin_save();
        self.run_save(engine, ticket)
    }

    /// Apply the ops of one 1-indexed page through `engine`.
    pub fn save_page_with(
        &mut self,
        engine: &mut impl PdfEngine,
        page: u32,
    ) -> Result<Option<ApplyOutcome>, SaveError> {
        let ticket = self.begin_page_save(page);
        self.run_save(engine, ticket)
    }

    fn run_save(
        &mut self,
        engine: &mut impl PdfEngine,
        ticket: Option<SaveTicket>,
    ) -> Result<Option<ApplyOutcome>, SaveError> {
        let Some(ticket) = ticket else {
            return Ok(None);
        };
        let result = engine.apply_operations(ticket.target, ticket.request());
        self.finish_save(ticket, result).map(Some)
    }
}

/// Baseline after saving `page` alone: current ops of that page, the saved
/// version of every other op, in current order. Saved ops since deleted from
/// other pages stay at the end so those pages remain dirty.
fn baseline_with_page(current: &[EditorOp], saved: &[EditorOp], page: u32) -> Vec<EditorOp> {
    let mut baseline: Vec<EditorOp> = current
        .iter()
        .filter_map(|op| {
            if op.page == page {
                return Some(op.clone());
            }
            saved.iter().find(|stored| stored.id == op.id).cloned()
        })
        .collect();
    baseline.extend(
        saved
            .iter()
            .filter(|stored| stored.page != page && !current.iter().any(|op| op.id == stored.id))
            .cloned(),
    );
    baseline
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new(&OverlayPreferences::default())
    }
}
