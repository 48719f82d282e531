use std::time::{Duration, Instant};

use crate::{
    assets::{
        decode::decode_image,
        store::{ImageStore, MemoryImageStore},
    },
    config::{
        document::ConfigDocument,
        persist::{DEFAULT_SAVE_DEBOUNCE, Debouncer, MemorySettingsStore, SettingsStore, load_or_default},
        slot::{ImageId, SlotEffectConfig, SlotId},
    },
    export::{
        pipeline::{ExportOpts, ExportedImage, export_scene},
        sink::{ExportReport, ExportSink, InMemorySink, sanitize_filename},
    },
    foundation::{
        core::{Point, PosterSpec, Vec2},
        error::{StardreamError, StardreamResult},
    },
    layout::slots::slot_placement,
    render::{
        cpu::{CpuRenderer, RenderSettings},
        frame::FrameRGBA,
    },
    scene::{
        composer::compose_scene,
        node::{RootTransform, Scene},
    },
    texture::cache::{TextureCache, TextureStatus},
    viewport::{ViewportOpts, compute_viewport_scale, viewport_root_transform, viewport_to_poster},
};

#[derive(Clone, Copy, Debug)]
pub struct SessionOpts {
    pub poster: PosterSpec,
    pub export: ExportOpts,
    pub viewport: ViewportOpts,
    /// Quiet period before a document edit is written to the settings store.
    pub debounce: Duration,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            poster: PosterSpec::default(),
            export: ExportOpts::default(),
            viewport: ViewportOpts::default(),
            debounce: DEFAULT_SAVE_DEBOUNCE,
        }
    }
}

/// An editing session over one poster.
///
/// The document is replaced wholesale on every edit and is authoritative in memory immediately;
/// writes to the settings store are debounced and flushed by [`EditorSession::tick`]. The live
/// scene is recomposed after every state change.
pub struct EditorSession {
    opts: SessionOpts,
    document: ConfigDocument,
    selection: Option<SlotId>,
    textures: TextureCache,
    images: Box<dyn ImageStore>,
    settings: Box<dyn SettingsStore>,
    pending_save: Debouncer<ConfigDocument>,
    renderer: Option<CpuRenderer>,
    sink: Box<dyn ExportSink>,
    viewport: Vec2,
    root: RootTransform,
    live: Scene,
}

impl EditorSession {
    /// Open a session, loading (and migrating) the persisted document.
    pub fn new(
        opts: SessionOpts,
        images: Box<dyn ImageStore>,
        settings: Box<dyn SettingsStore>,
        sink: Box<dyn ExportSink>,
    ) -> Self {
        let migrated = load_or_default(settings.as_ref());
        if !migrated.is_clean() {
            tracing::warn!(
                backfilled = migrated.backfilled.len(),
                repaired = migrated.repaired.len(),
                "loaded document needed migration"
            );
        }
        let mut textures = TextureCache::new(opts.poster);
        textures.sync(&migrated.document);

        let viewport = Vec2::new(
            opts.poster.width_f64() + opts.viewport.sidebar_width,
            opts.poster.height_f64() + opts.viewport.margin,
        );
        let root = viewport_root_transform(viewport, opts.viewport, opts.poster);
        let mut session = Self {
            opts,
            document: migrated.document,
            selection: None,
            textures,
            images,
            settings,
            pending_save: Debouncer::new(opts.debounce),
            renderer: Some(CpuRenderer::new(RenderSettings::default())),
            sink,
            viewport,
            root,
            live: Scene::new(opts.poster),
        };
        session.rebuild();
        session
    }

    /// Session backed entirely by in-memory stores.
    pub fn in_memory(opts: SessionOpts) -> Self {
        Self::new(
            opts,
            Box::new(MemoryImageStore::new()),
            Box::new(MemorySettingsStore::new()),
            Box::new(InMemorySink::new()),
        )
    }

    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    pub fn poster(&self) -> PosterSpec {
        self.opts.poster
    }

    /// Attach or detach the renderer. Exports fail while none is attached.
    pub fn set_renderer(&mut self, renderer: Option<CpuRenderer>) {
        self.renderer = renderer;
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    /// Replace the whole document. Takes effect immediately; persistence is debounced.
    pub fn set_document(&mut self, doc: ConfigDocument) -> StardreamResult<()> {
        doc.validate()?;
        if self.selection.is_some_and(|s| doc.slot(s).is_none()) {
            self.selection = None;
        }
        self.document = doc;
        self.textures.sync(&self.document);
        self.pending_save
            .schedule(self.document.clone(), Instant::now());
        self.rebuild();
        Ok(())
    }

    /// Copy the document, edit one slot and install the result.
    pub fn update_slot(
        &mut self,
        id: SlotId,
        edit: impl FnOnce(&mut SlotEffectConfig),
    ) -> StardreamResult<()> {
        let mut doc = self.document.clone();
        let slot = doc
            .slot_mut(id)
            .ok_or_else(|| StardreamError::validation(format!("unknown slot '{id}'")))?;
        edit(slot);
        self.set_document(doc)
    }

    pub fn selection(&self) -> Option<SlotId> {
        self.selection
    }

    /// Select a slot, or clear the selection. Unknown slots clear it.
    pub fn select(&mut self, slot: Option<SlotId>) {
        self.selection = slot.filter(|s| self.document.slot(*s).is_some());
        self.rebuild();
    }

    /// Validate and store an image, returning its id.
    pub fn import_image(&mut self, bytes: &[u8], original_name: &str) -> StardreamResult<ImageId> {
        decode_image(bytes)?;
        let id = self.images.save(bytes, original_name)?;
        tracing::info!(image = %id, name = original_name, bytes = bytes.len(), "imported image");
        Ok(id)
    }

    pub fn images(&self) -> &dyn ImageStore {
        self.images.as_ref()
    }

    pub fn texture_status(&self, slot: SlotId) -> Option<TextureStatus> {
        self.textures.status(slot)
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    /// Load every outstanding slot texture. Returns the number of results applied.
    pub fn resolve_textures(&mut self) -> usize {
        let applied = self.textures.resolve_pending(self.images.as_ref());
        if applied > 0 {
            self.rebuild();
        }
        applied
    }

    /// Flush a debounced document write whose quiet period has elapsed by `now`.
    /// Returns whether a write happened.
    pub fn tick(&mut self, now: Instant) -> StardreamResult<bool> {
        match self.pending_save.take_due(now) {
            Some(doc) => self.save(&doc).map(|()| true),
            None => Ok(false),
        }
    }

    /// Write any pending document immediately.
    pub fn flush_settings(&mut self) -> StardreamResult<bool> {
        match self.pending_save.flush() {
            Some(doc) => self.save(&doc).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn has_pending_save(&self) -> bool {
        self.pending_save.is_pending()
    }

    fn save(&mut self, doc: &ConfigDocument) -> StardreamResult<()> {
        match self.settings.save(doc) {
            Ok(()) => {
                tracing::info!("saved document");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "document save failed, keeping in-memory state");
                Err(e)
            }
        }
    }

    pub fn compute_viewport_scale(&self, viewport: Vec2) -> f64 {
        compute_viewport_scale(viewport, self.opts.viewport, self.opts.poster)
    }

    /// Refit the live view to a new viewport size.
    pub fn resize(&mut self, viewport: Vec2) {
        self.viewport = viewport;
        self.root = viewport_root_transform(viewport, self.opts.viewport, self.opts.poster);
        tracing::debug!(scale = self.root.scale.x, "viewport resized");
        self.rebuild();
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn root(&self) -> RootTransform {
        self.root
    }

    /// Compose the current document, selection and resolved textures into a scene carrying the
    /// viewport root transform.
    pub fn render(&self) -> Scene {
        let mut scene = compose_scene(
            &self.document,
            self.selection,
            &self.textures,
            self.opts.poster,
        );
        scene.root = self.root;
        scene
    }

    /// The scene currently on display.
    pub fn scene(&self) -> &Scene {
        &self.live
    }

    fn rebuild(&mut self) {
        self.live = self.render();
    }

    /// Rasterize the live scene at the viewport size.
    pub fn render_frame(&mut self) -> StardreamResult<FrameRGBA> {
        let renderer = self
            .renderer
            .as_mut()
            .ok_or_else(|| StardreamError::validation("no renderer attached"))?;
        let w = self.viewport.x.round().max(0.0) as u32;
        let h = self.viewport.y.round().max(0.0) as u32;
        renderer.render(&self.live, w, h)
    }

    /// Slot under a viewport-space point, topmost first.
    pub fn handle_click(&self, point: Point) -> Option<SlotId> {
        let local = viewport_to_poster(&self.root, point)? - self.opts.poster.center();
        let mut candidates: Vec<_> = self
            .document
            .slots()
            .filter_map(|(id, cfg)| {
                slot_placement(id, cfg, self.opts.poster, self.selection == Some(id))
                    .map(|p| (id, p))
            })
            .collect();
        candidates.sort_by_key(|(_, p)| std::cmp::Reverse(p.z));
        candidates
            .into_iter()
            .find(|(_, p)| (local - p.position).hypot() <= p.visual_radius())
            .map(|(id, _)| id)
    }

    /// Export the live scene at export resolution without delivering it.
    pub fn export_image(&mut self) -> StardreamResult<ExportedImage> {
        export_scene(self.renderer.as_mut(), &mut self.live, &self.opts.export)
    }

    /// Export the live scene and deliver the PNG to the export sink.
    #[tracing::instrument(skip(self))]
    pub fn trigger_export(&mut self, filename: &str) -> StardreamResult<ExportReport> {
        let filename = sanitize_filename(filename)?;
        let image = self.export_image()?;
        let location = self.sink.deliver(&filename, &image.png)?;
        tracing::info!(%location, bytes = image.png.len(), "export delivered");
        Ok(ExportReport {
            filename,
            location,
            width: image.width,
            height: image.height,
            bytes: image.png.len(),
        })
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("poster", &self.opts.poster)
            .field("selection", &self.selection)
            .field("viewport", &self.viewport)
            .field("has_renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}
