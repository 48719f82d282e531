#![forbid(unsafe_code)]
//! Star-field collage poster compositor.
//!
//! A poster holds one core image slot and up to fourteen dream slots at seeded preset positions,
//! over a procedural star and nebula background. [`EditorSession`] owns the configuration
//! document, resolves masked slot textures, composes the [`Scene`] and exports it as a
//! print-resolution PNG.

mod assets;
mod background;
mod config;
mod effects;
mod export;
mod foundation;
mod layout;
mod render;
mod scene;
mod session;
mod texture;
mod viewport;

pub use assets::{
    decode::{DecodedImage, decode_image},
    store::{DirImageStore, ImageMeta, ImageStore, MemoryImageStore, content_id},
};
pub use background::{BackgroundField, NebulaBlob, Star};
pub use config::{
    document::{ConfigDocument, Migrated, migrate_document, migrate_document_str},
    persist::{
        DEFAULT_SAVE_DEBOUNCE, Debouncer, JsonFileSettingsStore, MemorySettingsStore,
        SettingsStore, load_for_migration, load_or_default,
    },
    slot::{ImageId, SlotEffectConfig, SlotId},
};
pub use effects::fx::{FilterChain, FilterStage};
pub use export::{
    pipeline::{EXPORT_HEIGHT, EXPORT_WIDTH, ExportOpts, ExportedImage, export_scene},
    sink::{DEFAULT_EXPORT_FILENAME, DirSink, ExportReport, ExportSink, InMemorySink},
};
pub use foundation::{
    core::{Affine, Point, PosterSpec, Rect, ShapeColor, Vec2},
    error::{StardreamError, StardreamResult},
    seeded::seeded,
};
pub use layout::{
    presets::{PRESET_COUNT, PRESET_POSITIONS, PresetPosition},
    slots::{
        SlotPlacement, Z_CORE, Z_DREAM, Z_DREAM_SELECTED, Z_SELECTION, slot_placement,
    },
};
pub use render::{
    cpu::{CpuRenderer, RenderSettings, RenderStats},
    frame::FrameRGBA,
};
pub use scene::{
    composer::{SLOTS_GROUP, compose_scene},
    node::{NodeContent, RootTransform, Scene, SceneNode, Shape},
};
pub use session::{EditorSession, SessionOpts};
pub use texture::{
    cache::{TextureCache, TextureKey, TextureStatus},
    mask::{MaskedTexture, build_masked_texture},
};
pub use viewport::{ViewportOpts, compute_viewport_scale, viewport_root_transform};
