use crate::{
    foundation::{
        core::Vec2,
        error::{StardreamError, StardreamResult},
    },
    render::cpu::CpuRenderer,
    scene::node::{RootTransform, Scene},
};

/// Default export raster, three times the logical poster.
pub const EXPORT_WIDTH: u32 = 5400;
pub const EXPORT_HEIGHT: u32 = 7200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOpts {
    pub width: u32,
    pub height: u32,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            width: EXPORT_WIDTH,
            height: EXPORT_HEIGHT,
        }
    }
}

impl ExportOpts {
    pub fn validate(&self) -> StardreamResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StardreamError::validation("export size must be non-zero"));
        }
        Ok(())
    }
}

/// PNG produced by one export.
#[derive(Clone, Debug)]
pub struct ExportedImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Temporarily rescales a live scene and hides its overlays. Dropping the guard restores both,
/// including during unwinding.
pub(crate) struct ExportGuard<'a> {
    scene: &'a mut Scene,
    saved_root: RootTransform,
    hidden: Vec<Vec<usize>>,
}

impl<'a> ExportGuard<'a> {
    pub(crate) fn apply(scene: &'a mut Scene, root: RootTransform) -> Self {
        let hidden = scene.visible_overlay_paths();
        for path in &hidden {
            if let Some(node) = scene.node_mut(path) {
                node.visible = false;
            }
        }
        let saved_root = std::mem::replace(&mut scene.root, root);
        Self {
            scene,
            saved_root,
            hidden,
        }
    }

    pub(crate) fn scene(&self) -> &Scene {
        self.scene
    }

    pub(crate) fn hidden_count(&self) -> usize {
        self.hidden.len()
    }
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.scene.root = self.saved_root;
        for path in &self.hidden {
            if let Some(node) = self.scene.node_mut(path) {
                node.visible = true;
            }
        }
    }
}

/// Re-render `scene` offscreen at the export resolution without interactive overlays and encode
/// it as PNG.
///
/// The live scene's root transform and overlay visibility are restored before this returns,
/// whether or not the export succeeded.
#[tracing::instrument(skip_all, fields(width = opts.width, height = opts.height))]
pub fn export_scene(
    renderer: Option<&mut CpuRenderer>,
    scene: &mut Scene,
    opts: &ExportOpts,
) -> StardreamResult<ExportedImage> {
    opts.validate()?;
    let Some(renderer) = renderer else {
        return Err(StardreamError::export("no renderer available"));
    };

    let scale = Vec2::new(
        f64::from(opts.width) / scene.poster.width_f64(),
        f64::from(opts.height) / scene.poster.height_f64(),
    );
    let frame = {
        let guard = ExportGuard::apply(
            scene,
            RootTransform {
                scale,
                position: Vec2::ZERO,
            },
        );
        tracing::debug!(hidden = guard.hidden_count(), "overlays hidden for export");
        renderer
            .render(guard.scene(), opts.width, opts.height)
            .map_err(|e| StardreamError::export(format!("render failed: {e}")))?
    };

    let png = frame.encode_png()?;
    tracing::info!(bytes = png.len(), "encoded export");
    Ok(ExportedImage {
        width: frame.width,
        height: frame.height,
        png,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
