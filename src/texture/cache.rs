use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    assets::{decode::decode_image, store::ImageStore},
    config::{
        document::ConfigDocument,
        slot::{ImageId, SlotEffectConfig, SlotId},
    },
    foundation::{
        core::PosterSpec,
        error::{StardreamError, StardreamResult},
    },
    layout::slots::slot_placement,
    texture::mask::{MaskedTexture, build_masked_texture},
};

/// Main texture diameter relative to the slot base size.
pub const MAIN_FACTOR_CORE: f64 = 1.2;
pub const MAIN_FACTOR_DREAM: f64 = 1.1;
/// Glow texture diameter relative to the slot base size.
pub const GLOW_FACTOR_CORE: f64 = 1.8;
pub const GLOW_FACTOR_DREAM: f64 = 1.5;

/// Everything a slot's textures depend on. A slot whose key changes must rebuild.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureKey {
    pub image: ImageId,
    pub main_size: u32,
    pub glow_size: u32,
    zoom_bits: u64,
}

impl TextureKey {
    pub fn new(image: ImageId, main_size: u32, glow_size: u32, zoom: f64) -> Self {
        Self {
            image,
            main_size,
            glow_size,
            zoom_bits: zoom.to_bits(),
        }
    }

    pub fn zoom(&self) -> f64 {
        f64::from_bits(self.zoom_bits)
    }
}

/// Desired texture key for a slot, `None` when the slot has no image or is not placed.
pub fn texture_key_for(id: SlotId, cfg: &SlotEffectConfig, poster: PosterSpec) -> Option<TextureKey> {
    let image = cfg.image.clone()?;
    let placement = slot_placement(id, cfg, poster, false)?;
    let (main_f, glow_f) = if id.is_core() {
        (MAIN_FACTOR_CORE, GLOW_FACTOR_CORE)
    } else {
        (MAIN_FACTOR_DREAM, GLOW_FACTOR_DREAM)
    };
    let px = |f: f64| (placement.base_size * f).round().max(1.0) as u32;
    Some(TextureKey::new(image, px(main_f), px(glow_f), cfg.zoom))
}

/// The pair of masked textures drawn for one slot.
#[derive(Clone, Debug)]
pub struct SlotTextures {
    pub main: Arc<MaskedTexture>,
    pub glow: Arc<MaskedTexture>,
}

/// Handle for one outstanding load. Results carrying a superseded generation are discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    pub slot: SlotId,
    pub generation: u64,
    pub key: TextureKey,
}

/// Observable per-slot texture state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureStatus {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Default)]
struct SlotEntry {
    desired: Option<TextureKey>,
    generation: u64,
    /// Generation of the outstanding ticket, if any.
    in_flight: Option<u64>,
    ready: Option<(TextureKey, SlotTextures)>,
    failed: Option<(TextureKey, String)>,
}

impl SlotEntry {
    fn needs_load(&self) -> bool {
        let Some(want) = &self.desired else {
            return false;
        };
        self.in_flight.is_none()
            && self.ready.as_ref().is_none_or(|(k, _)| k != want)
            && self.failed.as_ref().is_none_or(|(k, _)| k != want)
    }
}

/// Owns the masked textures of every slot.
///
/// Invariants: at most one load per slot is outstanding; a texture is released as soon as its
/// slot's desired key changes or the slot unmounts (before `sync` returns); results of
/// superseded loads are dropped on arrival.
#[derive(Debug, Default)]
pub struct TextureCache {
    poster: PosterSpec,
    entries: BTreeMap<SlotId, SlotEntry>,
    next_generation: u64,
}

impl TextureCache {
    pub fn new(poster: PosterSpec) -> Self {
        Self {
            poster,
            entries: BTreeMap::new(),
            next_generation: 0,
        }
    }

    /// Reconcile with `doc`: bump generations of changed slots, release stale textures.
    pub fn sync(&mut self, doc: &ConfigDocument) {
        let desired: BTreeMap<SlotId, TextureKey> = doc
            .slots()
            .filter_map(|(id, cfg)| texture_key_for(id, cfg, self.poster).map(|k| (id, k)))
            .collect();

        let ids: BTreeSet<SlotId> = self.entries.keys().chain(desired.keys()).copied().collect();
        for id in ids {
            let want = desired.get(&id).cloned();
            let entry = self.entries.entry(id).or_default();
            if entry.desired == want {
                continue;
            }
            self.next_generation += 1;
            entry.generation = self.next_generation;
            if entry.ready.as_ref().is_some_and(|(k, _)| Some(k) != want.as_ref()) {
                tracing::debug!(slot = %id, "released superseded texture");
                entry.ready = None;
            }
            entry.failed = None;
            entry.desired = want;
        }
        self.entries
            .retain(|_, e| e.desired.is_some() || e.in_flight.is_some());
    }

    /// Dispatch a ticket for every slot that needs textures and has no load outstanding.
    pub fn take_requests(&mut self) -> Vec<LoadTicket> {
        let mut out = Vec::new();
        for (&slot, entry) in &mut self.entries {
            if !entry.needs_load() {
                continue;
            }
            let Some(key) = entry.desired.clone() else {
                continue;
            };
            entry.in_flight = Some(entry.generation);
            out.push(LoadTicket {
                slot,
                generation: entry.generation,
                key,
            });
        }
        out
    }

    /// Deliver a load result. Returns `true` when the result was applied, `false` when it was
    /// stale and dropped.
    pub fn complete(
        &mut self,
        ticket: &LoadTicket,
        result: StardreamResult<SlotTextures>,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.slot) else {
            return false;
        };
        if entry.in_flight == Some(ticket.generation) {
            entry.in_flight = None;
        }
        let current =
            entry.generation == ticket.generation && entry.desired.as_ref() == Some(&ticket.key);
        if !current {
            tracing::debug!(slot = %ticket.slot, generation = ticket.generation, "dropped stale texture load");
            if entry.desired.is_none() && entry.in_flight.is_none() {
                self.entries.remove(&ticket.slot);
            }
            return false;
        }
        match result {
            Ok(textures) => {
                entry.ready = Some((ticket.key.clone(), textures));
                entry.failed = None;
            }
            Err(e) => {
                tracing::warn!(slot = %ticket.slot, image = %ticket.key.image, error = %e, "slot texture failed, rendering placeholder");
                entry.failed = Some((ticket.key.clone(), e.to_string()));
            }
        }
        true
    }

    /// Load and build every requested texture pair in parallel, then apply the results.
    /// Returns the number of results applied.
    #[tracing::instrument(skip_all)]
    pub fn resolve_pending(&mut self, store: &dyn ImageStore) -> usize {
        let tickets = self.take_requests();
        if tickets.is_empty() {
            return 0;
        }
        let results: Vec<(LoadTicket, StardreamResult<SlotTextures>)> = tickets
            .into_par_iter()
            .map(|t| {
                let r = load_slot_textures(store, &t.key);
                (t, r)
            })
            .collect();
        let mut applied = 0;
        for (ticket, result) in results {
            if self.complete(&ticket, result) {
                applied += 1;
            }
        }
        tracing::debug!(applied, "resolved slot textures");
        applied
    }

    /// Textures for `slot` if they match its current key.
    pub fn textures_for(&self, slot: SlotId) -> Option<&SlotTextures> {
        let entry = self.entries.get(&slot)?;
        let want = entry.desired.as_ref()?;
        entry
            .ready
            .as_ref()
            .filter(|(k, _)| k == want)
            .map(|(_, t)| t)
    }

    pub fn status(&self, slot: SlotId) -> Option<TextureStatus> {
        let entry = self.entries.get(&slot)?;
        let want = entry.desired.as_ref()?;
        if entry.ready.as_ref().is_some_and(|(k, _)| k == want) {
            return Some(TextureStatus::Ready);
        }
        if let Some((k, msg)) = &entry.failed
            && k == want
        {
            return Some(TextureStatus::Failed(msg.clone()));
        }
        Some(TextureStatus::Loading)
    }

    /// Key `slot` currently wants, if any.
    pub fn desired_key(&self, slot: SlotId) -> Option<&TextureKey> {
        self.entries.get(&slot)?.desired.as_ref()
    }

    pub fn in_flight_count(&self) -> usize {
        self.entries.values().filter(|e| e.in_flight.is_some()).count()
    }

    /// Number of slots currently holding textures.
    pub fn resident_count(&self) -> usize {
        self.entries.values().filter(|e| e.ready.is_some()).count()
    }
}

/// Fetch, decode and bake both textures for `key`.
pub fn load_slot_textures(store: &dyn ImageStore, key: &TextureKey) -> StardreamResult<SlotTextures> {
    let bytes = store
        .load(&key.image)?
        .ok_or_else(|| StardreamError::image_load(format!("image '{}' not found", key.image)))?;
    let image = decode_image(&bytes)?;
    let main = build_masked_texture(&image, key.main_size, key.zoom())?;
    let glow = build_masked_texture(&image, key.glow_size, key.zoom())?;
    Ok(SlotTextures {
        main: Arc::new(main),
        glow: Arc::new(glow),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/texture/cache.rs"]
mod tests;
