use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::{
    config::slot::{CORE_POSITION_INDEX, ImageId, SlotEffectConfig, SlotId},
    foundation::error::{StardreamError, StardreamResult},
    layout::presets::PRESET_COUNT,
};

/// The persisted poster configuration: one core slot plus the dream slots.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConfigDocument {
    pub core: SlotEffectConfig,
    pub dreams: Vec<SlotEffectConfig>,
}

impl Default for ConfigDocument {
    /// First-run document: default core plus one empty dream slot per preset position.
    fn default() -> Self {
        Self {
            core: SlotEffectConfig::default(),
            dreams: (0..PRESET_COUNT as i32)
                .map(SlotEffectConfig::dream)
                .collect(),
        }
    }
}

impl ConfigDocument {
    pub fn slot(&self, id: SlotId) -> Option<&SlotEffectConfig> {
        match id {
            SlotId::Core => Some(&self.core),
            SlotId::Dream(i) => self.dreams.get(i),
        }
    }

    pub fn slot_mut(&mut self, id: SlotId) -> Option<&mut SlotEffectConfig> {
        match id {
            SlotId::Core => Some(&mut self.core),
            SlotId::Dream(i) => self.dreams.get_mut(i),
        }
    }

    /// Iterate every slot, core first.
    pub fn slots(&self) -> impl Iterator<Item = (SlotId, &SlotEffectConfig)> {
        std::iter::once((SlotId::Core, &self.core)).chain(
            self.dreams
                .iter()
                .enumerate()
                .map(|(i, d)| (SlotId::Dream(i), d)),
        )
    }

    /// Dream slot occupying preset `position_index`, if any.
    pub fn dream_at_position(&self, position_index: i32) -> Option<SlotId> {
        self.dreams
            .iter()
            .position(|d| d.position_index == position_index)
            .map(SlotId::Dream)
    }

    /// Preset positions not taken by any dream slot, ascending.
    pub fn free_positions(&self) -> Vec<i32> {
        let used: BTreeSet<i32> = self.dreams.iter().map(|d| d.position_index).collect();
        (0..PRESET_COUNT as i32)
            .filter(|i| !used.contains(i))
            .collect()
    }

    /// Check the structural invariants a migrated document always satisfies.
    pub fn validate(&self) -> StardreamResult<()> {
        if self.core.position_index != CORE_POSITION_INDEX {
            return Err(StardreamError::config_integrity(format!(
                "core positionIndex must be {CORE_POSITION_INDEX}, got {}",
                self.core.position_index
            )));
        }
        let mut seen = BTreeSet::new();
        for (i, d) in self.dreams.iter().enumerate() {
            if !(0..PRESET_COUNT as i32).contains(&d.position_index) {
                return Err(StardreamError::config_integrity(format!(
                    "dream {i} positionIndex {} out of range",
                    d.position_index
                )));
            }
            if !seen.insert(d.position_index) {
                return Err(StardreamError::config_integrity(format!(
                    "dream {i} reuses positionIndex {}",
                    d.position_index
                )));
            }
        }
        Ok(())
    }

    pub fn to_json_value(&self) -> Value {
        serde_json::json!({
            "core": slot_to_value(&self.core),
            "dreams": self.dreams.iter().map(slot_to_value).collect::<Vec<_>>(),
        })
    }

    pub fn to_json_string_pretty(&self) -> StardreamResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StardreamError::persistence(format!("serialize document: {e}")))
    }
}

fn slot_to_value(slot: &SlotEffectConfig) -> Value {
    serde_json::to_value(slot).unwrap_or(Value::Null)
}

/// Outcome of [`migrate_document`]: the usable document plus what had to be fixed.
#[derive(Clone, Debug, Default)]
pub struct Migrated {
    pub document: ConfigDocument,
    /// Fields absent from the input and filled from defaults (`"dreams[2].zoom"`).
    pub backfilled: Vec<String>,
    /// Values present but unusable and replaced (wrong type, duplicate position, ...).
    pub repaired: Vec<String>,
}

impl Migrated {
    pub fn is_clean(&self) -> bool {
        self.backfilled.is_empty() && self.repaired.is_empty()
    }
}

/// Defensively turn any persisted JSON value into a valid [`ConfigDocument`].
///
/// Never fails: malformed input degrades to defaults field by field. Dream slots with a missing,
/// out-of-range or duplicate `positionIndex` are moved to the lowest free preset position; dream
/// entries that cannot be placed are dropped.
pub fn migrate_document(value: Option<&Value>) -> Migrated {
    let mut out = Migrated::default();
    let Some(value) = value else {
        return out;
    };
    let Some(root) = value.as_object() else {
        out.repaired.push("document is not an object".to_string());
        log_migration(&out);
        return out;
    };

    out.document.core = match root.get("core") {
        Some(v) => slot_from_value(v, "core", &mut out),
        None => {
            out.backfilled.push("core".to_string());
            SlotEffectConfig::default()
        }
    };
    if out.document.core.position_index != CORE_POSITION_INDEX {
        if out.document.core.position_index != i32::MIN {
            out.repaired.push("core.positionIndex".to_string());
        }
        out.document.core.position_index = CORE_POSITION_INDEX;
    }

    out.document.dreams = match root.get("dreams") {
        Some(Value::Array(items)) => {
            let mut dreams = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                dreams.push(slot_from_value(item, &format!("dreams[{i}]"), &mut out));
            }
            dreams
        }
        Some(_) => {
            out.repaired.push("dreams".to_string());
            ConfigDocument::default().dreams
        }
        None => {
            out.backfilled.push("dreams".to_string());
            ConfigDocument::default().dreams
        }
    };
    reassign_positions(&mut out);

    log_migration(&out);
    out
}

/// Parse persisted text and migrate it. Unparseable text yields the default document.
pub fn migrate_document_str(text: &str) -> Migrated {
    match serde_json::from_str::<Value>(text) {
        Ok(v) => migrate_document(Some(&v)),
        Err(e) => {
            let err = StardreamError::config_integrity(format!("unparseable document: {e}"));
            tracing::warn!(error = %err, "falling back to default configuration document");
            let mut out = Migrated::default();
            out.repaired.push("document".to_string());
            out
        }
    }
}

fn log_migration(m: &Migrated) {
    if !m.repaired.is_empty() {
        tracing::warn!(repaired = ?m.repaired, "repaired malformed configuration fields");
    }
    if !m.backfilled.is_empty() {
        tracing::debug!(backfilled = ?m.backfilled, "backfilled missing configuration fields");
    }
}

fn reassign_positions(out: &mut Migrated) {
    let count = PRESET_COUNT as i32;
    let mut used = BTreeSet::new();
    let mut needs_slot = Vec::new();
    for (i, d) in out.document.dreams.iter().enumerate() {
        if (0..count).contains(&d.position_index) && used.insert(d.position_index) {
            continue;
        }
        needs_slot.push(i);
    }

    let mut free = (0..count).filter(|p| !used.contains(p));
    let mut dropped = Vec::new();
    for i in needs_slot {
        match free.next() {
            Some(p) => {
                // Missing/malformed indices were already reported by the field reader.
                if out.document.dreams[i].position_index != i32::MIN {
                    out.repaired.push(format!("dreams[{i}].positionIndex"));
                }
                out.document.dreams[i].position_index = p;
            }
            None => dropped.push(i),
        }
    }
    for &i in dropped.iter().rev() {
        out.repaired.push(format!("dreams[{i}] (no free position)"));
        out.document.dreams.remove(i);
    }
}

fn slot_from_value(v: &Value, path: &str, out: &mut Migrated) -> SlotEffectConfig {
    let d = SlotEffectConfig::default();
    let Some(obj) = v.as_object() else {
        out.repaired.push(path.to_string());
        return d;
    };

    let mut f = FieldReader { obj, path, out };
    SlotEffectConfig {
        image: f.image("image"),
        size: f.number("size", d.size),
        zoom: f.number("zoom", d.zoom),
        opacity: f.number("opacity", d.opacity),
        blur: f.number("blur", d.blur),
        glow_intensity: f.number("glowIntensity", d.glow_intensity),
        offset_x: f.number("offsetX", d.offset_x),
        offset_y: f.number("offsetY", d.offset_y),
        rotation: f.number("rotation", d.rotation),
        saturation: f.number("saturation", d.saturation),
        brightness: f.number("brightness", d.brightness),
        contrast: f.number("contrast", d.contrast),
        position_index: f.position_index("positionIndex"),
    }
}

struct FieldReader<'a> {
    obj: &'a Map<String, Value>,
    path: &'a str,
    out: &'a mut Migrated,
}

impl FieldReader<'_> {
    fn backfill(&mut self, key: &str) {
        self.out.backfilled.push(format!("{}.{key}", self.path));
    }

    fn repair(&mut self, key: &str) {
        self.out.repaired.push(format!("{}.{key}", self.path));
    }

    fn number(&mut self, key: &str, default: f64) -> f64 {
        match self.obj.get(key) {
            None => {
                self.backfill(key);
                default
            }
            Some(v) => match v.as_f64() {
                Some(n) if n.is_finite() => n,
                _ => {
                    self.repair(key);
                    default
                }
            },
        }
    }

    fn image(&mut self, key: &str) -> Option<ImageId> {
        match self.obj.get(key) {
            None => {
                self.backfill(key);
                None
            }
            Some(Value::Null) => None,
            Some(Value::String(s)) if !s.is_empty() => Some(ImageId::new(s.clone())),
            Some(_) => {
                self.repair(key);
                None
            }
        }
    }

    /// Missing or malformed indices become `i32::MIN`, which the position pass reassigns.
    fn position_index(&mut self, key: &str) -> i32 {
        match self.obj.get(key) {
            None => {
                self.backfill(key);
                i32::MIN
            }
            Some(v) => {
                let parsed = v
                    .as_i64()
                    .or_else(|| v.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                    .and_then(|i| i32::try_from(i).ok());
                match parsed {
                    Some(i) => i,
                    None => {
                        self.repair(key);
                        i32::MIN
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/document.rs"]
mod tests;
