pub(crate) mod presets;
pub(crate) mod slots;
