pub(crate) mod composer;
pub(crate) mod node;
pub(crate) mod slot;
