pub(crate) mod document;
pub(crate) mod persist;
pub(crate) mod slot;
