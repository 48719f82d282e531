pub(crate) mod pipeline;
pub(crate) mod sink;
