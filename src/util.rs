pub mod callback;
pub(crate) mod sleep;
