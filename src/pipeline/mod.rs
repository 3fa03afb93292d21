pub mod animated;
pub mod classify;
pub mod orchestrate;
pub mod output;
pub mod static_layers;
