pub mod answer_kind;
pub mod assistant_config;
pub mod default_config;
