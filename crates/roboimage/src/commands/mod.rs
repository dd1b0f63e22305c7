pub mod bake_vars;
pub mod build;
pub mod check_target;
pub mod generate;
pub mod images;
pub mod matrix;
pub mod merge;
pub mod platform;
pub mod tasks;
pub mod validate;
