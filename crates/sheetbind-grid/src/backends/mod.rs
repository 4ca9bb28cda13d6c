pub mod json;

pub use json::JsonGridAdapter;
