pub mod app;
pub mod color;
pub mod feed;
pub mod logging;
pub mod render;
pub mod schedule;
pub mod series;
pub mod sink;
pub mod state;
