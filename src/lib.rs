//! Choropleth map of county education statistics, rendered to the terminal
//! with Braille Unicode or exported as SVG.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod interaction;
pub mod join;
pub mod legend;
pub mod map;
pub mod pipeline;
pub mod scale;
pub mod svg;
pub mod topology;
pub mod ui;
