// src/render/mod.rs

pub mod export;
pub mod html;
pub mod palette;
pub mod table;
pub mod text;
