// src/quiz/mod.rs

pub mod codec;
pub mod countdown;
pub mod grading;
pub mod lifecycle;
pub mod navigation;
pub mod review;
pub mod synchronizer;
