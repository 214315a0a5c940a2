// ==========================================
// 集成测试共享辅助
// ==========================================
#![allow(dead_code)]

pub mod fixtures;
pub mod record_builder;

pub use fixtures::*;
pub use record_builder::*;
