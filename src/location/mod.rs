// ==========================================
// 仓储异常检测引擎 - 库位分类
// ==========================================

pub mod classifier;
pub mod grammar;

pub use classifier::{normalize_code, LocationCache, LocationClassifier};
pub use crate::domain::location::RejectionReason;
pub use grammar::decode;
