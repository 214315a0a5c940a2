// ==========================================
// 仓储异常检测引擎 - 核心库
// ==========================================
// 输入: 库存快照（标准记录集）+ 规则目录 + 范围配置 + 库位模板
// 输出: 有序异常列表 / 范围统计 / 规则耗时 / 时间画像 / 运行告警
// 系统定位: 单次分析、无状态；核心不做任何 I/O
// ==========================================

// 初始化国际化系统（缺失的键回退到中文；渲染语言由每次运行显式传入）
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 时间列检测 / 解析 / 质量校验
pub mod dates;

// 通配符模式
pub mod pattern;

// 库位分类
pub mod location;

// 范围过滤
pub mod scope;

// 规则评估器
pub mod rules;

// 引擎层 - 编排与裁决
pub mod engine;

// 导入层 - CSV / Excel
pub mod importer;

// 配置层 - 运行配置与持久化
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 阶段耗时
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AnomalyCategory, AnomalyPriority, LocationType, PrecedenceClass, UnitType,
};

// 领域实体
pub use domain::{
    Anomaly, DateFormatProfile, InventoryRecord, LocationTemplate, Report, RuleDefinition,
    RuleKind, ScopeConfig,
};

// 引擎
pub use engine::{evaluate_all, CancellationFlag, EngineError, EngineResult, RuleEngine};

// 配置
pub use config::{ConfigStore, EngineConfig, EngineConfigSource, EngineSettings};

// 导入
pub use importer::{ImportError, RecordLoader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "仓储异常检测引擎";
