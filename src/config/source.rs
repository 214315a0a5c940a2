// ==========================================
// 仓储异常检测引擎 - 配置来源 Trait
// ==========================================
// 实现者: EngineConfig（内存）/ ConfigStore（config_kv 表）
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::config::error::ConfigResult;
use async_trait::async_trait;

#[async_trait]
pub trait EngineConfigSource: Send + Sync {
    /// 载入一份经过校验的运行配置
    async fn load_engine_config(&self) -> ConfigResult<EngineConfig>;
}

#[async_trait]
impl EngineConfigSource for EngineConfig {
    async fn load_engine_config(&self) -> ConfigResult<EngineConfig> {
        self.validate()?;
        Ok(self.clone())
    }
}
