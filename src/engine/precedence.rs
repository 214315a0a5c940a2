// ==========================================
// 仓储异常检测引擎 - 跨规则裁决
// ==========================================
// 候选按 precedence_level 升序稳定排序（同级保持输入顺序）
// 排他登记表键为 (主体, 优先类别): 未被占用才接受并占用
// 不同类别的候选互不影响
// ==========================================

use crate::domain::anomaly::{Anomaly, AnomalySubject};
use crate::domain::types::PrecedenceClass;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub accepted: Vec<Anomaly>,

    /// 规则 id → 被覆盖的候选数
    pub suppressed: BTreeMap<String, usize>,
}

impl Resolution {
    pub fn suppressed_total(&self) -> usize {
        self.suppressed.values().sum()
    }
}

pub struct PrecedenceResolver;

impl PrecedenceResolver {
    /// 单次顺序裁决
    ///
    /// # 参数
    /// - candidates: 已按规则声明顺序、评估器产出顺序合并的候选
    pub fn resolve(mut candidates: Vec<Anomaly>) -> Resolution {
        candidates.sort_by_key(|a| a.precedence_level);

        let mut claimed: HashSet<(AnomalySubject, PrecedenceClass)> = HashSet::new();
        let mut resolution = Resolution::default();

        for candidate in candidates {
            if claimed.insert(candidate.claim_key()) {
                resolution.accepted.push(candidate);
            } else {
                *resolution
                    .suppressed
                    .entry(candidate.rule_id.clone())
                    .or_default() += 1;
            }
        }

        debug!(
            accepted = resolution.accepted.len(),
            suppressed = resolution.suppressed_total(),
            "裁决完成"
        );
        resolution
    }
}
