// ==========================================
// 仓储异常检测引擎 - 货架位语法解码
// ==========================================
// 唯一规范语法: [通道-货架-]位置 层级
//   015A        → 位置 15, 层级 A
//   01-02-015A  → 通道 1, 货架 2, 位置 15, 层级 A
// 检查顺序: 形态 → 层级字母 → 位置段 → 通道/货架
// ==========================================

use crate::domain::location::{LocationTemplate, RejectionReason, StorageAddress};
use crate::i18n::{t, t_with_args, DEFAULT_LOCALE};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn storage_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(\d+)-(\d+)-)?(\d+)([A-Z])$").expect("货架位语法正则")
    })
}

impl RejectionReason {
    /// 稳定的原因代码（与序列化标签一致）
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::EmptyCode => "EMPTY_CODE",
            RejectionReason::WrongShape { .. } => "WRONG_SHAPE",
            RejectionReason::InvalidLevel { .. } => "INVALID_LEVEL",
            RejectionReason::PositionWidth { .. } => "POSITION_WIDTH",
            RejectionReason::PositionOutOfRange { .. } => "POSITION_OUT_OF_RANGE",
            RejectionReason::AisleOutOfRange { .. } => "AISLE_OUT_OF_RANGE",
            RejectionReason::RackOutOfRange { .. } => "RACK_OUT_OF_RANGE",
        }
    }

    /// 按指定语言渲染
    pub fn render(&self, locale: &str) -> String {
        match self {
            RejectionReason::EmptyCode => t(locale, "location.empty_code"),
            RejectionReason::WrongShape { code } => {
                t_with_args(locale, "location.wrong_shape", &[("code", code.as_str())])
            }
            RejectionReason::InvalidLevel { level, alphabet } => t_with_args(
                locale,
                "location.invalid_level",
                &[("level", &level.to_string()), ("alphabet", alphabet.as_str())],
            ),
            RejectionReason::PositionWidth {
                segment,
                width,
                zero_padded,
            } => {
                let key = if *zero_padded {
                    "location.position_not_padded"
                } else {
                    "location.position_too_wide"
                };
                t_with_args(
                    locale,
                    key,
                    &[("segment", segment.as_str()), ("width", &width.to_string())],
                )
            }
            RejectionReason::PositionOutOfRange { position, max } => t_with_args(
                locale,
                "location.position_out_of_range",
                &[("position", &position.to_string()), ("max", &max.to_string())],
            ),
            RejectionReason::AisleOutOfRange { aisle, max } => t_with_args(
                locale,
                "location.aisle_out_of_range",
                &[("aisle", &aisle.to_string()), ("max", &max.to_string())],
            ),
            RejectionReason::RackOutOfRange { rack, max } => t_with_args(
                locale,
                "location.rack_out_of_range",
                &[("rack", &rack.to_string()), ("max", &max.to_string())],
            ),
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_LOCALE))
    }
}

/// 按结构模板解码货架位代码
///
/// # 参数
/// - code: 已标准化（去空白、大写）的代码
pub fn decode(code: &str, template: &LocationTemplate) -> Result<StorageAddress, RejectionReason> {
    if code.is_empty() {
        return Err(RejectionReason::EmptyCode);
    }

    let caps = storage_code_regex()
        .captures(code)
        .ok_or_else(|| RejectionReason::WrongShape {
            code: code.to_string(),
        })?;

    // 1. 层级字母
    let level = caps
        .get(4)
        .and_then(|m| m.as_str().chars().next())
        .ok_or_else(|| RejectionReason::WrongShape {
            code: code.to_string(),
        })?;
    if !template.levels().contains(&level) {
        return Err(RejectionReason::InvalidLevel {
            level,
            alphabet: template.level_alphabet.clone(),
        });
    }

    // 2. 位置段（定宽 + 范围）
    let segment = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
    let width = template.effective_position_width();
    let width_ok = if template.zero_padded {
        segment.len() == width
    } else {
        segment.len() <= width
    };
    if !width_ok {
        return Err(RejectionReason::PositionWidth {
            segment: segment.to_string(),
            width,
            zero_padded: template.zero_padded,
        });
    }
    let position = parse_segment(segment, code)?;
    if position < 1 || position > template.positions_per_rack {
        return Err(RejectionReason::PositionOutOfRange {
            position,
            max: template.positions_per_rack,
        });
    }

    // 3. 通道 / 货架前缀
    let mut aisle = None;
    let mut rack = None;
    if let (Some(a), Some(r)) = (caps.get(1), caps.get(2)) {
        let a = parse_segment(a.as_str(), code)?;
        if a < 1 || a > template.num_aisles {
            return Err(RejectionReason::AisleOutOfRange {
                aisle: a,
                max: template.num_aisles,
            });
        }
        let r = parse_segment(r.as_str(), code)?;
        if r < 1 || r > template.racks_per_aisle {
            return Err(RejectionReason::RackOutOfRange {
                rack: r,
                max: template.racks_per_aisle,
            });
        }
        aisle = Some(a);
        rack = Some(r);
    }

    Ok(StorageAddress {
        aisle,
        rack,
        position,
        level,
    })
}

fn parse_segment(segment: &str, code: &str) -> Result<u32, RejectionReason> {
    segment.parse::<u32>().map_err(|_| RejectionReason::WrongShape {
        code: code.to_string(),
    })
}
