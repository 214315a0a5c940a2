// ==========================================
// 仓储异常检测引擎 - 通配符模式
// ==========================================
// 范围过滤与特殊区域匹配共用同一套语法:
// `*` 任意长度, `?` 单字符, 其余字面匹配, 不区分大小写, 全串锚定
// ==========================================

use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    regex: Regex,
}

impl WildcardPattern {
    /// 编译通配符模式
    pub fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let trimmed = pattern.trim();
        let mut expr = String::with_capacity(trimmed.len() + 8);
        expr.push('^');
        for c in trimmed.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }
        expr.push('$');

        let regex = RegexBuilder::new(&expr).case_insensitive(true).build()?;
        Ok(Self {
            source: trimmed.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, code: &str) -> bool {
        self.regex.is_match(code.trim())
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// 不含通配符（精确匹配）
    pub fn is_literal(&self) -> bool {
        !self.source.contains(['*', '?'])
    }
}
