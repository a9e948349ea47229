// フォーマット置換エンジン
//
// テンプレート文字列内の `{Key}` プレースホルダーを、
// 順序付きのフォーマット記述子で置換します。

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::core::formatting::FormattingDescriptor;

/// フォーマット置換エンジン
///
/// 書式付き記述子は `reference_time` を基準に解決されます。
#[derive(Debug, Clone)]
pub struct FormattingSubstitutionEngine {
    reference_time: DateTime<Utc>,
}

impl FormattingSubstitutionEngine {
    /// 現在時刻を基準にしたエンジンを作成
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// 指定時刻を基準にしたエンジンを作成
    pub fn at(reference_time: DateTime<Utc>) -> Self {
        Self { reference_time }
    }

    /// 基準時刻
    pub fn reference_time(&self) -> &DateTime<Utc> {
        &self.reference_time
    }

    /// テンプレートに記述子を適用
    ///
    /// 記述子はリスト順に処理され、各プレースホルダーの全出現箇所が置換されます。
    /// 置換によりプレースホルダーが消えるため、同じキーの記述子が複数ある場合は
    /// 最初の記述子だけが効果を持ち、後続の重複は何もしません。
    ///
    /// # Arguments
    ///
    /// * `template` - テーブル名テンプレート（例: `{Entities}_{Year}`）
    /// * `descriptors` - 順序付きのフォーマット記述子
    ///
    /// # Returns
    ///
    /// 置換後の文字列
    pub fn apply(&self, template: &str, descriptors: &[FormattingDescriptor]) -> String {
        let mut result = template.to_string();

        for descriptor in descriptors {
            let placeholder = descriptor.placeholder();
            if result.contains(&placeholder) {
                result = result.replace(&placeholder, &descriptor.resolve(&self.reference_time));
            }
        }

        result
    }

    /// 置換されずに残ったプレースホルダーのキーを取得
    pub fn unresolved_placeholders(text: &str) -> Vec<String> {
        let Some(re) = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").ok() else {
            return Vec::new();
        };
        re.captures_iter(text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }
}

impl Default for FormattingSubstitutionEngine {
    fn default() -> Self {
        Self::new()
    }
}
