// 単純な英語複数形化
//
// エンティティ名からテーブル名の既定値（`Entities`）を作るためのヒューリスティック。

/// 単語を複数形にする
///
/// - 子音 + `y` → `ies`
/// - `s`, `x`, `z`, `ch`, `sh` で終わる → `es`
/// - それ以外 → `s`
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_ascii_lowercase();

    if let Some(stem) = word.strip_suffix(['y', 'Y']) {
        let before = stem.chars().last();
        if before.is_some_and(|c| !is_vowel(c)) {
            let suffix = if word.ends_with('Y') { "IES" } else { "ies" };
            return format!("{}{}", stem, suffix);
        }
    }

    if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|ending| lower.ends_with(ending))
    {
        let suffix = if is_upper_tail(word) { "ES" } else { "es" };
        return format!("{}{}", word, suffix);
    }

    let suffix = if is_upper_tail(word) { "S" } else { "s" };
    format!("{}{}", word, suffix)
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

// 全体が大文字の単語は大文字のまま複数形にする
fn is_upper_tail(word: &str) -> bool {
    word.len() > 1 && word.chars().all(|c| !c.is_ascii_lowercase())
}
