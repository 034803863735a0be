//! Accent-insensitive search keys.
//!
//! Names are stored twice: as entered, and folded through [`normalize_text`]
//! so lookups like "nguyen" can match "Nguyễn". The fold lowercases, drops
//! combining diacritical marks, and maps the precomposed Vietnamese vowel
//! forms (plus đ) onto their base letters.

/// Lowercase the input and strip diacritics.
///
/// The output contains only characters the fold maps to themselves, so the
/// function is idempotent.
pub fn normalize_text(input: &str) -> String {
    input
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_mark(*c))
        .map(fold_accent)
        .collect()
}

// Combining Diacritical Marks block; covers decomposed input.
fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'ả' | 'ã' | 'ạ' | 'â' | 'ầ' | 'ấ' | 'ẩ' | 'ẫ' | 'ậ' | 'ă' | 'ằ' | 'ắ'
        | 'ẳ' | 'ẵ' | 'ặ' => 'a',
        'è' | 'é' | 'ẻ' | 'ẽ' | 'ẹ' | 'ê' | 'ề' | 'ế' | 'ể' | 'ễ' | 'ệ' => 'e',
        'ì' | 'í' | 'ỉ' | 'ĩ' | 'ị' => 'i',
        'ò' | 'ó' | 'ỏ' | 'õ' | 'ọ' | 'ô' | 'ồ' | 'ố' | 'ổ' | 'ỗ' | 'ộ' | 'ơ' | 'ờ' | 'ớ'
        | 'ở' | 'ỡ' | 'ợ' => 'o',
        'ù' | 'ú' | 'ủ' | 'ũ' | 'ụ' | 'ư' | 'ừ' | 'ứ' | 'ử' | 'ữ' | 'ự' => 'u',
        'ỳ' | 'ý' | 'ỷ' | 'ỹ' | 'ỵ' => 'y',
        'đ' => 'd',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_vietnamese_name() {
        assert_eq!(normalize_text("Nguyễn Văn A"), "nguyen van a");
    }

    #[test]
    fn folds_alias() {
        assert_eq!(normalize_text("Ba Lúa"), "ba lua");
    }

    #[test]
    fn idempotent() {
        let once = normalize_text("Trần Thị Hồng Đào");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn plain_ascii_is_lowercased_only() {
        assert_eq!(normalize_text("MATH101"), "math101");
    }

    #[test]
    fn strips_decomposed_combining_marks() {
        // "e" followed by U+0301 combining acute
        assert_eq!(normalize_text("e\u{0301}"), "e");
    }
}
