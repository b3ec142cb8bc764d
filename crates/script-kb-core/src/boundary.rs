//! Sentence-boundary snapping for chunk cut positions.
//!
//! Operates on a `&[char]` view of the text so that every offset is a
//! character index rather than a byte index, which keeps CJK text safe to
//! slice.

/// Sentence and clause terminators recognised when snapping a cut position.
pub const TERMINATORS: &[char] = &[
    '。', '！', '？', '.', '!', '?', '，', ',', '；', ';', '\n', '\r',
];

/// How far back (in characters) a cut position may be moved.
pub const LOOK_BACK: usize = 50;

/// Whether `c` ends a sentence or clause.
pub fn is_terminator(c: char) -> bool {
    TERMINATORS.contains(&c)
}

/// Find the cut position closest to `position` that does not separate a
/// terminator from the clause it ends.
///
/// Scans backward from `position` (inclusive) down to
/// `position - LOOK_BACK` and returns the index just after the first
/// terminator found. Returns `position` unchanged if the window holds no
/// terminator. A `position` at or beyond the end of `text` contributes no
/// character of its own.
pub fn find_nearest_punctuation(text: &[char], position: usize) -> usize {
    let floor = position.saturating_sub(LOOK_BACK);
    (floor..=position)
        .rev()
        .find(|&i| text.get(i).is_some_and(|&c| is_terminator(c)))
        .map(|i| i + 1)
        .unwrap_or(position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn returns_index_after_closest_terminator() {
        let text = chars("Hello. World, again");
        // ',' sits at index 12.
        assert_eq!(find_nearest_punctuation(&text, 16), 13);
    }

    #[test]
    fn terminator_at_position_is_included() {
        let text = chars("abc.def");
        assert_eq!(find_nearest_punctuation(&text, 3), 4);
    }

    #[test]
    fn no_terminator_leaves_position() {
        let text = chars("abcdefghij");
        assert_eq!(find_nearest_punctuation(&text, 7), 7);
    }

    #[test]
    fn window_is_bounded() {
        let mut s = String::from("。");
        s.push_str(&"字".repeat(80));
        let text = chars(&s);
        // The only terminator is 80 characters back, outside the window.
        assert_eq!(find_nearest_punctuation(&text, 80), 80);
        // 50 back is still inside the window.
        assert_eq!(find_nearest_punctuation(&text, 50), 1);
    }

    #[test]
    fn position_past_end_is_safe() {
        let text = chars("你好。世界");
        assert_eq!(find_nearest_punctuation(&text, text.len()), 3);
        assert_eq!(find_nearest_punctuation(&[], 0), 0);
    }

    #[test]
    fn recognises_cjk_and_newlines() {
        for t in ["！", "？", "；", "，", "\n", "\r"] {
            let text = chars(&format!("ab{}cd", t));
            assert_eq!(find_nearest_punctuation(&text, 4), 3, "terminator {:?}", t);
        }
    }
}
