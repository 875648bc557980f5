//! Word counting and read-time estimates

use super::strip_html;

/// Count words in HTML content (tags are ignored)
pub fn count_words(html: &str) -> usize {
    let text = strip_html(html);
    let mut count = 0;
    let mut in_word = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if !in_word {
                in_word = true;
                count += 1;
            }
        } else {
            in_word = false;
        }
    }

    count
}

/// "N min read" for rendered HTML, never less than one minute
pub fn estimate_read_time(html: &str, words_per_minute: usize) -> String {
    let wpm = words_per_minute.max(1);
    let minutes = count_words(html).div_ceil(wpm).max(1);
    format!("{} min read", minutes)
}
