//! Splitting long text into bounded pages at separator boundaries.

use thiserror::Error;

/// Default page budget, matching a chat message body.
pub const DEFAULT_MAX_LENGTH: usize = 2000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    /// A single chunk between separators cannot fit on any page.
    #[error("Chunk of {length} characters exceeds the page budget of {max}")]
    ChunkTooLong { length: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    /// Maximum characters per page, decorations included.
    pub max_length: usize,
    pub separator: String,
    /// Text to start every page except the first with.
    pub prepend: String,
    /// Text to end every page except the last with.
    pub append: String,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            separator: "\n".into(),
            prepend: String::new(),
            append: String::new(),
        }
    }
}

impl SplitOptions {
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            ..Self::default()
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` into pages of at most `max_length` characters.
///
/// Text that already fits is returned as a single page. Otherwise chunks
/// between separators are packed greedily. Joining the pages with the
/// separator gives back the input, except that a page made only of a blank
/// line wedged between two full pages is dropped.
pub fn split_message(text: &str, options: &SplitOptions) -> Result<Vec<String>, SplitError> {
    let max = options.max_length;
    if char_len(text) <= max {
        return Ok(vec![text.to_string()]);
    }

    let separator_len = char_len(&options.separator);
    let append_len = char_len(&options.append);
    let chunk_budget = max.saturating_sub(char_len(&options.prepend) + append_len);

    let chunks: Vec<&str> = text.split(options.separator.as_str()).collect();
    if let Some(chunk) = chunks.iter().find(|chunk| char_len(chunk) > chunk_budget) {
        return Err(SplitError::ChunkTooLong {
            length: char_len(chunk),
            max: chunk_budget,
        });
    }

    let mut pages = Vec::new();
    let mut page = String::new();
    let mut page_len = 0;
    let mut started = false;

    for chunk in chunks {
        let chunk_len = char_len(chunk);
        if started && page_len + separator_len + chunk_len + append_len > max {
            page.push_str(&options.append);
            pages.push(std::mem::replace(&mut page, options.prepend.clone()));
            page_len = char_len(&options.prepend);
            started = false;
        }
        if started {
            page.push_str(&options.separator);
            page_len += separator_len;
        }
        page.push_str(chunk);
        page_len += chunk_len;
        started = true;
    }
    pages.push(page);

    pages.retain(|page| !page.is_empty());
    Ok(pages)
}

/// Truncate `text` to `limit` characters, ending with an ellipsis when cut.
pub fn cutoff_text(text: &str, limit: usize) -> String {
    if char_len(text) <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(count: usize, width: usize) -> String {
        (0..count)
            .map(|i| format!("{:0width$}", i, width = width))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_short_text_is_one_page() {
        let options = SplitOptions::with_max_length(10);
        assert_eq!(split_message("abc\ndef", &options).unwrap(), vec!["abc\ndef"]);
        assert_eq!(split_message("", &options).unwrap(), vec![""]);
        assert_eq!(
            split_message("0123456789", &options).unwrap(),
            vec!["0123456789"]
        );
    }

    #[test]
    fn test_greedy_packing_and_round_trip() {
        let text = lines(10, 4);
        let options = SplitOptions::with_max_length(14);
        let pages = split_message(&text, &options).unwrap();

        // "0000\n0001\n0002" is exactly 14 characters.
        assert_eq!(pages[0], "0000\n0001\n0002");
        assert_eq!(pages.len(), 4);
        assert!(pages.iter().all(|page| page.chars().count() <= 14));
        assert_eq!(pages.join("\n"), text);
    }

    #[test]
    fn test_blank_lines_survive_round_trip() {
        let text = "aaaa\n\nbbbb\n\n\ncccc\ndddd";
        let options = SplitOptions::with_max_length(9);
        let pages = split_message(text, &options).unwrap();

        assert!(pages.iter().all(|page| !page.is_empty()));
        assert!(pages.iter().all(|page| page.chars().count() <= 9));
        assert_eq!(pages.join("\n"), text);
    }

    #[test]
    fn test_blank_line_between_full_pages_is_dropped() {
        let text = "aaaa\n\nbbbb";
        let pages = split_message(text, &SplitOptions::with_max_length(4)).unwrap();

        assert_eq!(pages, vec!["aaaa", "bbbb"]);
        // The only difference from the input is the lost blank line.
        assert_eq!(pages.join("\n"), text.replacen("\n\n", "\n", 1));
        assert_ne!(pages.join("\n"), text);
    }

    #[test]
    fn test_lengths_count_characters() {
        let text = "ééééé\nééééé\nééééé";
        let pages = split_message(text, &SplitOptions::with_max_length(11)).unwrap();
        assert_eq!(pages, vec!["ééééé\nééééé", "ééééé"]);
    }

    #[test]
    fn test_chunk_too_long() {
        let text = format!("short\n{}\nshort", "x".repeat(30));
        let err = split_message(&text, &SplitOptions::with_max_length(20)).unwrap_err();
        assert_eq!(err, SplitError::ChunkTooLong { length: 30, max: 20 });
    }

    #[test]
    fn test_custom_separator() {
        let options = SplitOptions {
            max_length: 7,
            separator: ", ".into(),
            ..SplitOptions::default()
        };
        let pages = split_message("ab, cd, ef, gh", &options).unwrap();
        assert_eq!(pages, vec!["ab, cd", "ef, gh"]);
    }

    #[test]
    fn test_decorations_respect_budget() {
        let options = SplitOptions {
            max_length: 12,
            prepend: "> ".into(),
            append: " …".into(),
            ..SplitOptions::default()
        };
        let pages = split_message("aaaa\nbbbb\ncccc\ndddd", &options).unwrap();

        assert_eq!(pages, vec!["aaaa\nbbbb …", "> cccc …", "> dddd"]);
        assert!(pages.iter().all(|page| page.chars().count() <= 12));

        // The chunk budget shrinks by the decoration length.
        let err = split_message("aaaaaaaaaa\nb\nc", &options).unwrap_err();
        assert_eq!(err, SplitError::ChunkTooLong { length: 10, max: 8 });
    }

    #[test]
    fn test_cutoff_text() {
        assert_eq!(cutoff_text("hello", 5), "hello");
        assert_eq!(cutoff_text("hello world", 6), "hello…");
        assert_eq!(cutoff_text("ééé", 2).chars().count(), 2);
    }
}
