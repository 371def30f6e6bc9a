//! Terminal sanitization for externally sourced strings (spec.md §9
//! "Terminal sanitization"). This is a security boundary: a hostile or
//! misbehaving server could otherwise inject CSI/OSC/DCS escape sequences
//! into the local terminal through field contents (cluster name, error
//! text, index names).

/// Strips ANSI CSI/OSC/DCS escape sequences and raw C0/C1 control bytes.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\u{1b}' => {
                // ESC-prefixed sequence: CSI (`ESC [ ... final-byte`), OSC
                // (`ESC ] ... BEL | ST`), or a single two-char escape.
                match chars.peek() {
                    Some('[') => {
                        chars.next();
                        for next in chars.by_ref() {
                            if ('@'..='~').contains(&next) {
                                break;
                            }
                        }
                    }
                    Some(']') => {
                        chars.next();
                        loop {
                            match chars.next() {
                                None => break,
                                Some('\u{7}') => break,
                                Some('\u{1b}') if chars.peek() == Some(&'\\') => {
                                    chars.next();
                                    break;
                                }
                                _ => {}
                            }
                        }
                    }
                    Some(_) => {
                        chars.next();
                    }
                    None => {}
                }
            }
            c if (c as u32) < 0x20 && c != '\n' && c != '\t' => {
                // C0 control bytes other than newline/tab.
            }
            c if (0x80..=0x9f).contains(&(c as u32)) => {
                // C1 control bytes.
            }
            c => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_csi_color_codes() {
        assert_eq!(sanitize("\u{1b}[31mred\u{1b}[0m"), "red");
    }

    #[test]
    fn strips_osc_title_sequence() {
        assert_eq!(sanitize("\u{1b}]0;evil title\u{7}after"), "after");
    }

    #[test]
    fn strips_bare_control_bytes() {
        assert_eq!(sanitize("a\u{7}b\u{1}c"), "abc");
    }

    #[test]
    fn preserves_newlines_and_tabs() {
        assert_eq!(sanitize("line1\nline2\ttabbed"), "line1\nline2\ttabbed");
    }

    #[test]
    fn preserves_plain_text_unchanged() {
        assert_eq!(sanitize("my-index-2024.01.01"), "my-index-2024.01.01");
    }
}
