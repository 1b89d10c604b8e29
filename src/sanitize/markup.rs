//! Extent of a JSX element in source text.

use super::scan::{skip_quoted, skip_template};

fn skip_braces(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'\'' | b'"' => i = skip_quoted(bytes, i),
            b'`' => i = skip_template(bytes, i),
            _ => i += 1,
        }
    }
    None
}

/// Scans an opening tag starting at `<`. Returns the index past its `>` and
/// whether it was self-closing.
fn open_tag_end(bytes: &[u8], start: usize) -> Option<(usize, bool)> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => i = skip_braces(bytes, i)?,
            b'\'' | b'"' => i = skip_quoted(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'>') => return Some((i + 2, true)),
            b'>' => return Some((i + 1, false)),
            _ => i += 1,
        }
    }
    None
}

/// Index just past the JSX element (or fragment) whose `<` is at `start`.
pub fn element_end(src: &str, start: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    if bytes.get(start) != Some(&b'<') {
        return None;
    }
    let (mut i, self_closing) = open_tag_end(bytes, start)?;
    if self_closing {
        return Some(i);
    }

    let mut depth = 1usize;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => i = skip_braces(bytes, i)?,
            b'<' if bytes.get(i + 1) == Some(&b'/') => {
                let close = bytes[i..].iter().position(|&b| b == b'>')?;
                i += close + 1;
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'<' => {
                let (end, self_closing) = open_tag_end(bytes, i)?;
                if !self_closing {
                    depth += 1;
                }
                i = end;
            }
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_element() {
        let src = "<span>X</span>, next";
        assert_eq!(element_end(src, 0), Some("<span>X</span>".len()));
    }

    #[test]
    fn test_nested_and_self_closing() {
        let src = "<div><b>a</b><br/>{x > 1 ? <i>y</i> : null}</div> rest";
        assert_eq!(&src[..element_end(src, 0).unwrap()], "<div><b>a</b><br/>{x > 1 ? <i>y</i> : null}</div>");
        let icon = "<Icon name=\"a>b\" />";
        assert_eq!(element_end(&format!("{icon},"), 0), Some(icon.len()));
    }

    #[test]
    fn test_fragment() {
        let src = "<><b>a</b></>;";
        assert_eq!(element_end(src, 0), Some(src.len() - 1));
    }

    #[test]
    fn test_unterminated_is_none() {
        assert_eq!(element_end("<span>X", 0), None);
    }
}
