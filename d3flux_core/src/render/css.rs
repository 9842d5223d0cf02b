//! Minimal CSS compression for stylesheets embedded in the figure script

/// Characters around which whitespace can be dropped
const PUNCTUATION: [char; 6] = ['{', '}', ':', ';', ',', '>'];

/// Compress a stylesheet
///
/// Comments are removed, runs of whitespace are collapsed, and whitespace next to
/// punctuation is dropped, as is the last `;` of each block. Quoted strings are kept as is.
/// A space before a `:` in a selector is kept, `.node :hover` and `.node:hover` differ.
///
/// # Examples
/// ```rust
/// use d3flux_core::render::css::compress_css;
/// let css = "/* links */\n.link {\n  fill: none;\n  stroke: #bbb;\n}\n";
/// assert_eq!(compress_css(css), ".link{fill:none;stroke:#bbb}");
/// ```
pub fn compress_css(css: &str) -> String {
    let chars: Vec<char> = css.chars().collect();
    let mut out = String::with_capacity(css.len());
    let mut pending_space = false;
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        pos += 1;
        match c {
            '/' if chars.get(pos) == Some(&'*') => {
                pos += 1;
                while pos + 1 < chars.len() && !(chars[pos] == '*' && chars[pos + 1] == '/') {
                    pos += 1;
                }
                pos += 2;
                pending_space = true;
            }
            '"' | '\'' => {
                flush_space(&mut out, &mut pending_space, c);
                out.push(c);
                let mut escaped = false;
                while let Some(&s) = chars.get(pos) {
                    pos += 1;
                    out.push(s);
                    if escaped {
                        escaped = false;
                    } else if s == '\\' {
                        escaped = true;
                    } else if s == c {
                        break;
                    }
                }
            }
            c if c.is_whitespace() => pending_space = true,
            '}' => {
                pending_space = false;
                if out.ends_with(';') {
                    out.pop();
                }
                out.push(c);
            }
            ':' if pending_space && in_selector(&chars[pos..]) => {
                pending_space = false;
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push(c);
            }
            c => {
                flush_space(&mut out, &mut pending_space, c);
                out.push(c);
            }
        }
    }
    out
}

/// Whether the text that follows belongs to a selector, i.e. a block opens before the
/// current declaration could end
fn in_selector(rest: &[char]) -> bool {
    rest.iter()
        .find(|c| matches!(c, '{' | ';' | '}'))
        .is_some_and(|c| *c == '{')
}

/// Emit a single space before `next` if one is pending and it is needed
fn flush_space(out: &mut String, pending_space: &mut bool, next: char) {
    if !*pending_space {
        return;
    }
    *pending_space = false;
    let after_punctuation = out
        .chars()
        .last()
        .map_or(true, |last| PUNCTUATION.contains(&last));
    if !after_punctuation && !PUNCTUATION.contains(&next) {
        out.push(' ');
    }
}
