pub const FENCE: &str = "```";
pub const CODE_BLOCK_OPEN: &str = "<div class=\"code-block\">";
pub const CODE_BLOCK_CLOSE: &str = "</div>";

/// Wraps every closed ```-fenced region of `content` in a code-block
/// container. Fences and language tags stay inside the container; text
/// outside the fences is copied as-is. A final fence without a closing
/// partner is copied verbatim.
pub fn format_code_blocks(content: &str) -> String {
    if !content.contains(FENCE) {
        return content.to_string();
    }

    let parts = content.split(FENCE).collect::<Vec<_>>();
    let closed_regions = parts.len() % 2 == 1;
    let mut out = String::with_capacity(content.len() + 64);

    for (idx, part) in parts.iter().enumerate() {
        if idx % 2 == 0 {
            out.push_str(part);
            continue;
        }

        let is_dangling = !closed_regions && idx == parts.len() - 1;
        if is_dangling || already_wrapped(&out, &parts, idx) {
            out.push_str(FENCE);
            out.push_str(part);
            if !is_dangling {
                out.push_str(FENCE);
            }
            continue;
        }

        out.push_str(CODE_BLOCK_OPEN);
        out.push('\n');
        out.push_str(FENCE);
        out.push_str(part);
        out.push_str(FENCE);
        out.push('\n');
        out.push_str(CODE_BLOCK_CLOSE);
    }

    out
}

fn already_wrapped(out: &str, parts: &[&str], idx: usize) -> bool {
    let opened = out
        .strip_suffix('\n')
        .is_some_and(|prefix| prefix.ends_with(CODE_BLOCK_OPEN));
    let closed = parts
        .get(idx + 1)
        .is_some_and(|next| next.starts_with(&format!("\n{CODE_BLOCK_CLOSE}")));
    opened && closed
}

/// Language tag of a fenced region: its first line when that line is
/// non-empty and not indented.
pub fn language_tag(region: &str) -> Option<&str> {
    let first = region.split('\n').next().unwrap_or_default();
    let first = first.trim_end_matches('\r');
    if first.is_empty() || first.starts_with(char::is_whitespace) {
        None
    } else {
        Some(first)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Code {
        language: Option<&'a str>,
        body: &'a str,
    },
}

/// Splits formatter output back into plain text and code segments.
pub fn parse_segments(formatted: &str) -> Vec<Segment<'_>> {
    let open = format!("{CODE_BLOCK_OPEN}\n{FENCE}");
    let close = format!("{FENCE}\n{CODE_BLOCK_CLOSE}");
    let mut segments = Vec::new();
    let mut rest = formatted;

    while let Some(start) = rest.find(&open) {
        let after_open = &rest[start + open.len()..];
        let Some(end) = after_open.find(&close) else {
            break;
        };

        if start > 0 {
            segments.push(Segment::Text(&rest[..start]));
        }

        let region = &after_open[..end];
        segments.push(code_segment(region));
        rest = &after_open[end + close.len()..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }

    segments
}

fn code_segment(region: &str) -> Segment<'_> {
    match language_tag(region) {
        Some(language) => {
            let body = region
                .split_once('\n')
                .map_or("", |(_, body)| body);
            Segment::Code {
                language: Some(language),
                body,
            }
        }
        None => Segment::Code {
            language: None,
            body: region.strip_prefix('\n').unwrap_or(region),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{Segment, format_code_blocks, language_tag, parse_segments};

    #[test]
    fn wraps_only_the_fenced_segment() {
        let input = "intro ```python\nprint(1)\n``` outro";
        let out = format_code_blocks(input);

        assert!(out.starts_with("intro "));
        assert!(out.ends_with(" outro"));
        insta::assert_snapshot!(out, @r###"
        intro <div class="code-block">
        ```python
        print(1)
        ```
        </div> outro
        "###);
    }

    #[test]
    fn text_without_backticks_is_unchanged() {
        let input = "no code here, just `inline` ticks";
        assert_eq!(format_code_blocks(input), input);
        assert_eq!(format_code_blocks(""), "");
    }

    #[test]
    fn wraps_every_closed_region_in_order() {
        let input = "a ```js\n1\n``` b ```\n2\n``` c";
        let out = format_code_blocks(input);
        assert_eq!(out.matches("<div class=\"code-block\">").count(), 2);
        let first = out.find("```js").expect("first block");
        let second = out.find("```\n2").expect("second block");
        assert!(first < second);
        assert!(out.contains(" b "));
    }

    #[test]
    fn dangling_fence_is_passed_through() {
        let input = "done ```x\n1\n``` then ```rust\nfn main() {";
        let out = format_code_blocks(input);
        assert_eq!(out.matches("<div class=\"code-block\">").count(), 1);
        assert!(out.ends_with(" then ```rust\nfn main() {"));
    }

    #[test]
    fn formatting_twice_does_not_double_wrap() {
        let input = "intro ```python\nprint(1)\n``` outro ```\nraw\n```";
        let once = format_code_blocks(input);
        let twice = format_code_blocks(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn language_tag_requires_unindented_first_line() {
        assert_eq!(language_tag("python\nprint(1)\n"), Some("python"));
        assert_eq!(language_tag("\nprint(1)\n"), None);
        assert_eq!(language_tag("  indented\n"), None);
    }

    #[test]
    fn parse_segments_recovers_text_and_code() {
        let formatted = format_code_blocks("intro ```python\nprint(1)\n``` outro");
        let segments = parse_segments(&formatted);
        assert_eq!(
            segments,
            vec![
                Segment::Text("intro "),
                Segment::Code {
                    language: Some("python"),
                    body: "print(1)\n",
                },
                Segment::Text(" outro"),
            ]
        );
    }

    #[test]
    fn parse_segments_on_plain_text_is_single_segment() {
        assert_eq!(parse_segments("hello"), vec![Segment::Text("hello")]);
        assert!(parse_segments("").is_empty());
    }
}
