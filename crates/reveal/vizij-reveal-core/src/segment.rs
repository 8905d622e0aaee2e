//! Content segmentation for per-letter and per-word text effects.
//!
//! Marked-up text is split into an ordered list of [`Segment`]s. Tags and whitespace runs are
//! preserved verbatim so the content renders back unchanged; only [`Segment::Unit`]s are
//! animated. Letters are extended grapheme clusters, and character entities (`&amp;`) count
//! as a single letter.

use unicode_segmentation::UnicodeSegmentation;

/// Granularity of animatable units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    Letters,
    Words,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Animatable unit (word or letter).
    Unit(String),
    /// Whitespace run.
    Space(String),
    /// Tag such as `<b>`, `</b>` or `<br/>`.
    Markup(String),
}

impl Segment {
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            Self::Unit(s) | Self::Space(s) | Self::Markup(s) => s,
        }
    }

    #[inline]
    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit(_))
    }
}

/// Class attribute placed on every rendered unit wrapper.
pub const UNIT_CLASS: &str = "reveal-unit";

/// Split `markup` into segments.
pub fn segment(markup: &str, mode: SegmentMode) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut rest = markup;
    while !rest.is_empty() {
        if let Some(len) = tag_len(rest) {
            out.push(Segment::Markup(rest[..len].to_string()));
            rest = &rest[len..];
            continue;
        }
        let text_end = rest
            .char_indices()
            .skip(1)
            .find(|(i, c)| *c == '<' && tag_len(&rest[*i..]).is_some())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        push_text(&rest[..text_end], mode, &mut out);
        rest = &rest[text_end..];
    }
    out
}

/// Length of a tag at the start of `s`. A '<' not followed by a name, '/' or '!' is text.
fn tag_len(s: &str) -> Option<usize> {
    let mut chars = s.chars();
    if chars.next()? != '<' {
        return None;
    }
    let next = chars.next()?;
    if !(next.is_ascii_alphabetic() || next == '/' || next == '!') {
        return None;
    }
    s.find('>').map(|end| end + 1)
}

fn push_text(text: &str, mode: SegmentMode, out: &mut Vec<Segment>) {
    for (is_space, run) in whitespace_runs(text) {
        if is_space {
            out.push(Segment::Space(run.to_string()));
            continue;
        }
        match mode {
            SegmentMode::Words => out.push(Segment::Unit(run.to_string())),
            SegmentMode::Letters => push_letters(run, out),
        }
    }
}

fn push_letters(run: &str, out: &mut Vec<Segment>) {
    let mut rest = run;
    while !rest.is_empty() {
        let len = entity_len(rest).unwrap_or_else(|| {
            rest.graphemes(true)
                .next()
                .map(str::len)
                .unwrap_or(rest.len())
        });
        out.push(Segment::Unit(rest[..len].to_string()));
        rest = &rest[len..];
    }
}

/// Length of a character entity (`&amp;`, `&#8212;`) at the start of `s`.
fn entity_len(s: &str) -> Option<usize> {
    if !s.starts_with('&') {
        return None;
    }
    let end = s.char_indices().take(12).find(|(_, c)| *c == ';')?.0;
    let body = &s[1..end];
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_alphanumeric() || c == '#') {
        return None;
    }
    Some(end + 1)
}

/// Split text into alternating whitespace / non-whitespace runs.
fn whitespace_runs(text: &str) -> Vec<(bool, &str)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;
    for (idx, c) in text.char_indices() {
        let space = c.is_whitespace();
        match current {
            Some(prev) if prev == space => {}
            Some(prev) => {
                runs.push((prev, &text[start..idx]));
                start = idx;
                current = Some(space);
            }
            None => current = Some(space),
        }
    }
    if let Some(prev) = current {
        runs.push((prev, &text[start..]));
    }
    runs
}

/// Number of animatable units in a segment list.
pub fn unit_count(segments: &[Segment]) -> usize {
    segments.iter().filter(|s| s.is_unit()).count()
}

/// Render segments back to markup, wrapping each unit in a span.
/// `style_for(index, text)` returns inline style for the unit (empty string = no style).
pub fn render<F>(segments: &[Segment], mut style_for: F) -> String
where
    F: FnMut(usize, &str) -> String,
{
    let mut html = String::new();
    let mut index = 0;
    for seg in segments {
        match seg {
            Segment::Unit(text) => {
                let style = style_for(index, text);
                let style = if style.is_empty() {
                    String::new()
                } else {
                    format!(" style=\"{style}\"")
                };
                html.push_str(&format!(
                    "<span class=\"{UNIT_CLASS}\" data-index=\"{index}\"{style}>{text}</span>"
                ));
                index += 1;
            }
            Segment::Space(text) | Segment::Markup(text) => html.push_str(text),
        }
    }
    html
}

/// Concatenate segments without wrappers (inverse of [`segment`]).
pub fn join(segments: &[Segment]) -> String {
    segments.iter().map(Segment::text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(segments: &[Segment]) -> Vec<&str> {
        segments
            .iter()
            .filter(|s| s.is_unit())
            .map(Segment::text)
            .collect()
    }

    #[test]
    fn words_preserve_whitespace() {
        let segs = segment("  Hello   big\nworld ", SegmentMode::Words);
        assert_eq!(units(&segs), vec!["Hello", "big", "world"]);
        assert_eq!(join(&segs), "  Hello   big\nworld ");
        assert_eq!(segs[0], Segment::Space("  ".into()));
    }

    #[test]
    fn letters_keep_nested_markup() {
        let segs = segment("Hi <b>y<i>o</i></b>!", SegmentMode::Letters);
        assert_eq!(units(&segs), vec!["H", "i", "y", "o", "!"]);
        assert!(segs.contains(&Segment::Markup("<i>".into())));
        assert!(segs.contains(&Segment::Markup("</b>".into())));
        assert_eq!(join(&segs), "Hi <b>y<i>o</i></b>!");
    }

    #[test]
    fn letters_are_graphemes_and_entities() {
        let segs = segment("e\u{301}&amp;👩‍👩‍👧", SegmentMode::Letters);
        assert_eq!(units(&segs), vec!["e\u{301}", "&amp;", "👩‍👩‍👧"]);
    }

    #[test]
    fn stray_angle_bracket_is_text() {
        let segs = segment("a < b", SegmentMode::Words);
        assert_eq!(units(&segs), vec!["a", "<", "b"]);
        assert_eq!(join(&segs), "a < b");
    }

    #[test]
    fn lone_ampersand_is_a_letter() {
        let segs = segment("a&b", SegmentMode::Letters);
        assert_eq!(units(&segs), vec!["a", "&", "b"]);
    }

    #[test]
    fn render_wraps_units_only() {
        let segs = segment("<em>ab</em> c", SegmentMode::Letters);
        assert_eq!(unit_count(&segs), 3);
        let html = render(&segs, |i, _| {
            if i == 0 {
                "opacity:0".to_string()
            } else {
                String::new()
            }
        });
        assert_eq!(
            html,
            "<em><span class=\"reveal-unit\" data-index=\"0\" style=\"opacity:0\">a</span>\
             <span class=\"reveal-unit\" data-index=\"1\">b</span></em> \
             <span class=\"reveal-unit\" data-index=\"2\">c</span>"
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(segment("", SegmentMode::Words).is_empty());
    }
}
