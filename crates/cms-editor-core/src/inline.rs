//! Flat view of inline content.
//!
//! Range edits (mark toggles, link wrapping, deletion, splitting) are much
//! simpler on a flat sequence of pieces than on the nested `Inline` tree, so
//! every edit flattens a block's children, works on [`Piece`]s and rebuilds.
//! Rebuilding is also what gives inline content its canonical form: adjacent
//! runs with identical formatting merge, empty runs vanish and consecutive
//! runs sharing a URL regroup into one [`LinkSpan`].

use std::ops::Range;

use crate::document::{ImageEmbed, Inline, LinkSpan, TextRun};
use crate::types::{Marks, TextStyle};

/// Formatting carried by one character of text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunFormat {
    pub marks: Marks,
    pub style: TextStyle,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Piece {
    Text { text: String, format: RunFormat },
    Image(ImageEmbed),
}

impl Piece {
    fn char_len(&self) -> usize {
        match self {
            Piece::Text { text, .. } => text.chars().count(),
            Piece::Image(_) => 1,
        }
    }
}

pub(crate) fn flatten(children: &[Inline]) -> Vec<Piece> {
    let mut pieces = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Inline::Text(run) => push_run(&mut pieces, run, None),
            Inline::Link(link) => {
                for run in &link.children {
                    push_run(&mut pieces, run, Some(&link.url));
                }
            }
            Inline::Image(image) => pieces.push(Piece::Image(image.clone())),
        }
    }
    pieces
}

fn push_run(pieces: &mut Vec<Piece>, run: &TextRun, link: Option<&str>) {
    if run.text.is_empty() {
        return;
    }
    pieces.push(Piece::Text {
        text: run.text.clone(),
        format: RunFormat {
            marks: run.marks,
            style: run.style.clone(),
            link: link.map(str::to_string),
        },
    });
}

pub(crate) fn rebuild(pieces: Vec<Piece>) -> Vec<Inline> {
    // Merge adjacent text with identical formatting first.
    let mut merged: Vec<Piece> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match piece {
            Piece::Text { text, .. } if text.is_empty() => {}
            Piece::Text { text, format } => match merged.last_mut() {
                Some(Piece::Text {
                    text: prev,
                    format: prev_format,
                }) if *prev_format == format => prev.push_str(&text),
                _ => merged.push(Piece::Text { text, format }),
            },
            image => merged.push(image),
        }
    }

    let mut out: Vec<Inline> = Vec::with_capacity(merged.len());
    for piece in merged {
        match piece {
            Piece::Image(image) => out.push(Inline::Image(image)),
            Piece::Text { text, format } => {
                let run = TextRun {
                    text,
                    marks: format.marks,
                    style: format.style,
                };
                match format.link {
                    None => out.push(Inline::Text(run)),
                    Some(url) => match out.last_mut() {
                        Some(Inline::Link(link)) if link.url == url => link.children.push(run),
                        _ => out.push(Inline::Link(LinkSpan::new(url, vec![run]))),
                    },
                }
            }
        }
    }
    out
}

/// Canonical form of an inline sequence. Besides merging runs, values are
/// brought into the shape HTML import produces: link URLs trimmed (blank ones
/// dropped), styles limited to single CSS values and images without a source
/// removed.
pub fn normalize(children: &[Inline]) -> Vec<Inline> {
    rebuild(flatten(children).into_iter().filter_map(canonical_piece).collect())
}

fn canonical_piece(piece: Piece) -> Option<Piece> {
    match piece {
        Piece::Text { text, mut format } => {
            format.link = format
                .link
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty());
            format.style = format.style.sanitized();
            Some(Piece::Text { text, format })
        }
        Piece::Image(image) => image.sanitized().map(Piece::Image),
    }
}

/// Length in editor characters; images count as one.
pub fn content_len(children: &[Inline]) -> usize {
    children.iter().map(Inline::char_len).sum()
}

pub fn plain_text(children: &[Inline]) -> String {
    let mut out = String::new();
    for piece in flatten(children) {
        if let Piece::Text { text, .. } = piece {
            out.push_str(&text);
        }
    }
    out
}

/// Ensure a piece boundary at `offset`; returns the index of the first piece
/// at or after it.
fn split_at(pieces: &mut Vec<Piece>, offset: usize) -> usize {
    let mut pos = 0;
    for index in 0..pieces.len() {
        if pos == offset {
            return index;
        }
        let len = pieces[index].char_len();
        if offset < pos + len {
            if let Piece::Text { text, format } = &mut pieces[index] {
                let byte = char_to_byte(text, offset - pos);
                let tail = text.split_off(byte);
                let format = format.clone();
                pieces.insert(index + 1, Piece::Text { text: tail, format });
            }
            return index + 1;
        }
        pos += len;
    }
    pieces.len()
}

fn char_to_byte(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Split off pieces covering `range`, returning their index range.
fn isolate(pieces: &mut Vec<Piece>, range: &Range<usize>) -> Range<usize> {
    let end = split_at(pieces, range.end);
    let before = pieces.len();
    let start = split_at(pieces, range.start);
    // Splitting at start may have shifted the end index by one.
    start..end + (pieces.len() - before)
}

fn clamp(children: &[Inline], range: Range<usize>) -> Range<usize> {
    let len = content_len(children);
    let start = range.start.min(len);
    let end = range.end.min(len).max(start);
    start..end
}

/// Insert text at `offset` with the given formatting.
pub fn insert_text(children: &mut Vec<Inline>, offset: usize, text: &str, format: &RunFormat) {
    if text.is_empty() {
        return;
    }
    let offset = offset.min(content_len(children));
    let mut pieces = flatten(children);
    let index = split_at(&mut pieces, offset);
    pieces.insert(
        index,
        Piece::Text {
            text: text.to_string(),
            format: format.clone(),
        },
    );
    *children = rebuild(pieces);
}

/// Insert an image at `offset`. Images never join a link: a link around the
/// insertion point is split.
pub fn insert_image(children: &mut Vec<Inline>, offset: usize, image: ImageEmbed) {
    let offset = offset.min(content_len(children));
    let mut pieces = flatten(children);
    let index = split_at(&mut pieces, offset);
    pieces.insert(index, Piece::Image(image));
    *children = rebuild(pieces);
}

pub fn delete_range(children: &mut Vec<Inline>, range: Range<usize>) {
    let range = clamp(children, range);
    if range.is_empty() {
        return;
    }
    let mut pieces = flatten(children);
    let span = isolate(&mut pieces, &range);
    pieces.drain(span);
    *children = rebuild(pieces);
}

/// Split the content at `offset`, keeping the head and returning the tail.
pub fn split_off(children: &mut Vec<Inline>, offset: usize) -> Vec<Inline> {
    let mut pieces = flatten(children);
    let index = split_at(&mut pieces, offset.min(content_len(children)));
    let tail = pieces.split_off(index);
    *children = rebuild(pieces);
    rebuild(tail)
}

/// Append `tail` to `children`, re-normalising across the seam.
pub fn append(children: &mut Vec<Inline>, tail: Vec<Inline>) {
    let mut pieces = flatten(children);
    pieces.extend(flatten(&tail));
    *children = rebuild(pieces);
}

/// Apply `f` to the format of every text character inside `range`.
///
/// Returns the number of text pieces touched.
pub fn update_formats(
    children: &mut Vec<Inline>,
    range: Range<usize>,
    mut f: impl FnMut(&mut RunFormat),
) -> usize {
    let range = clamp(children, range);
    if range.is_empty() {
        return 0;
    }
    let mut pieces = flatten(children);
    let span = isolate(&mut pieces, &range);
    let mut touched = 0;
    for piece in &mut pieces[span] {
        if let Piece::Text { format, .. } = piece {
            f(format);
            touched += 1;
        }
    }
    *children = rebuild(pieces);
    touched
}

/// Formats of every text piece intersecting `range`.
pub fn formats_in(children: &[Inline], range: Range<usize>) -> Vec<RunFormat> {
    let range = clamp(children, range);
    let mut out = Vec::new();
    let mut pos = 0;
    for piece in flatten(children) {
        let len = piece.char_len();
        let overlaps = pos < range.end && range.start < pos + len;
        if overlaps {
            if let Piece::Text { format, .. } = piece {
                out.push(format);
            }
        }
        pos += len;
    }
    out
}

/// Format new text typed at `offset` should take.
///
/// Marks and style come from the character before the caret (or after, at
/// the very start). The link is inherited only when the caret sits strictly
/// inside a link.
pub fn format_at(children: &[Inline], offset: usize) -> RunFormat {
    let before = piece_format_at(children, offset.checked_sub(1));
    let after = piece_format_at(children, Some(offset));
    let mut format = before.clone().or_else(|| after.clone()).unwrap_or_default();
    let inside_link = matches!(
        (&before, &after),
        (Some(b), Some(a)) if b.link.is_some() && b.link == a.link
    );
    if !inside_link {
        format.link = None;
    }
    format
}

fn piece_format_at(children: &[Inline], offset: Option<usize>) -> Option<RunFormat> {
    let offset = offset?;
    let mut pos = 0;
    for piece in flatten(children) {
        let len = piece.char_len();
        if offset < pos + len {
            return match piece {
                Piece::Text { format, .. } => Some(format),
                Piece::Image(_) => None,
            };
        }
        pos += len;
    }
    None
}

/// Character range of the link touching `offset`, if any.
pub fn link_extent(children: &[Inline], offset: usize) -> Option<Range<usize>> {
    let mut pos = 0;
    for child in children {
        let len = child.char_len();
        if let Inline::Link(_) = child {
            if pos <= offset && offset <= pos + len {
                return Some(pos..pos + len);
            }
        }
        pos += len;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(text: &str) -> Inline {
        Inline::marked(text, Marks::BOLD)
    }

    #[test]
    fn test_rebuild_merges_identical_runs() {
        let children = vec![Inline::text("Hel"), Inline::text("lo"), bold("!")];
        assert_eq!(normalize(&children), vec![Inline::text("Hello"), bold("!")]);
    }

    #[test]
    fn test_rebuild_drops_empty_runs() {
        let children = vec![Inline::text(""), Inline::text("a"), Inline::text("")];
        assert_eq!(normalize(&children), vec![Inline::text("a")]);
    }

    #[test]
    fn test_normalize_canonicalizes_values() {
        let children = vec![
            Inline::Link(LinkSpan::new("  https://x  ", vec![TextRun::new("a")])),
            Inline::Link(LinkSpan::new(" ", vec![TextRun::new("b")])),
            Inline::Text(TextRun::new("c").with_style(TextStyle {
                color: Some("red; x: y".into()),
                background: None,
            })),
            Inline::Image(ImageEmbed::new("   ", "gone")),
        ];
        assert_eq!(
            normalize(&children),
            vec![
                Inline::Link(LinkSpan::new("https://x", vec![TextRun::new("a")])),
                Inline::text("bc"),
            ]
        );
    }

    #[test]
    fn test_insert_text_in_middle_of_run() {
        let mut children = vec![Inline::text("Hllo")];
        insert_text(&mut children, 1, "e", &RunFormat::default());
        assert_eq!(children, vec![Inline::text("Hello")]);
    }

    #[test]
    fn test_insert_formatted_text_splits_run() {
        let mut children = vec![Inline::text("ac")];
        let format = RunFormat {
            marks: Marks::ITALIC,
            ..Default::default()
        };
        insert_text(&mut children, 1, "b", &format);
        assert_eq!(
            children,
            vec![Inline::text("a"), Inline::marked("b", Marks::ITALIC), Inline::text("c")]
        );
    }

    #[test]
    fn test_update_formats_on_partial_range() {
        let mut children = vec![Inline::text("Hello World")];
        let touched = update_formats(&mut children, 6..11, |f| f.marks.insert(Marks::BOLD));
        assert_eq!(touched, 1);
        assert_eq!(children, vec![Inline::text("Hello "), bold("World")]);
    }

    #[test]
    fn test_update_formats_across_existing_boundaries() {
        let mut children = vec![Inline::text("ab"), bold("cd"), Inline::text("ef")];
        update_formats(&mut children, 1..5, |f| f.marks.insert(Marks::ITALIC));
        assert_eq!(
            children,
            vec![
                Inline::text("a"),
                Inline::marked("b", Marks::ITALIC),
                Inline::marked("cd", Marks::BOLD | Marks::ITALIC),
                Inline::marked("e", Marks::ITALIC),
                Inline::text("f"),
            ]
        );
    }

    #[test]
    fn test_link_regroups_runs_and_skips_images() {
        let mut children = vec![
            Inline::text("ab"),
            Inline::Image(ImageEmbed::new("x.png", "x")),
            Inline::text("cd"),
        ];
        update_formats(&mut children, 0..5, |f| f.link = Some("https://a".into()));
        assert_eq!(
            children,
            vec![
                Inline::Link(LinkSpan::new("https://a", vec![TextRun::new("ab")])),
                Inline::Image(ImageEmbed::new("x.png", "x")),
                Inline::Link(LinkSpan::new("https://a", vec![TextRun::new("cd")])),
            ]
        );
    }

    #[test]
    fn test_delete_range_spanning_runs() {
        let mut children = vec![Inline::text("ab"), bold("cd"), Inline::text("ef")];
        delete_range(&mut children, 1..5);
        assert_eq!(children, vec![Inline::text("af")]);
    }

    #[test]
    fn test_split_off_and_append_are_inverse() {
        let original = vec![Inline::text("Hello "), bold("World")];
        let mut head = original.clone();
        let tail = split_off(&mut head, 8);
        assert_eq!(head, vec![Inline::text("Hello "), bold("Wo")]);
        assert_eq!(tail, vec![bold("rld")]);
        append(&mut head, tail);
        assert_eq!(head, original);
    }

    #[test]
    fn test_format_at_inherits_marks_not_trailing_link() {
        let children = vec![
            Inline::Link(LinkSpan::new(
                "https://a",
                vec![TextRun::new("go").with_marks(Marks::BOLD)],
            )),
            Inline::text("!"),
        ];
        let at_end_of_link = format_at(&children, 2);
        assert_eq!(at_end_of_link.marks, Marks::BOLD);
        assert_eq!(at_end_of_link.link, None);

        let inside = format_at(&children, 1);
        assert_eq!(inside.link.as_deref(), Some("https://a"));
    }

    #[test]
    fn test_multibyte_offsets() {
        let mut children = vec![Inline::text("héllo")];
        update_formats(&mut children, 1..2, |f| f.marks.insert(Marks::CODE));
        assert_eq!(
            children,
            vec![Inline::text("h"), Inline::marked("é", Marks::CODE), Inline::text("llo")]
        );
    }

    #[test]
    fn test_link_extent() {
        let children = vec![
            Inline::text("see "),
            Inline::Link(LinkSpan::new("https://a", vec![TextRun::new("here")])),
        ];
        assert_eq!(link_extent(&children, 6), Some(4..8));
        assert_eq!(link_extent(&children, 1), None);
    }
}
