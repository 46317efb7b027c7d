//! Row layout for the composer: hard wraps the buffer into display rows.
//!
//! A row is a byte range of the buffer. Rows never contain `\n`; the
//! newline byte sits between the last row of one logical line and the
//! first row of the next.

use std::ops::Range;

use unicode_width::UnicodeWidthChar;

/// Borders consumed horizontally by the bordered block
pub(super) const HORIZONTAL_OVERHEAD: u16 = 2;
/// Top + bottom borders
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Rows shown before the composer starts scrolling internally
pub(super) const MAX_VISIBLE_ROWS: u16 = 5;

pub(super) fn inner_width(area_width: u16) -> u16 {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// Split `text` into rows no wider than `width` display columns.
/// Always returns at least one row.
pub(super) fn layout(text: &str, width: u16) -> Vec<Range<usize>> {
    let width = usize::from(width.max(1));
    let mut rows = Vec::new();
    let mut start = 0;
    let mut used = 0;

    for (i, c) in text.char_indices() {
        if c == '\n' {
            rows.push(start..i);
            start = i + 1;
            used = 0;
            continue;
        }
        let w = c.width().unwrap_or(0);
        if used + w > width && used > 0 {
            rows.push(start..i);
            start = i;
            used = 0;
        }
        used += w;
    }
    rows.push(start..text.len());
    rows
}

/// Index of the row holding byte offset `pos`.
pub(super) fn row_of(rows: &[Range<usize>], pos: usize) -> usize {
    rows.iter()
        .rposition(|row| row.start <= pos)
        .unwrap_or(0)
}

/// Display columns from the start of `row` up to `pos`.
pub(super) fn column_of(text: &str, row: &Range<usize>, pos: usize) -> u16 {
    text[row.start..pos.min(row.end)]
        .chars()
        .map(|c| c.width().unwrap_or(0))
        .sum::<usize>() as u16
}

/// Byte offset in `row` closest to display column `column` without passing it.
pub(super) fn offset_at_column(text: &str, row: &Range<usize>, column: u16) -> usize {
    let mut used = 0u16;
    for (i, c) in text[row.clone()].char_indices() {
        let w = c.width().unwrap_or(0) as u16;
        if used + w > column {
            return row.start + i;
        }
        used += w;
    }
    row.end
}
