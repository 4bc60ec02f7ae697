//! Correlating rendered-output offsets with markdown-source offsets.
//!
//! The renderer appends one [`OffsetMappingRecord`] per rendered node while it
//! walks the tree; the translation functions here answer "where is this caret
//! position in the other coordinate space". Markdown ranges are
//! inclusive-inclusive (a caret can rest at a span's end), HTML ranges are
//! inclusive-exclusive (an HTML end is the boundary between adjacent atoms).
//! That asymmetry is part of the contract, not an accident.

use crate::md_ast::{AstNode, NodeId, NodeType};

/// One row of the offset-mapping table: the HTML-space and markdown-space
/// ranges one node rendered into. Container records span their whole node and
/// overlap their children's records; consumers pick the innermost match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OffsetMappingRecord {
    pub node_type: NodeType,
    pub node_id: Option<NodeId>,
    pub html_start: usize,
    pub html_end: usize,
    pub md_start: usize,
    pub md_end: usize,
}

impl OffsetMappingRecord {
    /// Mentions and custom emoji are atomic in HTML space: a caret cannot
    /// land inside them, so interior offsets snap to a boundary.
    fn is_opaque(&self) -> bool {
        matches!(self.node_type, NodeType::Mention | NodeType::CustomEmoji)
    }

    fn md_span(&self) -> usize {
        self.md_end - self.md_start
    }

    fn html_span(&self) -> usize {
        self.html_end - self.html_start
    }
}

/// Translates a markdown-space offset to the corresponding HTML-space offset.
///
/// Offsets inside marker syntax (which has no rendered counterpart) clamp to
/// the containing record's HTML end; offsets past all mapped content
/// extrapolate from the nearest preceding record. An empty mapping translates
/// identically.
pub fn md_to_html_offset(mapping: &[OffsetMappingRecord], md_offset: usize) -> usize {
    let mut innermost: Option<&OffsetMappingRecord> = None;
    for record in mapping {
        if record.md_start <= md_offset && md_offset <= record.md_end {
            // Most specific wins: the latest-starting containing record,
            // then the smallest, with full ties going to the later record
            // (children follow their parents in the table).
            if innermost.map_or(true, |best| {
                record.md_start > best.md_start
                    || (record.md_start == best.md_start && record.md_span() <= best.md_span())
            }) {
                innermost = Some(record);
            }
        }
    }
    if let Some(record) = innermost {
        if record.is_opaque() {
            return if md_offset == record.md_start {
                record.html_start
            } else {
                record.html_end
            };
        }
        return (record.html_start + (md_offset - record.md_start)).min(record.html_end);
    }
    let mut nearest: Option<&OffsetMappingRecord> = None;
    for record in mapping {
        if record.md_end <= md_offset && nearest.map_or(true, |best| record.md_end >= best.md_end) {
            nearest = Some(record);
        }
    }
    match nearest {
        Some(record) => record.html_end + (md_offset - record.md_end),
        None => md_offset,
    }
}

/// Translates an HTML-space offset to the corresponding markdown-space
/// offset. Inverse direction of [`md_to_html_offset`], with the same opaque
/// and extrapolation rules.
pub fn html_to_md_offset(mapping: &[OffsetMappingRecord], html_offset: usize) -> usize {
    let mut innermost: Option<&OffsetMappingRecord> = None;
    for record in mapping {
        if record.html_start <= html_offset && html_offset < record.html_end {
            if innermost.map_or(true, |best| {
                record.html_start > best.html_start
                    || (record.html_start == best.html_start
                        && record.html_span() <= best.html_span())
            }) {
                innermost = Some(record);
            }
        }
    }
    if let Some(record) = innermost {
        if record.is_opaque() {
            return if html_offset == record.html_start {
                record.md_start
            } else {
                record.md_end
            };
        }
        return (record.md_start + (html_offset - record.html_start)).min(record.md_end);
    }
    let mut nearest: Option<&OffsetMappingRecord> = None;
    for record in mapping {
        if record.html_end <= html_offset
            && nearest.map_or(true, |best| record.html_end >= best.html_end)
        {
            nearest = Some(record);
        }
    }
    match nearest {
        Some(record) => record.md_end + (html_offset - record.html_end),
        None => html_offset,
    }
}

/// Accumulates mapping records during a render walk, tracking the two running
/// cursors. Container nodes open a record before recursing into children and
/// close it after, so a parent's record precedes (and spans) its children's.
pub(crate) struct MappingBuilder {
    html_offset: usize,
    md_offset: usize,
    records: Vec<OffsetMappingRecord>,
}

impl MappingBuilder {
    pub(crate) fn new() -> Self {
        MappingBuilder {
            html_offset: 0,
            md_offset: 0,
            records: Vec::new(),
        }
    }

    pub(crate) fn advance(&mut self, html_len: usize, md_len: usize) {
        self.html_offset += html_len;
        self.md_offset += md_len;
    }

    /// Opens a record at the current cursors; the returned index is passed to
    /// [`MappingBuilder::close`] once the node's content has been walked.
    pub(crate) fn open(&mut self, node: &AstNode) -> usize {
        self.records.push(OffsetMappingRecord {
            node_type: node.node_type(),
            node_id: node.id,
            html_start: self.html_offset,
            html_end: self.html_offset,
            md_start: self.md_offset,
            md_end: self.md_offset,
        });
        self.records.len() - 1
    }

    pub(crate) fn close(&mut self, index: usize) {
        let record = &mut self.records[index];
        record.html_end = self.html_offset;
        record.md_end = self.md_offset;
    }

    /// Widens an already-closed record without moving the cursors. Quotes use
    /// this to fold the following block separator into their markdown span.
    pub(crate) fn extend(&mut self, index: usize, html_by: usize, md_by: usize) {
        let record = &mut self.records[index];
        record.html_end += html_by;
        record.md_end += md_by;
    }

    pub(crate) fn finish(self) -> Vec<OffsetMappingRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        node_type: NodeType,
        html: (usize, usize),
        md: (usize, usize),
    ) -> OffsetMappingRecord {
        OffsetMappingRecord {
            node_type,
            node_id: None,
            html_start: html.0,
            html_end: html.1,
            md_start: md.0,
            md_end: md.1,
        }
    }

    // "a **b** c" renders to "a b c": bold spans html [2,3), md [2,7].
    fn bold_mapping() -> Vec<OffsetMappingRecord> {
        vec![
            record(NodeType::Paragraph, (0, 5), (0, 9)),
            record(NodeType::Text, (0, 2), (0, 2)),
            record(NodeType::Bold, (2, 3), (2, 7)),
            record(NodeType::Text, (2, 3), (4, 5)),
            record(NodeType::Text, (3, 5), (7, 9)),
        ]
    }

    #[test]
    fn md_inside_plain_text_is_linear() {
        assert_eq!(md_to_html_offset(&bold_mapping(), 1), 1);
        assert_eq!(md_to_html_offset(&bold_mapping(), 8), 4);
    }

    #[test]
    fn md_inside_marker_clamps_to_rendered_span() {
        // offset 3 sits inside the "**" opening marker
        assert_eq!(md_to_html_offset(&bold_mapping(), 3), 3);
        // offset 4 is the start of "b" inside the bold
        assert_eq!(md_to_html_offset(&bold_mapping(), 4), 2);
    }

    #[test]
    fn html_inside_bold_maps_to_inner_text() {
        assert_eq!(html_to_md_offset(&bold_mapping(), 2), 4);
    }

    #[test]
    fn html_in_plain_text_is_linear() {
        assert_eq!(html_to_md_offset(&bold_mapping(), 1), 1);
        assert_eq!(html_to_md_offset(&bold_mapping(), 4), 8);
    }

    #[test]
    fn innermost_record_wins_over_container() {
        // md offset 5 is contained by paragraph, bold, and the inner text;
        // the inner text (smallest) must be chosen.
        assert_eq!(md_to_html_offset(&bold_mapping(), 5), 3);
    }

    #[test]
    fn mention_interior_snaps_to_far_boundary() {
        // "@user" rendered as one atom: html [0,5), md [0,15] for
        // "[@user](id:123)".
        let mapping = vec![record(NodeType::Mention, (0, 5), (0, 15))];
        assert_eq!(md_to_html_offset(&mapping, 0), 0);
        assert_eq!(md_to_html_offset(&mapping, 7), 5);
        assert_eq!(html_to_md_offset(&mapping, 0), 0);
        assert_eq!(html_to_md_offset(&mapping, 3), 15);
    }

    #[test]
    fn beyond_content_extrapolates_from_last_record() {
        let mapping = vec![record(NodeType::Text, (0, 3), (0, 3))];
        assert_eq!(md_to_html_offset(&mapping, 5), 5);
        assert_eq!(html_to_md_offset(&mapping, 5), 5);
    }

    #[test]
    fn empty_mapping_is_identity() {
        assert_eq!(md_to_html_offset(&[], 7), 7);
        assert_eq!(html_to_md_offset(&[], 7), 7);
    }
}
