//! HTML table extraction for the meeting pages.
//!
//! Every function here takes the page body as a string and returns owned
//! rows, so a parsed document never lives across a suspension point.
//!
//! # Page shapes
//!
//! | Page | Where the rows are |
//! |------|--------------------|
//! | Council landing | one table per year, `id="table2019"`, ... |
//! | Committee / work group landing | collapsible sections toggled by `javascript:ReverseDisplay('<id>')` |
//! | Doc-set page | the table after `<a name="<fragment>">`, or the only table |
//! | Recordings page | the second of exactly two tables |

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::StructureError;
use crate::models::{Anchor, Cell, TableRow};

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));
static WITH_ID: Lazy<Selector> = Lazy::new(|| Selector::parse("[id]").expect("valid selector"));
static WITH_NAME: Lazy<Selector> = Lazy::new(|| Selector::parse("[name]").expect("valid selector"));

static YEAR_TABLE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"table20[0-9]{2}").expect("valid regex"));
static REVERSE_DISPLAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"javascript:ReverseDisplay\('(?P<target>.+)'\)").expect("valid regex")
});

const MAX_COLSPAN: usize = 50;
const MAX_ROWSPAN: usize = 500;

/// A named collapsible block of tables on a committee or work group page.
#[derive(Debug)]
pub struct Section {
    /// Anchor text of the toggle, trimmed.
    pub name: String,
    /// Data rows of every table in the block, oldest table first.
    pub rows: Result<Vec<TableRow>, StructureError>,
}

fn child_elements(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap)
}

/// The table's own rows, not those of tables nested in its cells.
fn own_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in child_elements(table) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(child_elements(child).filter(|e| e.value().name() == "tr"))
            }
            _ => {}
        }
    }
    rows
}

fn cell_of(el: ElementRef<'_>) -> Cell {
    let anchors = el
        .select(&LINK)
        .map(|a| Anchor {
            href: a.value().attr("href").unwrap_or_default().to_string(),
            external: a
                .value()
                .attr("rel")
                .is_some_and(|rel| rel.split_whitespace().any(|t| t.eq_ignore_ascii_case("external"))),
            text: a.text().collect(),
        })
        .collect();
    Cell {
        text: el.text().collect(),
        anchors,
    }
}

fn span(el: ElementRef<'_>, attr: &str, max: usize) -> usize {
    el.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, max)
}

/// Take the cell a `rowspan` carries into column `col` of the current row.
fn take_carried(carried: &mut [Option<(Cell, usize)>], col: usize) -> Option<Cell> {
    let slot = carried.get_mut(col)?;
    let (cell, left) = slot.as_mut()?;
    let out = cell.clone();
    *left -= 1;
    if *left == 0 {
        *slot = None;
    }
    Some(out)
}

/// Turn a `<table>` element into rows of cells.
///
/// `colspan` and `rowspan` are expanded by repeating the spanning cell, so
/// every logical column of a row sits at a fixed index.
pub fn parse_table(table: ElementRef<'_>) -> Vec<TableRow> {
    let mut carried: Vec<Option<(Cell, usize)>> = Vec::new();
    let mut rows = Vec::new();

    for tr in own_rows(table) {
        let mut cells = Vec::new();
        let mut col = 0;
        for td in child_elements(tr).filter(|e| matches!(e.value().name(), "td" | "th")) {
            while let Some(cell) = take_carried(&mut carried, col) {
                cells.push(cell);
                col += 1;
            }
            let cell = cell_of(td);
            let rowspan = span(td, "rowspan", MAX_ROWSPAN);
            for _ in 0..span(td, "colspan", MAX_COLSPAN) {
                if rowspan > 1 {
                    if carried.len() <= col {
                        carried.resize(col + 1, None);
                    }
                    carried[col] = Some((cell.clone(), rowspan - 1));
                }
                cells.push(cell.clone());
                col += 1;
            }
        }
        let end = carried.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
        while col < end {
            cells.push(take_carried(&mut carried, col).unwrap_or_default());
            col += 1;
        }
        rows.push(TableRow::new(cells));
    }
    rows
}

/// Rows of a table without its header row.
fn data_rows(table: ElementRef<'_>) -> Vec<TableRow> {
    parse_table(table).into_iter().skip(1).collect()
}

/// Data rows of every per-year table of a council landing page, oldest year first.
pub fn year_table_rows(body: &str) -> Vec<TableRow> {
    let document = Html::parse_document(body);
    document
        .select(&WITH_ID)
        .filter_map(|el| el.value().id().map(|id| (id.to_string(), el)))
        .filter(|(id, _)| YEAR_TABLE_ID.is_match(id))
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .flat_map(|(_, table)| data_rows(table))
        .collect()
}

/// The collapsible sections of a committee or work group landing page.
///
/// The site lists each section's tables newest first; rows are returned
/// oldest table first so that undated rows follow the meeting they belong to.
pub fn collapsible_sections(body: &str) -> Vec<Section> {
    let document = Html::parse_document(body);
    document
        .select(&LINK)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let target = REVERSE_DISPLAY.captures(href)?.name("target")?.as_str().to_string();
            Some((a.text().collect::<String>().trim().to_string(), target))
        })
        .map(|(name, target)| {
            let rows = document
                .select(&WITH_ID)
                .find(|el| el.value().id() == Some(target.as_str()))
                .map(|block| {
                    let tables: Vec<_> = block.select(&TABLE).collect();
                    tables.into_iter().rev().flat_map(data_rows).collect()
                })
                .ok_or(StructureError::SectionNotFound(target));
            Section { name, rows }
        })
        .collect()
}

/// First `<table>` after `start` in document order.
fn next_table<'a>(document: &'a Html, start: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let start_id = (*start).id();
    document
        .root_element()
        .descendants()
        .skip_while(|node| node.id() != start_id)
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

/// Data rows of a doc-set page.
///
/// With `anchor`, the table following `<a name="{anchor}">` is used;
/// otherwise the page must hold exactly one table.
pub fn doc_set_rows(body: &str, anchor: Option<&str>) -> Result<Vec<TableRow>, StructureError> {
    let document = Html::parse_document(body);
    let table = match anchor {
        Some(anchor) => {
            let start = document
                .select(&WITH_NAME)
                .find(|el| el.value().attr("name") == Some(anchor))
                .ok_or_else(|| StructureError::AnchorNotFound(anchor.to_string()))?;
            next_table(&document, start)
                .ok_or_else(|| StructureError::TableNotFound(anchor.to_string()))?
        }
        None => {
            let tables: Vec<_> = document.select(&TABLE).collect();
            match tables.as_slice() {
                [only] => *only,
                _ => {
                    return Err(StructureError::TableCount {
                        expected: 1,
                        found: tables.len(),
                    });
                }
            }
        }
    };
    Ok(data_rows(table))
}

/// Data rows of a recordings page, which holds exactly two tables.
pub fn recording_rows(body: &str) -> Result<Vec<TableRow>, StructureError> {
    let document = Html::parse_document(body);
    let tables: Vec<_> = document.select(&TABLE).collect();
    match tables.as_slice() {
        [_, recordings] => Ok(data_rows(*recordings)),
        _ => Err(StructureError::TableCount {
            expected: 2,
            found: tables.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_table(html: &str) -> Vec<TableRow> {
        let document = Html::parse_document(html);
        let table = document.select(&TABLE).next().unwrap();
        parse_table(table)
    }

    fn texts(row: &TableRow) -> Vec<&str> {
        row.cells.iter().map(|c| c.text.trim()).collect()
    }

    #[test]
    fn test_parse_table_text_and_anchors() {
        let rows = first_table(
            r#"<table>
                <tr><th>會議</th><th>議程</th></tr>
                <tr><td>第一次會議</td><td><a href="a.pdf">議程</a> <a href="b.pdf" rel="external nofollow">附件</a></td></tr>
            </table>"#,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(texts(&rows[0]), ["會議", "議程"]);
        let anchors = &rows[1].cell(1).anchors;
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].href, "a.pdf");
        assert!(!anchors[0].external);
        assert_eq!(anchors[1].text, "附件");
        assert!(anchors[1].external);
    }

    #[test]
    fn test_parse_table_expands_spans() {
        let rows = first_table(
            r#"<table>
                <tr><td rowspan="2">A</td><td colspan="2">B</td></tr>
                <tr><td>C</td><td>D</td></tr>
            </table>"#,
        );
        assert_eq!(texts(&rows[0]), ["A", "B", "B"]);
        assert_eq!(texts(&rows[1]), ["A", "C", "D"]);
    }

    #[test]
    fn test_parse_table_ignores_nested_table_rows() {
        let rows = first_table(
            r#"<table><tbody>
                <tr><td>outer<table><tr><td>inner</td></tr></table></td></tr>
            </tbody></table>"#,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].width(), 1);
    }

    #[test]
    fn test_year_tables_sorted_and_headers_dropped() {
        let body = r#"<html><body>
            <table id="table2017"><tr><th>h</th></tr><tr><td>2017-row</td></tr></table>
            <table id="table2016"><tr><th>h</th></tr><tr><td>2016-row</td></tr></table>
            <table id="other"><tr><th>h</th></tr><tr><td>ignored</td></tr></table>
        </body></html>"#;
        let rows = year_table_rows(body);
        let firsts: Vec<_> = rows.iter().map(|r| r.cell(0).text.as_str()).collect();
        assert_eq!(firsts, ["2016-row", "2017-row"]);
    }

    #[test]
    fn test_collapsible_sections_reverse_table_order() {
        let body = r#"<html><body>
            <a href="javascript:ReverseDisplay('c1')"> 財務委員會 </a>
            <div id="c1">
                <table><tr><th>h</th></tr><tr><td>new</td></tr></table>
                <table><tr><th>h</th></tr><tr><td>old</td></tr></table>
            </div>
            <a href="javascript:ReverseDisplay('missing')">Ghost</a>
        </body></html>"#;
        let sections = collapsible_sections(body);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "財務委員會");
        let rows = sections[0].rows.as_ref().unwrap();
        let firsts: Vec<_> = rows.iter().map(|r| r.cell(0).text.as_str()).collect();
        assert_eq!(firsts, ["old", "new"]);
        assert!(matches!(
            sections[1].rows,
            Err(StructureError::SectionNotFound(ref t)) if t == "missing"
        ));
    }

    #[test]
    fn test_doc_set_rows_follow_named_anchor() {
        let body = r#"<html><body>
            <table><tr><th>h</th></tr><tr><td>before</td></tr></table>
            <a name="16690"></a>
            <table><tr><th>h</th></tr><tr><td>wanted</td></tr></table>
            <table><tr><th>h</th></tr><tr><td>after</td></tr></table>
        </body></html>"#;
        let rows = doc_set_rows(body, Some("16690")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cell(0).text, "wanted");
        assert!(matches!(
            doc_set_rows(body, Some("nope")),
            Err(StructureError::AnchorNotFound(_))
        ));
        assert!(matches!(
            doc_set_rows(body, None),
            Err(StructureError::TableCount { expected: 1, found: 3 })
        ));
    }

    #[test]
    fn test_doc_set_rows_anchor_without_following_table() {
        let body = r#"<html><body><table><tr><td>x</td></tr></table><a name="end"></a></body></html>"#;
        assert!(matches!(
            doc_set_rows(body, Some("end")),
            Err(StructureError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_recording_rows_use_second_table() {
        let body = r#"<html><body>
            <table><tr><td>meta</td></tr></table>
            <table><tr><th>h</th></tr><tr><td>1</td><td><a href="a.mp3">Part 1</a></td></tr></table>
        </body></html>"#;
        let rows = recording_rows(body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cell(1).anchors[0].text, "Part 1");
        assert!(matches!(
            recording_rows("<table></table>"),
            Err(StructureError::TableCount { expected: 2, found: 1 })
        ));
    }
}
