//! Data models shared by the crawler, the page parsers and the downloader.
//!
//! This module defines:
//! - [`BreadCrumb`]: the navigation path that becomes the archive directory path
//! - [`Cell`], [`Anchor`], [`TableRow`]: owned rows extracted from HTML tables
//! - [`Link`]: a resolved anchor ready to be fetched
//! - [`DownloadTask`]: one file to persist
//! - [`TableShape`] and [`MeetingRow`]: statically indexed meeting table rows

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::StructureError;

/// Ordered path segments identifying a node of the navigation tree.
///
/// Breadcrumbs are never shared between tasks: branching into a child always
/// produces a new, extended copy via [`BreadCrumb::child`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreadCrumb(Vec<String>);

impl BreadCrumb {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Copy of this breadcrumb with one more segment appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Directory for this breadcrumb below `root`, followed by `tail` segments.
    pub fn path_under(&self, root: &Path, tail: &[&str]) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(self.0.iter().map(String::as_str));
        path.extend(tail.iter().copied());
        path
    }
}

impl fmt::Display for BreadCrumb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// An `<a href>` found inside a table cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
    /// The raw `href` attribute.
    pub href: String,
    /// Whether the `rel` attribute lists `external`.
    pub external: bool,
    /// The anchor's visible text.
    pub text: String,
}

/// One table cell: its concatenated text plus any nested anchors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub anchors: Vec<Anchor>,
}

static EMPTY_CELL: Cell = Cell {
    text: String::new(),
    anchors: Vec::new(),
};

/// One row of an extracted table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<Cell>,
}

impl TableRow {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// The cell at `index`, or an empty cell for short rows.
    pub fn cell(&self, index: usize) -> &Cell {
        self.cells.get(index).unwrap_or(&EMPTY_CELL)
    }
}

/// A resolved link: absolute URL plus the anchor label used for naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    pub label: String,
}

/// A single file to persist, identified by its target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub target: PathBuf,
    pub source_url: String,
}

impl DownloadTask {
    pub fn new(target: PathBuf, source_url: impl Into<String>) -> Self {
        Self {
            target,
            source_url: source_url.into(),
        }
    }
}

/// Direct meeting documents linked from a meeting table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentRole {
    Agenda,
    Minutes,
}

impl DocumentRole {
    pub fn dir_name(self) -> &'static str {
        match self {
            DocumentRole::Agenda => "agenda",
            DocumentRole::Minutes => "minutes",
        }
    }
}

/// The three link columns of a doc-set table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocSetColumn {
    Main,
    Annex,
    Remark,
}

impl DocSetColumn {
    pub const ALL: [DocSetColumn; 3] = [DocSetColumn::Main, DocSetColumn::Annex, DocSetColumn::Remark];

    pub fn index(self) -> usize {
        match self {
            DocSetColumn::Main => 1,
            DocSetColumn::Annex => 2,
            DocSetColumn::Remark => 3,
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            DocSetColumn::Main => "mainDocs",
            DocSetColumn::Annex => "annexDocs",
            DocSetColumn::Remark => "remarkDocs",
        }
    }
}

/// Layout of a meeting table, detected once from its column count.
///
/// | Shape | Columns |
/// |-------|---------|
/// | `SixColumn` | name, date, time, agenda, minutes, docset |
/// | `SevenColumn` | name, date, time, agenda, minutes, recording, docset |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableShape {
    SixColumn,
    SevenColumn,
}

impl TableShape {
    pub fn from_width(width: usize) -> Result<Self, StructureError> {
        match width {
            6 => Ok(TableShape::SixColumn),
            7 => Ok(TableShape::SevenColumn),
            other => Err(StructureError::ColumnCount(other)),
        }
    }

    /// Detect the shape from the first row, like the site's own layout does.
    pub fn detect(rows: &[TableRow]) -> Result<Self, StructureError> {
        let first = rows.first().ok_or(StructureError::Empty)?;
        Self::from_width(first.width())
    }

    /// Project a loosely shaped row onto the fixed column roles.
    pub fn project(self, row: &TableRow) -> MeetingRow {
        let (recording, doc_set) = match self {
            TableShape::SixColumn => (None, row.cell(5).clone()),
            TableShape::SevenColumn => (Some(row.cell(5).clone()), row.cell(6).clone()),
        };
        MeetingRow {
            name: row.cell(0).clone(),
            date: row.cell(1).clone(),
            time: row.cell(2).clone(),
            agenda: row.cell(3).clone(),
            minutes: row.cell(4).clone(),
            recording,
            doc_set,
        }
    }
}

/// A meeting table row with its columns addressed by role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRow {
    pub name: Cell,
    pub date: Cell,
    pub time: Cell,
    pub agenda: Cell,
    pub minutes: Cell,
    /// Only present in seven-column tables.
    pub recording: Option<Cell>,
    pub doc_set: Cell,
}

impl MeetingRow {
    pub fn document(&self, role: DocumentRole) -> &Cell {
        match role {
            DocumentRole::Agenda => &self.agenda,
            DocumentRole::Minutes => &self.minutes,
        }
    }
}
