//! Parsing of HTML directory listings.
//!
//! Two table layouts are understood: the `directory-listing-table` class and
//! the `#list` id. Column positions come from the header row when it names
//! them, otherwise from fixed offsets.

use scraper::{ElementRef, Html, Selector};

use crate::size;

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub name: String,
    pub link: String,
    pub size_str: String,
    pub size_bytes: u64,
}

const LISTING_CLASS: &str = "directory-listing-table";
const LISTING_ID: &str = "list";
const FALLBACK_SIZE_COLUMN: usize = 2;

pub fn parse_listing(html: &str) -> Vec<ListingRow> {
    let document = Html::parse_document(html);
    parse_document(&document).unwrap_or_default()
}

fn parse_document(document: &Html) -> Option<Vec<ListingRow>> {
    let table_sel = Selector::parse("table").ok()?;
    let header_sel = Selector::parse("th").ok()?;
    let row_sel = Selector::parse("tbody tr").ok()?;
    let cell_sel = Selector::parse("td").ok()?;
    let link_sel = Selector::parse("a").ok()?;

    let table = document.select(&table_sel).find(|table| {
        let element = table.value();
        element.classes().any(|class| class == LISTING_CLASS) || element.id() == Some(LISTING_ID)
    })?;

    let headers: Vec<String> =
        table.select(&header_sel).map(|th| cell_text(&th).to_lowercase()).collect();
    let name_idx = headers.iter().position(|h| h.contains("name")).unwrap_or(0);
    let size_idx = headers.iter().position(|h| h.contains("size"));

    let mut rows = Vec::new();
    for tr in table.select(&row_sel) {
        let cells: Vec<ElementRef> = tr.select(&cell_sel).collect();
        let Some(name_cell) = cells.get(name_idx) else {
            continue;
        };
        let Some(anchor) = name_cell.select(&link_sel).next() else {
            continue;
        };
        let name = cell_text(&anchor);
        if name.to_lowercase().contains("parent directory") {
            continue;
        }
        let Some(link) = anchor.value().attr("href") else {
            continue;
        };

        let size_str = size_cell(&cells, size_idx).map(|cell| cell_text(&cell)).unwrap_or_default();
        rows.push(ListingRow {
            size_bytes: size::parse(&size_str),
            name,
            link: link.to_string(),
            size_str,
        });
    }
    Some(rows)
}

/// Header label first, then a cell classed `size`, then the fixed offset.
fn size_cell<'a>(cells: &[ElementRef<'a>], size_idx: Option<usize>) -> Option<ElementRef<'a>> {
    if let Some(idx) = size_idx {
        return cells.get(idx).copied();
    }
    cells
        .iter()
        .find(|cell| cell.value().classes().any(|class| class == "size"))
        .or_else(|| cells.get(FALLBACK_SIZE_COLUMN))
        .copied()
}

fn cell_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
