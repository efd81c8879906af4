//! FILENAME: pivot-engine/src/materialize.rs
//! Materialization - turns the compute service reply into dense pages.
//!
//! No aggregation happens here; the compute service already grouped and
//! aggregated upstream. This module re-assembles its sparse reply into
//! addressable structures, per page:
//! 1. Index every label position over the full tuple set
//! 2. Flatten each tuple's ordinals into (row, col) via mixed-radix
//!    most-significant-first encoding and write the measure into a dense grid
//! 3. Project each subtotal chunk into a flattened overlay per depth
//! 4. Wire the page-label values and page summaries into the final PageSet
//!
//! Every run builds entirely new pages; callers swap the result in
//! atomically, so a half-written grid is never observable.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::definition::PivotSchema;
use crate::index::{index_labels, LabelDimension};
use crate::value::{DataValue, RawTuple};
use crate::view::{Page, PageSet, PivotGrid, SummaryOverlay};

// ============================================================================
// COMPUTE SERVICE REPLY
// ============================================================================

/// A partial-dimension subtotal: the leading label values of one axis
/// plus the aggregate computed for that group. `labels.len()` is the
/// depth of the subtotal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTuple {
    pub labels: SmallVec<[DataValue; 2]>,
    pub aggregate: DataValue,
}

impl SummaryTuple {
    pub fn new(labels: impl IntoIterator<Item = DataValue>, aggregate: DataValue) -> Self {
        SummaryTuple {
            labels: labels.into_iter().collect(),
            aggregate,
        }
    }
}

/// The reply of the Pivot Compute Service, exactly the input to
/// [`assemble_pages`].
///
/// Summary chunks arrive as one flat stream per axis with a fixed stride:
/// an axis with N label fields carries exactly N chunks per page, ordered
/// deepest (depth N) first within each page slice. That ordering and the
/// stride are part of the upstream contract and are validated before any
/// offset is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotResponse {
    pub schema: PivotSchema,

    /// Ungrouped tuples, one group per page, in page order.
    pub pages: Vec<Vec<RawTuple>>,

    pub row_summaries: Vec<Vec<SummaryTuple>>,
    pub column_summaries: Vec<Vec<SummaryTuple>>,

    /// One aggregate per page.
    pub page_summaries: Vec<DataValue>,

    /// The page-label value behind each page; empty when the schema has
    /// no page label (single-page reply).
    pub page_label_values: Vec<DataValue>,

    pub table_summary: DataValue,
}

// ============================================================================
// ERRORS
// ============================================================================

/// Axis a contract violation was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Row,
    Column,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Axis::Row => "row",
            Axis::Column => "column",
        })
    }
}

/// A malformed compute reply. These are upstream contract violations,
/// not user errors: the label index is always built from the full tuple
/// set before offsets are computed, so a failure here means the reply
/// itself is inconsistent. A run that hits one fails as a whole and must
/// not leave a partial result behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaterializeError {
    #[error("tuple carries {found} values, expected {expected} (row labels + column labels + measure)")]
    TupleArity { expected: usize, found: usize },

    #[error("{axis} axis carries {found} summary chunks, expected {expected}")]
    ChunkCount {
        axis: Axis,
        expected: usize,
        found: usize,
    },

    #[error("summary tuple at depth {depth} carries {found} label values")]
    SummaryArity { depth: usize, found: usize },

    #[error("label value '{value}' was never indexed in {axis} dimension {dimension}")]
    UnknownLabel {
        axis: Axis,
        dimension: usize,
        value: String,
    },

    #[error("{found} page summaries for {expected} pages")]
    PageSummaryCount { expected: usize, found: usize },

    #[error("{found} page label values for {expected} pages")]
    PageLabelCount { expected: usize, found: usize },
}

// ============================================================================
// MIXED-RADIX FLATTENING
// ============================================================================

type Strides = SmallVec<[usize; 4]>;

/// Place value of each of the first `depth` dimensions, most significant
/// first: `stride[i] = Π cardinality(dims[i+1 .. depth])`.
fn strides(dims: &[LabelDimension], depth: usize) -> Strides {
    (0..depth)
        .map(|position| {
            dims[position + 1..depth]
                .iter()
                .map(LabelDimension::cardinality)
                .product()
        })
        .collect()
}

/// Flattens leading label values into one offset. `values` and `strides`
/// must be the same length.
fn flat_offset(
    dims: &[LabelDimension],
    strides: &[usize],
    values: &[DataValue],
    axis: Axis,
) -> Result<usize, MaterializeError> {
    let mut offset = 0;
    for (dimension, value) in values.iter().enumerate() {
        let ordinal =
            dims[dimension]
                .ordinal(value)
                .ok_or_else(|| MaterializeError::UnknownLabel {
                    axis,
                    dimension,
                    value: value.to_string(),
                })?;
        offset += ordinal * strides[dimension];
    }
    Ok(offset)
}

fn cardinality_product(dims: &[LabelDimension]) -> usize {
    dims.iter().map(LabelDimension::cardinality).product()
}

// ============================================================================
// GRID MATERIALIZER
// ============================================================================

/// Flattens one page's sparse tuples into a dense grid.
///
/// Tuples are assumed to address distinct cells; when two collide the
/// later one silently overwrites. Cells no tuple visits stay blank.
fn materialize_grid(
    tuples: &[RawTuple],
    row_dims: &[LabelDimension],
    column_dims: &[LabelDimension],
) -> Result<PivotGrid, MaterializeError> {
    let mut grid = PivotGrid::blank(cardinality_product(row_dims), cardinality_product(column_dims));

    let row_strides = strides(row_dims, row_dims.len());
    let column_strides = strides(column_dims, column_dims.len());
    let measure_index = row_dims.len() + column_dims.len();

    for tuple in tuples {
        let row = flat_offset(row_dims, &row_strides, &tuple[..row_dims.len()], Axis::Row)?;
        let column = flat_offset(
            column_dims,
            &column_strides,
            &tuple[row_dims.len()..measure_index],
            Axis::Column,
        )?;
        grid.set(row, column, tuple[measure_index].clone());
    }

    Ok(grid)
}

// ============================================================================
// SUBTOTAL PROJECTOR
// ============================================================================

/// Projects one axis's per-depth subtotal chunks into overlays.
///
/// `chunks` holds exactly `dims.len()` entries ordered deepest first, as
/// the compute service delivers them; the returned overlays are
/// re-ordered coarsest (depth 1) first for the view.
fn project_summaries(
    chunks: &[Vec<SummaryTuple>],
    dims: &[LabelDimension],
    axis: Axis,
) -> Result<Vec<SummaryOverlay>, MaterializeError> {
    let depth_count = dims.len();
    let mut overlays = Vec::with_capacity(depth_count);

    for (chunk_index, chunk) in chunks.iter().enumerate() {
        let depth = depth_count - chunk_index;
        let inner_cardinality = dims[depth - 1].cardinality();
        let outer_repeat = cardinality_product(&dims[..depth - 1]);

        let mut cells = vec![DataValue::Empty; inner_cardinality * outer_repeat];
        let depth_strides = strides(dims, depth);

        for summary in chunk {
            if summary.labels.len() != depth {
                return Err(MaterializeError::SummaryArity {
                    depth,
                    found: summary.labels.len(),
                });
            }
            let offset = flat_offset(dims, &depth_strides, &summary.labels, axis)?;
            cells[offset] = summary.aggregate.clone();
        }

        overlays.push(SummaryOverlay { depth, cells });
    }

    overlays.reverse();
    Ok(overlays)
}

// ============================================================================
// PAGE ASSEMBLER
// ============================================================================

fn assemble_page(
    tuples: &[RawTuple],
    row_chunks: &[Vec<SummaryTuple>],
    column_chunks: &[Vec<SummaryTuple>],
    row_label_count: usize,
    column_label_count: usize,
    page_summary: DataValue,
) -> Result<Page, MaterializeError> {
    // Arity first: the indexer must only ever see well-formed tuples.
    let width = row_label_count + column_label_count + 1;
    if let Some(bad) = tuples.iter().find(|tuple| tuple.len() != width) {
        return Err(MaterializeError::TupleArity {
            expected: width,
            found: bad.len(),
        });
    }

    let (row_dims, column_dims) = index_labels(tuples, row_label_count, column_label_count);

    let grid = materialize_grid(tuples, &row_dims, &column_dims)?;
    let row_summaries = project_summaries(row_chunks, &row_dims, Axis::Row)?;
    let column_summaries = project_summaries(column_chunks, &column_dims, Axis::Column)?;

    Ok(Page {
        row_labels: row_dims,
        column_labels: column_dims,
        grid,
        row_summaries,
        column_summaries,
        page_summary,
    })
}

/// Splits the full reply into one page per page-label value and runs the
/// indexer, grid materializer and subtotal projector on each slice.
///
/// The summary streams are sliced with a fixed stride: `itemsPerPage` =
/// number of label fields on the summarized axis. Stream shapes are
/// validated up front so an inconsistent reply fails before any page is
/// built. On success the first page is selected; an empty reply yields
/// the empty default with no selection.
pub fn assemble_pages(response: &PivotResponse) -> Result<PageSet, MaterializeError> {
    let page_count = response.pages.len();
    let row_label_count = response.schema.row_label_count();
    let column_label_count = response.schema.column_label_count();

    let expected_row_chunks = row_label_count * page_count;
    if response.row_summaries.len() != expected_row_chunks {
        return Err(MaterializeError::ChunkCount {
            axis: Axis::Row,
            expected: expected_row_chunks,
            found: response.row_summaries.len(),
        });
    }
    let expected_column_chunks = column_label_count * page_count;
    if response.column_summaries.len() != expected_column_chunks {
        return Err(MaterializeError::ChunkCount {
            axis: Axis::Column,
            expected: expected_column_chunks,
            found: response.column_summaries.len(),
        });
    }
    if response.page_summaries.len() != page_count {
        return Err(MaterializeError::PageSummaryCount {
            expected: page_count,
            found: response.page_summaries.len(),
        });
    }
    if !response.page_label_values.is_empty() && response.page_label_values.len() != page_count {
        return Err(MaterializeError::PageLabelCount {
            expected: page_count,
            found: response.page_label_values.len(),
        });
    }

    let mut pages = Vec::with_capacity(page_count);
    for (page_index, tuples) in response.pages.iter().enumerate() {
        let row_start = row_label_count * page_index;
        let column_start = column_label_count * page_index;
        let page = assemble_page(
            tuples,
            &response.row_summaries[row_start..row_start + row_label_count],
            &response.column_summaries[column_start..column_start + column_label_count],
            row_label_count,
            column_label_count,
            response.page_summaries[page_index].clone(),
        )?;
        pages.push(page);
    }

    Ok(PageSet {
        selected: if pages.is_empty() { -1 } else { 0 },
        pages,
        page_labels: response.page_label_values.clone(),
        table_summary: response.table_summary.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> DataValue {
        DataValue::text(s)
    }

    fn num(n: f64) -> DataValue {
        DataValue::number(n)
    }

    fn schema(row_labels: &[&str], column_labels: &[&str]) -> PivotSchema {
        PivotSchema {
            row_labels: row_labels.iter().map(|s| s.to_string()).collect(),
            column_labels: column_labels.iter().map(|s| s.to_string()).collect(),
            ..PivotSchema::new("sales")
        }
    }

    /// Single-page reply without a page label.
    fn single_page_response(
        schema: PivotSchema,
        tuples: Vec<RawTuple>,
        row_summaries: Vec<Vec<SummaryTuple>>,
        column_summaries: Vec<Vec<SummaryTuple>>,
    ) -> PivotResponse {
        PivotResponse {
            schema,
            pages: vec![tuples],
            row_summaries,
            column_summaries,
            page_summaries: vec![num(65.0)],
            page_label_values: Vec::new(),
            table_summary: num(65.0),
        }
    }

    fn region_quarter_response() -> PivotResponse {
        single_page_response(
            schema(&["Region"], &["Quarter"]),
            vec![
                vec![text("West"), text("Q1"), num(10.0)],
                vec![text("West"), text("Q2"), num(20.0)],
                vec![text("East"), text("Q1"), num(5.0)],
            ],
            vec![vec![
                SummaryTuple::new([text("West")], num(30.0)),
                SummaryTuple::new([text("East")], num(5.0)),
            ]],
            vec![vec![
                SummaryTuple::new([text("Q1")], num(15.0)),
                SummaryTuple::new([text("Q2")], num(20.0)),
            ]],
        )
    }

    #[test]
    fn test_region_quarter_grid() {
        let pages = assemble_pages(&region_quarter_response()).unwrap();
        assert_eq!(pages.pages.len(), 1);
        assert_eq!(pages.selected, 0);

        let page = &pages.pages[0];
        assert_eq!(page.grid.row_count(), 2);
        assert_eq!(page.grid.column_count(), 2);
        assert_eq!(page.grid.get(0, 0), Some(&num(10.0)));
        assert_eq!(page.grid.get(0, 1), Some(&num(20.0)));
        assert_eq!(page.grid.get(1, 0), Some(&num(5.0)));
        // (East, Q2) was never delivered and stays blank, not zero.
        assert_eq!(page.grid.get(1, 1), Some(&DataValue::Empty));
    }

    #[test]
    fn test_depth_one_row_overlay() {
        let pages = assemble_pages(&region_quarter_response()).unwrap();
        let page = &pages.pages[0];

        assert_eq!(page.row_summaries.len(), 1);
        assert_eq!(page.row_summaries[0].depth, 1);
        assert_eq!(page.row_summaries[0].cells, vec![num(30.0), num(5.0)]);
        assert_eq!(page.column_summaries[0].cells, vec![num(15.0), num(20.0)]);
    }

    #[test]
    fn test_flat_indices_round_trip() {
        // Two row dimensions (2 x 3) and one column dimension: every
        // non-blank cell must decode back to the labels that produced it.
        let regions = ["West", "East"];
        let products = ["Ale", "Bock", "Cider"];
        let quarters = ["Q1", "Q2"];

        let mut tuples = Vec::new();
        for (i, region) in regions.iter().enumerate() {
            for (j, product) in products.iter().enumerate() {
                for (k, quarter) in quarters.iter().enumerate() {
                    tuples.push(vec![
                        text(region),
                        text(product),
                        text(quarter),
                        num((i * 100 + j * 10 + k) as f64),
                    ]);
                }
            }
        }

        let response = single_page_response(
            schema(&["Region", "Product"], &["Quarter"]),
            tuples,
            vec![Vec::new(), Vec::new()],
            vec![Vec::new()],
        );
        let pages = assemble_pages(&response).unwrap();
        let page = &pages.pages[0];

        assert_eq!(page.grid.row_count(), 6);
        for (i, _) in regions.iter().enumerate() {
            for (j, _) in products.iter().enumerate() {
                for (k, _) in quarters.iter().enumerate() {
                    let flat_row = i * products.len() + j;
                    let expected = num((i * 100 + j * 10 + k) as f64);
                    assert_eq!(page.grid.get(flat_row, k), Some(&expected));
                }
            }
        }
    }

    #[test]
    fn test_overlay_sizes_per_depth() {
        // Row dims 2 x 3: depth-1 overlay has 2 cells, depth-2 has 6.
        let tuples = vec![
            vec![text("West"), text("Ale"), text("Q1"), num(1.0)],
            vec![text("West"), text("Bock"), text("Q1"), num(2.0)],
            vec![text("West"), text("Cider"), text("Q1"), num(3.0)],
            vec![text("East"), text("Ale"), text("Q1"), num(4.0)],
        ];
        let row_summaries = vec![
            // Deepest chunk first (depth 2).
            vec![
                SummaryTuple::new([text("West"), text("Bock")], num(2.0)),
                SummaryTuple::new([text("East"), text("Ale")], num(4.0)),
            ],
            vec![SummaryTuple::new([text("West")], num(6.0))],
        ];
        let response = single_page_response(
            schema(&["Region", "Product"], &["Quarter"]),
            tuples,
            row_summaries,
            vec![vec![SummaryTuple::new([text("Q1")], num(10.0))]],
        );

        let page = &assemble_pages(&response).unwrap().pages[0];
        assert_eq!(page.row_summaries.len(), 2);

        let depth1 = &page.row_summaries[0];
        assert_eq!(depth1.depth, 1);
        assert_eq!(depth1.cells, vec![num(6.0), DataValue::Empty]);

        let depth2 = &page.row_summaries[1];
        assert_eq!(depth2.depth, 2);
        assert_eq!(depth2.cells.len(), 6);
        // (West, Bock) -> 0 * 3 + 1, (East, Ale) -> 1 * 3 + 0.
        assert_eq!(depth2.cells[1], num(2.0));
        assert_eq!(depth2.cells[3], num(4.0));
        assert!(depth2.cells[0].is_blank());
    }

    #[test]
    fn test_empty_row_label_set_degenerates_to_one_row() {
        let response = single_page_response(
            schema(&[], &["Quarter"]),
            vec![
                vec![text("Q1"), num(15.0)],
                vec![text("Q2"), num(20.0)],
            ],
            Vec::new(),
            vec![vec![SummaryTuple::new([text("Q1")], num(15.0))]],
        );

        let page = &assemble_pages(&response).unwrap().pages[0];
        assert_eq!(page.grid.row_count(), 1);
        assert_eq!(page.grid.column_count(), 2);
        assert_eq!(page.grid.get(0, 1), Some(&num(20.0)));
        assert!(page.row_summaries.is_empty());
    }

    #[test]
    fn test_colliding_tuples_overwrite() {
        let response = single_page_response(
            schema(&["Region"], &["Quarter"]),
            vec![
                vec![text("West"), text("Q1"), num(1.0)],
                vec![text("West"), text("Q1"), num(2.0)],
            ],
            vec![Vec::new()],
            vec![Vec::new()],
        );
        let page = &assemble_pages(&response).unwrap().pages[0];
        assert_eq!(page.grid.get(0, 0), Some(&num(2.0)));
    }

    #[test]
    fn test_multi_page_assembly() {
        let mut response = PivotResponse {
            schema: schema(&["Region"], &["Quarter"]),
            pages: vec![
                vec![vec![text("West"), text("Q1"), num(10.0)]],
                vec![vec![text("East"), text("Q2"), num(7.0)]],
            ],
            row_summaries: vec![
                vec![SummaryTuple::new([text("West")], num(10.0))],
                vec![SummaryTuple::new([text("East")], num(7.0))],
            ],
            column_summaries: vec![
                vec![SummaryTuple::new([text("Q1")], num(10.0))],
                vec![SummaryTuple::new([text("Q2")], num(7.0))],
            ],
            page_summaries: vec![num(10.0), num(7.0)],
            page_label_values: vec![text("2023"), text("2024")],
            table_summary: num(17.0),
        };

        let pages = assemble_pages(&response).unwrap();
        assert_eq!(pages.pages.len(), 2);
        assert_eq!(pages.selected, 0);
        assert_eq!(pages.page_labels, vec![text("2023"), text("2024")]);
        assert_eq!(pages.pages[1].page_summary, num(7.0));
        assert_eq!(pages.pages[1].grid.get(0, 0), Some(&num(7.0)));

        // Each page indexes its own labels independently.
        assert_eq!(pages.pages[1].row_labels[0].values(), &[text("East")]);

        // Dropping one page's chunk breaks the fixed-stride contract.
        response.row_summaries.pop();
        assert_eq!(
            assemble_pages(&response),
            Err(MaterializeError::ChunkCount {
                axis: Axis::Row,
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn test_empty_reply_selects_nothing() {
        let response = PivotResponse {
            schema: schema(&["Region"], &["Quarter"]),
            pages: Vec::new(),
            row_summaries: Vec::new(),
            column_summaries: Vec::new(),
            page_summaries: Vec::new(),
            page_label_values: Vec::new(),
            table_summary: DataValue::Empty,
        };
        let pages = assemble_pages(&response).unwrap();
        assert!(pages.is_empty());
        assert_eq!(pages.selected, -1);
    }

    #[test]
    fn test_tuple_arity_is_rejected() {
        let response = single_page_response(
            schema(&["Region"], &["Quarter"]),
            vec![vec![text("West"), num(10.0)]],
            vec![Vec::new()],
            vec![Vec::new()],
        );
        assert_eq!(
            assemble_pages(&response),
            Err(MaterializeError::TupleArity {
                expected: 3,
                found: 2,
            })
        );
    }

    #[test]
    fn test_unknown_summary_label_is_rejected() {
        let response = single_page_response(
            schema(&["Region"], &["Quarter"]),
            vec![vec![text("West"), text("Q1"), num(10.0)]],
            vec![vec![SummaryTuple::new([text("North")], num(3.0))]],
            vec![Vec::new()],
        );
        assert_eq!(
            assemble_pages(&response),
            Err(MaterializeError::UnknownLabel {
                axis: Axis::Row,
                dimension: 0,
                value: "North".to_string(),
            })
        );
    }

    #[test]
    fn test_summary_arity_is_rejected() {
        let response = single_page_response(
            schema(&["Region"], &["Quarter"]),
            vec![vec![text("West"), text("Q1"), num(10.0)]],
            vec![vec![SummaryTuple::new(
                [text("West"), text("Q1")],
                num(3.0),
            )]],
            vec![Vec::new()],
        );
        assert_eq!(
            assemble_pages(&response),
            Err(MaterializeError::SummaryArity {
                depth: 1,
                found: 2,
            })
        );
    }

    #[test]
    fn test_page_summary_count_is_rejected() {
        let mut response = region_quarter_response();
        response.page_summaries.clear();
        assert_eq!(
            assemble_pages(&response),
            Err(MaterializeError::PageSummaryCount {
                expected: 1,
                found: 0,
            })
        );
    }

    #[test]
    fn test_page_label_count_is_rejected() {
        let mut response = region_quarter_response();
        response.page_label_values = vec![text("2023"), text("2024")];
        assert_eq!(
            assemble_pages(&response),
            Err(MaterializeError::PageLabelCount {
                expected: 1,
                found: 2,
            })
        );
    }
}
