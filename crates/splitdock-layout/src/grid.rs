//! Grid-to-tree conversion.
//!
//! A [`SplitDockGrid`] collects rectangles of stacked elements plus optional
//! dividing-line hints and folds them into a [`SplitDockTree`] by greedily
//! merging the cheapest pair until one piece is left. The cost of a pair is
//! the dead space of its bounding box plus a penalty for every hint line the
//! box would cut through. Well-aligned input comes out exactly; overlapping
//! or ragged input still yields a tree.
//!
//! Ties between pairs of equal cost go to the first pair in `(i, j)` order.

use rustc_hash::{FxHashMap, FxHashSet};
use splitdock_core::{DockableId, Rect};
use tracing::trace;

use crate::config::GridConfig;
use crate::error::SplitDockError;
use crate::interchange::{BuildContext, Key, SplitDockTree};
use crate::tree::Orientation;

const EDGE_EPSILON: f64 = 1e-9;

/// A dividing-line hint, in grid units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridLine {
    /// Vertical line at `x`, spanning `start..end` along y.
    Vertical { x: f64, start: f64, end: f64 },
    /// Horizontal line at `y`, spanning `start..end` along x.
    Horizontal { y: f64, start: f64, end: f64 },
}

impl GridLine {
    /// The line cuts through the interior of `rect`.
    fn crosses(&self, rect: &Rect) -> bool {
        match *self {
            Self::Vertical { x, start, end } => {
                x > rect.x + EDGE_EPSILON
                    && x < rect.right() - EDGE_EPSILON
                    && start < rect.bottom()
                    && end > rect.y
            }
            Self::Horizontal { y, start, end } => {
                y > rect.y + EDGE_EPSILON
                    && y < rect.bottom() - EDGE_EPSILON
                    && start < rect.right()
                    && end > rect.x
            }
        }
    }

    /// The line runs exactly along the edge where `a` and `b` touch.
    fn separates(&self, a: &Rect, b: &Rect) -> bool {
        let touching = |near: f64, far: f64, at: f64| {
            (near - at).abs() < EDGE_EPSILON && (far - at).abs() < EDGE_EPSILON
        };
        match *self {
            Self::Vertical { x, .. } => touching(a.right(), b.x, x) || touching(b.right(), a.x, x),
            Self::Horizontal { y, .. } => {
                touching(a.bottom(), b.y, y) || touching(b.bottom(), a.y, y)
            }
        }
    }

    /// Normalized position inside `bounds` if this line can serve as the
    /// divider of a split with `orientation`.
    fn divider_in(&self, orientation: Orientation, bounds: &Rect) -> Option<f64> {
        match (*self, orientation) {
            (Self::Vertical { x, .. }, Orientation::Horizontal) if self.crosses(bounds) => {
                Some((x - bounds.x) / bounds.width)
            }
            (Self::Horizontal { y, .. }, Orientation::Vertical) if self.crosses(bounds) => {
                Some((y - bounds.y) / bounds.height)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct GridCell {
    bounds: Rect,
    elements: Vec<DockableId>,
    selected: Option<DockableId>,
}

#[derive(Debug, Clone)]
enum Cluster {
    Cell(usize),
    Merge {
        orientation: Orientation,
        divider: f64,
        first: Box<Cluster>,
        second: Box<Cluster>,
    },
}

#[derive(Debug, Clone)]
struct Piece {
    bounds: Rect,
    /// Area covered by the cells inside, not by the bounding box.
    covered: f64,
    cluster: Cluster,
}

/// Rectangles of elements to be turned into a split layout.
#[derive(Debug, Clone, Default)]
pub struct SplitDockGrid {
    cells: Vec<GridCell>,
    lines: Vec<GridLine>,
    used: FxHashSet<DockableId>,
}

impl SplitDockGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from a character picture.
    ///
    /// Each character found in `elements` becomes one rectangle: the bounding
    /// box of all its occurrences, one unit per column and row. Other
    /// characters are ignored.
    ///
    /// ```
    /// # use rustc_hash::FxHashMap;
    /// # use splitdock_core::{MemoryHost, Size};
    /// # use splitdock_layout::SplitDockGrid;
    /// let mut host = MemoryHost::new();
    /// let (a, b) = (host.add_element(Size::ZERO), host.add_element(Size::ZERO));
    /// let mut elements = FxHashMap::default();
    /// elements.insert('a', vec![a]);
    /// elements.insert('b', vec![b]);
    /// let grid = SplitDockGrid::from_layout("aab\naab", &elements).unwrap();
    /// assert_eq!(grid.len(), 2);
    /// ```
    pub fn from_layout(
        layout: &str,
        elements: &FxHashMap<char, Vec<DockableId>>,
    ) -> Result<Self, SplitDockError> {
        // (symbol, min column, min row, max column, max row) in scan order
        let mut regions: Vec<(char, usize, usize, usize, usize)> = Vec::new();
        for (row, line) in layout.lines().enumerate() {
            for (column, symbol) in line.chars().enumerate() {
                if !elements.contains_key(&symbol) {
                    continue;
                }
                match regions.iter_mut().find(|region| region.0 == symbol) {
                    Some(region) => {
                        region.1 = region.1.min(column);
                        region.2 = region.2.min(row);
                        region.3 = region.3.max(column);
                        region.4 = region.4.max(row);
                    }
                    None => regions.push((symbol, column, row, column, row)),
                }
            }
        }

        let mut grid = Self::new();
        for (symbol, left, top, right, bottom) in regions {
            let Some(stack) = elements.get(&symbol) else {
                continue;
            };
            grid.add_rectangle(
                left as f64,
                top as f64,
                (right - left + 1) as f64,
                (bottom - top + 1) as f64,
                stack,
            )?;
        }
        Ok(grid)
    }

    /// Number of distinct rectangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Add `elements` at the given rectangle. Elements added to a rectangle
    /// identical to an existing one are stacked onto it.
    pub fn add_rectangle(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        elements: &[DockableId],
    ) -> Result<(), SplitDockError> {
        let bounds = Rect::new(x, y, width, height);
        if !bounds.is_finite() || bounds.is_empty() {
            return Err(SplitDockError::DegenerateRectangle { width, height });
        }
        if elements.is_empty() {
            return Err(SplitDockError::EmptyElements);
        }
        let mut seen = FxHashSet::default();
        for element in elements {
            if self.used.contains(element) || !seen.insert(*element) {
                return Err(SplitDockError::DuplicateElement { element: *element });
            }
        }
        self.used.extend(seen);

        match self.cells.iter_mut().find(|cell| cell.bounds == bounds) {
            Some(cell) => cell.elements.extend_from_slice(elements),
            None => self.cells.push(GridCell {
                bounds,
                elements: elements.to_vec(),
                selected: None,
            }),
        }
        Ok(())
    }

    /// Mark `element` as the visible element of the rectangle at the given
    /// position.
    pub fn set_selected(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        element: DockableId,
    ) -> Result<(), SplitDockError> {
        let bounds = Rect::new(x, y, width, height);
        let cell = self
            .cells
            .iter_mut()
            .find(|cell| cell.bounds == bounds && cell.elements.contains(&element))
            .ok_or(SplitDockError::UnknownElement { element })?;
        cell.selected = Some(element);
        Ok(())
    }

    /// Hint a vertical dividing line at `x` from `y1` to `y2`.
    pub fn add_vertical_divider(&mut self, x: f64, y1: f64, y2: f64) -> Result<(), SplitDockError> {
        let (start, end) = check_line(x, y1, y2)?;
        self.lines.push(GridLine::Vertical { x, start, end });
        Ok(())
    }

    /// Hint a horizontal dividing line at `y` from `x1` to `x2`.
    pub fn add_horizontal_divider(
        &mut self,
        x1: f64,
        x2: f64,
        y: f64,
    ) -> Result<(), SplitDockError> {
        let (start, end) = check_line(y, x1, x2)?;
        self.lines.push(GridLine::Horizontal { y, start, end });
        Ok(())
    }

    /// Hint lines added so far.
    #[must_use]
    pub fn lines(&self) -> &[GridLine] {
        &self.lines
    }

    /// Convert with the default [`GridConfig`].
    pub fn to_tree(&self) -> Result<SplitDockTree, SplitDockError> {
        self.to_tree_with(&GridConfig::default())
    }

    /// Fold all rectangles into one tree. An empty grid yields a tree without
    /// root.
    pub fn to_tree_with(&self, config: &GridConfig) -> Result<SplitDockTree, SplitDockError> {
        let mut pieces: Vec<Piece> = self
            .cells
            .iter()
            .enumerate()
            .map(|(index, cell)| Piece {
                bounds: cell.bounds,
                covered: cell.bounds.area(),
                cluster: Cluster::Cell(index),
            })
            .collect();

        while pieces.len() > 1 {
            let mut best: Option<(usize, usize, f64)> = None;
            for i in 0..pieces.len() {
                for j in (i + 1)..pieces.len() {
                    let cost = self.merge_cost(&pieces[i], &pieces[j], config);
                    if best.is_none_or(|(_, _, lowest)| cost < lowest) {
                        best = Some((i, j, cost));
                    }
                }
            }
            let Some((i, j, cost)) = best else {
                break;
            };
            let second = pieces.remove(j);
            let first = std::mem::replace(
                &mut pieces[i],
                Piece {
                    bounds: Rect::default(),
                    covered: 0.0,
                    cluster: Cluster::Cell(0),
                },
            );
            let merged = self.merge(first, second, config);
            if let Cluster::Merge {
                orientation,
                divider,
                ..
            } = &merged.cluster
            {
                trace!(first = i, second = j, cost, ?orientation, divider, "grid merge");
            }
            pieces[i] = merged;
        }

        let mut layout = SplitDockTree::new();
        if let Some(piece) = pieces.pop() {
            let mut context = BuildContext::new();
            let root = self.emit(&piece.cluster, &mut layout, &mut context)?;
            layout.root(root)?;
        }
        Ok(layout)
    }

    fn merge_cost(&self, a: &Piece, b: &Piece, config: &GridConfig) -> f64 {
        let bounds = a.bounds.union(&b.bounds);
        let area = bounds.area();
        let waste = if area > 0.0 {
            ((area - a.covered - b.covered) / area).max(0.0)
        } else {
            0.0
        };
        let violations = self
            .lines
            .iter()
            .filter(|line| {
                line.crosses(&bounds)
                    && !line.crosses(&a.bounds)
                    && !line.crosses(&b.bounds)
                    && !line.separates(&a.bounds, &b.bounds)
            })
            .count();
        waste + violations as f64 * config.line_penalty
    }

    fn merge(&self, a: Piece, b: Piece, config: &GridConfig) -> Piece {
        let bounds = a.bounds.union(&b.bounds);
        let (ax, ay) = a.bounds.center();
        let (bx, by) = b.bounds.center();
        let orientation = if (ax - bx).abs() > (ay - by).abs() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };

        let (first, second, midpoint) = match orientation {
            Orientation::Horizontal => {
                let (first, second) = if (b.bounds.x, bx) < (a.bounds.x, ax) {
                    (b, a)
                } else {
                    (a, b)
                };
                let edge = (first.bounds.right() + second.bounds.x) / 2.0;
                let midpoint = (edge - bounds.x) / bounds.width;
                (first, second, midpoint)
            }
            Orientation::Vertical => {
                let (first, second) = if (b.bounds.y, by) < (a.bounds.y, ay) {
                    (b, a)
                } else {
                    (a, b)
                };
                let edge = (first.bounds.bottom() + second.bounds.y) / 2.0;
                let midpoint = (edge - bounds.y) / bounds.height;
                (first, second, midpoint)
            }
        };
        let midpoint = if midpoint.is_finite() {
            midpoint.clamp(0.0, 1.0)
        } else {
            0.5
        };

        let snapped = self
            .lines
            .iter()
            .filter_map(|line| line.divider_in(orientation, &bounds))
            .map(|position| (position, (position - midpoint).abs()))
            .filter(|(_, distance)| *distance <= config.line_snap_threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(position, _)| position);

        Piece {
            bounds,
            covered: first.covered + second.covered,
            cluster: Cluster::Merge {
                orientation,
                divider: snapped.unwrap_or(midpoint),
                first: Box::new(first.cluster),
                second: Box::new(second.cluster),
            },
        }
    }

    fn emit(
        &self,
        cluster: &Cluster,
        layout: &mut SplitDockTree,
        context: &mut BuildContext,
    ) -> Result<Key, SplitDockError> {
        match cluster {
            Cluster::Cell(index) => {
                let cell = self
                    .cells
                    .get(*index)
                    .ok_or(SplitDockError::EmptyElements)?;
                layout.leaf(context, &cell.elements, cell.selected)
            }
            Cluster::Merge {
                orientation,
                divider,
                first,
                second,
            } => {
                let first = self.emit(first, layout, context)?;
                let second = self.emit(second, layout, context)?;
                layout.node(*orientation, first, second, *divider, None)
            }
        }
    }
}

fn check_line(at: f64, start: f64, end: f64) -> Result<(f64, f64), SplitDockError> {
    if at.is_finite() && start.is_finite() && end.is_finite() && end > start {
        Ok((start, end))
    } else {
        Err(SplitDockError::DegenerateLine { start, end })
    }
}
