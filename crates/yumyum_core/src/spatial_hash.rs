use yumyum_data::Entity;

#[derive(Clone, Debug, Default)]
/// Uniform-grid spatial index over entity positions.
///
/// Rebuilt from scratch whenever the pipeline needs a fresh view; there is no
/// incremental maintenance. Storage uses the "offset array" layout (like
/// compressed sparse rows): `cell_offsets[i]..cell_offsets[i+1]` indexes the
/// slice of `entity_indices` that belongs to cell `i`.
///
/// Queries are expressed in cells, not pixels: a query of radius `r` returns
/// everything stored in the `(2r+1)²` cells centred on the query cell.
///
/// # Examples
/// ```
/// use yumyum_core::spatial_hash::SpatialHash;
///
/// let mut spatial = SpatialHash::new(120.0, 1200, 800);
/// spatial.build_positions(&[(10.0, 10.0), (130.0, 10.0), (900.0, 700.0)]);
///
/// let mut nearby = Vec::new();
/// spatial.query_into(10.0, 10.0, 1, &mut nearby);
/// assert_eq!(nearby.len(), 2);
/// ```
pub struct SpatialHash {
    pub cell_size: f64,
    pub width: u16,
    pub height: u16,
    pub cols: usize,
    pub rows: usize,
    pub cell_offsets: Vec<usize>,
    pub entity_indices: Vec<usize>,
}

impl SpatialHash {
    pub fn new(cell_size: f64, width: u16, height: u16) -> Self {
        let cols = (f64::from(width) / cell_size).ceil().max(1.0) as usize;
        let rows = (f64::from(height) / cell_size).ceil().max(1.0) as usize;
        Self {
            cell_size,
            width,
            height,
            cols,
            rows,
            cell_offsets: vec![0; cols * rows + 1],
            entity_indices: Vec::new(),
        }
    }

    /// Floored cell coordinates of a point. Not clipped to the field.
    #[inline]
    pub fn cell_coords(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some((
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        ))
    }

    /// Flat index of the cell containing `(x, y)`, or `None` outside the field.
    #[inline]
    pub fn get_cell_idx(&self, x: f64, y: f64) -> Option<usize> {
        let (cx, cy) = self.cell_coords(x, y)?;
        if cx < 0 || cx >= self.cols as i64 || cy < 0 || cy >= self.rows as i64 {
            None
        } else {
            Some((cy as usize * self.cols) + cx as usize)
        }
    }

    /// Indexes every live entity; indices refer to positions in `entities`.
    pub fn build(&mut self, entities: &[Entity]) {
        self.build_from(entities.iter().map(|e| {
            if e.is_live() {
                Some((e.physics.x, e.physics.y))
            } else {
                None
            }
        }));
    }

    /// Indexes raw points; indices refer to positions in `positions`.
    pub fn build_positions(&mut self, positions: &[(f64, f64)]) {
        self.build_from(positions.iter().map(|&p| Some(p)));
    }

    fn build_from<I>(&mut self, points: I)
    where
        I: Iterator<Item = Option<(f64, f64)>> + Clone,
    {
        let cell_count = self.cols * self.rows;
        let mut counts = vec![0usize; cell_count];
        let mut indexed = 0;
        for (x, y) in points.clone().flatten() {
            if let Some(idx) = self.get_cell_idx(x, y) {
                counts[idx] += 1;
                indexed += 1;
            }
        }

        self.cell_offsets.resize(cell_count + 1, 0);
        let mut total = 0;
        for (i, &count) in counts.iter().enumerate() {
            self.cell_offsets[i] = total;
            total += count;
        }
        self.cell_offsets[cell_count] = total;

        self.entity_indices.clear();
        self.entity_indices.resize(indexed, 0);
        let mut cursor = self.cell_offsets[..cell_count].to_vec();
        for (entity_idx, point) in points.enumerate() {
            let Some((x, y)) = point else { continue };
            if let Some(cell_idx) = self.get_cell_idx(x, y) {
                self.entity_indices[cursor[cell_idx]] = entity_idx;
                cursor[cell_idx] += 1;
            }
        }
    }

    /// Number of indexed entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entity_indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entity_indices.is_empty()
    }

    /// Visits every entity stored within `radius_cells` cells of `(x, y)`.
    ///
    /// Each entity lives in exactly one cell, so every index is visited once.
    pub fn query_callback<F>(&self, x: f64, y: f64, radius_cells: u32, mut callback: F)
    where
        F: FnMut(usize),
    {
        let Some((cx, cy)) = self.cell_coords(x, y) else {
            return;
        };
        let r = i64::from(radius_cells);
        let min_cx = (cx - r).max(0);
        let max_cx = (cx + r).min(self.cols as i64 - 1);
        let min_cy = (cy - r).max(0);
        let max_cy = (cy + r).min(self.rows as i64 - 1);

        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                let cell_idx = (cy as usize * self.cols) + cx as usize;
                let start = self.cell_offsets[cell_idx];
                let end = self.cell_offsets[cell_idx + 1];

                for &entity_idx in &self.entity_indices[start..end] {
                    callback(entity_idx);
                }
            }
        }
    }

    #[inline]
    pub fn query_into(&self, x: f64, y: f64, radius_cells: u32, result: &mut Vec<usize>) {
        result.clear();
        self.query_callback(x, y, radius_cells, |idx| result.push(idx));
    }

    pub fn count_nearby(&self, x: f64, y: f64, radius_cells: u32) -> usize {
        let mut count = 0;
        self.query_callback(x, y, radius_cells, |_| count += 1);
        count
    }
}
