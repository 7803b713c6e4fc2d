//! Point series and the per-point selection masks.
//!
//! `PointSeries` is the read-only output of upstream display mapping: parallel
//! columns of normalized position, marker size and resolved fill style. Point
//! indices are stable for the lifetime of a dataset. Columns are reference
//! counted so the render worker can hold the same arrays without copying.
//!
//! `MaskSet` is owned by the engine. Every mutation goes through a named
//! operation that keeps `masked[i] => !picked[i]`.

#[cfg(test)]
#[path = "series_test.rs"]
mod series_test;

use std::sync::Arc;

use crate::camera::Point;

/// Error returned when columns or masks disagree on the point count.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    #[error("column `{column}` has {actual} values, expected {expected}")]
    LengthMismatch { column: &'static str, expected: usize, actual: usize },
}

fn check_len(column: &'static str, expected: usize, actual: usize) -> Result<(), SeriesError> {
    if expected == actual {
        Ok(())
    } else {
        Err(SeriesError::LengthMismatch { column, expected, actual })
    }
}

/// Parallel per-point columns in data space.
#[derive(Debug, Clone)]
pub struct PointSeries {
    x: Arc<[f64]>,
    y: Arc<[f64]>,
    size: Arc<[f64]>,
    color: Arc<[String]>,
}

impl Default for PointSeries {
    fn default() -> Self {
        Self { x: Arc::from([]), y: Arc::from([]), size: Arc::from([]), color: Arc::from(Vec::new()) }
    }
}

impl PointSeries {
    /// Build a series from its columns.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::LengthMismatch`] when any column's length
    /// differs from `x`.
    pub fn new(
        x: impl Into<Arc<[f64]>>,
        y: impl Into<Arc<[f64]>>,
        size: impl Into<Arc<[f64]>>,
        color: impl Into<Arc<[String]>>,
    ) -> Result<Self, SeriesError> {
        let (x, y, size, color) = (x.into(), y.into(), size.into(), color.into());
        check_len("y", x.len(), y.len())?;
        check_len("size", x.len(), size.len())?;
        check_len("color", x.len(), color.len())?;
        Ok(Self { x, y, size, color })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Data-space position of point `i`.
    #[must_use]
    pub fn position(&self, i: usize) -> Option<Point> {
        Some(Point::new(*self.x.get(i)?, *self.y.get(i)?))
    }

    #[must_use]
    pub fn x(&self) -> &Arc<[f64]> {
        &self.x
    }

    #[must_use]
    pub fn y(&self) -> &Arc<[f64]> {
        &self.y
    }

    #[must_use]
    pub fn size(&self) -> &Arc<[f64]> {
        &self.size
    }

    #[must_use]
    pub fn color(&self) -> &Arc<[String]> {
        &self.color
    }

    /// Borrowed view used by the renderer and hit-test.
    #[must_use]
    pub fn view(&self) -> SeriesView<'_> {
        SeriesView { x: &self.x, y: &self.y, size: &self.size, color: &self.color }
    }
}

/// Borrowed columns. Indices past the shortest column are treated as absent.
#[derive(Debug, Clone, Copy)]
pub struct SeriesView<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub size: &'a [f64],
    pub color: &'a [String],
}

impl SeriesView<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len().min(self.y.len()).min(self.size.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn position(&self, i: usize) -> Option<Point> {
        Some(Point::new(*self.x.get(i)?, *self.y.get(i)?))
    }

    #[must_use]
    pub fn size_of(&self, i: usize) -> Option<f64> {
        self.size.get(i).copied()
    }

    #[must_use]
    pub fn color_of(&self, i: usize) -> Option<&str> {
        self.color.get(i).map(String::as_str)
    }
}

/// Borrowed masks. Missing entries read as unmasked, unpicked, unhighlighted.
#[derive(Debug, Clone, Copy)]
pub struct MaskView<'a> {
    pub masked: &'a [bool],
    pub picked: &'a [bool],
    pub highlighted: &'a [u8],
}

impl MaskView<'_> {
    #[must_use]
    pub fn is_masked(&self, i: usize) -> bool {
        self.masked.get(i).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn is_picked(&self, i: usize) -> bool {
        self.picked.get(i).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn highlight(&self, i: usize) -> u8 {
        self.highlighted.get(i).copied().unwrap_or(0)
    }
}

/// Masked, picked and highlight-group flags for every point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaskSet {
    masked: Vec<bool>,
    picked: Vec<bool>,
    highlighted: Vec<u8>,
}

impl MaskSet {
    /// All-clear masks for `n` points.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self { masked: vec![false; n], picked: vec![false; n], highlighted: vec![0; n] }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.picked.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.picked.is_empty()
    }

    #[must_use]
    pub fn view(&self) -> MaskView<'_> {
        MaskView { masked: &self.masked, picked: &self.picked, highlighted: &self.highlighted }
    }

    #[must_use]
    pub fn masked(&self) -> &[bool] {
        &self.masked
    }

    #[must_use]
    pub fn picked(&self) -> &[bool] {
        &self.picked
    }

    #[must_use]
    pub fn highlighted(&self) -> &[u8] {
        &self.highlighted
    }

    #[must_use]
    pub fn is_masked(&self, i: usize) -> bool {
        self.view().is_masked(i)
    }

    #[must_use]
    pub fn is_picked(&self, i: usize) -> bool {
        self.view().is_picked(i)
    }

    #[must_use]
    pub fn picked_count(&self) -> usize {
        self.picked.iter().filter(|p| **p).count()
    }

    #[must_use]
    pub fn masked_count(&self) -> usize {
        self.masked.iter().filter(|m| **m).count()
    }

    #[must_use]
    pub fn picked_indices(&self) -> Vec<usize> {
        self.picked
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.then_some(i))
            .collect()
    }

    // --- Selection ---

    /// Flip the picked flag of one unmasked point. Returns whether it changed.
    pub fn toggle_pick(&mut self, i: usize) -> bool {
        if self.is_masked(i) {
            return false;
        }
        match self.picked.get_mut(i) {
            Some(p) => {
                *p = !*p;
                true
            }
            None => false,
        }
    }

    /// Deselect everything. Returns whether anything was selected.
    pub fn clear_picked(&mut self) -> bool {
        let mut changed = false;
        for p in &mut self.picked {
            changed |= *p;
            *p = false;
        }
        changed
    }

    /// Select `indices`. Without `combine` the previous selection is replaced;
    /// with it the indices are added. Masked and out-of-range indices are
    /// ignored. Returns whether the selection changed.
    pub fn select<I>(&mut self, indices: I, combine: bool) -> bool
    where
        I: IntoIterator<Item = usize>,
    {
        let before = self.picked.clone();
        if !combine {
            self.picked.iter_mut().for_each(|p| *p = false);
        }
        for i in indices {
            if self.is_masked(i) {
                continue;
            }
            if let Some(p) = self.picked.get_mut(i) {
                *p = true;
            }
        }
        before != self.picked
    }

    // --- Masking ---

    /// Mask `indices`, deselecting them. Returns how many became masked.
    pub fn mask<I>(&mut self, indices: I) -> usize
    where
        I: IntoIterator<Item = usize>,
    {
        let mut newly = 0;
        for i in indices {
            let Some(m) = self.masked.get_mut(i) else {
                continue;
            };
            if !*m {
                *m = true;
                newly += 1;
            }
            if let Some(p) = self.picked.get_mut(i) {
                *p = false;
            }
        }
        newly
    }

    /// Mask every picked point. Returns how many became masked.
    pub fn mask_picked(&mut self) -> usize {
        let picked = self.picked_indices();
        self.mask(picked)
    }

    /// Clear the mask on every point. Returns whether anything was masked.
    pub fn unmask_all(&mut self) -> bool {
        let mut changed = false;
        for m in &mut self.masked {
            changed |= *m;
            *m = false;
        }
        changed
    }

    /// Replace the mask wholesale, e.g. from an external masking feature.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::LengthMismatch`] when `masked` is not exactly
    /// one flag per point; the current masks are left untouched.
    pub fn replace_masked(&mut self, masked: Vec<bool>) -> Result<(), SeriesError> {
        check_len("masked", self.len(), masked.len())?;
        for (p, m) in self.picked.iter_mut().zip(&masked) {
            if *m {
                *p = false;
            }
        }
        self.masked = masked;
        Ok(())
    }

    // --- Highlight ---

    /// Assign `group` (1..=255) to `indices`; `0` clears their highlight.
    pub fn set_highlight<I>(&mut self, indices: I, group: u8)
    where
        I: IntoIterator<Item = usize>,
    {
        for i in indices {
            if let Some(h) = self.highlighted.get_mut(i) {
                *h = group;
            }
        }
    }

    /// Remove highlight group `group` from every point.
    pub fn clear_highlight(&mut self, group: u8) {
        for h in &mut self.highlighted {
            if *h == group {
                *h = 0;
            }
        }
    }
}
