/// Grid points sorted by radius, for radial-shell lookups by binary search.
///
/// Replaces a scan of every grid point per bin by two `partition_point` searches; the
/// returned shell keeps the half-open `[lo, hi)` convention of the radial bin test.
#[derive(Debug, Clone)]
pub struct RadialIndex {
    order: Vec<usize>,
    radii: Vec<f64>,
}

impl RadialIndex {
    /// Index the points whose radii are `radii` (point `p` has radius `radii[p]`).
    ///
    /// Non-finite radii are left out of the index.
    pub fn new(radii: &[f64]) -> Self {
        let mut order: Vec<usize> = (0..radii.len()).filter(|&p| radii[p].is_finite()).collect();
        order.sort_by(|&a, &b| radii[a].total_cmp(&radii[b]));
        let radii = order.iter().map(|&p| radii[p]).collect();
        RadialIndex { order, radii }
    }

    /// Indices of the points with `lo <= r < hi`.
    pub fn shell(&self, lo: f64, hi: f64) -> &[usize] {
        let start = self.radii.partition_point(|r| *r < lo);
        let end = self.radii.partition_point(|r| *r < hi);
        if end <= start {
            &[]
        } else {
            &self.order[start..end]
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
