use nalgebra::DMatrix;

/// Smooth a grid with a normalized Gaussian kernel `width` pixels wide.
///
/// The kernel has `sigma = 0.3 · width` and an odd size (`width` rounded up to odd). The
/// convolution is separable and clamps at the grid edges. Widths below 2 leave the grid
/// unchanged.
pub fn gaussian_smooth(data: &DMatrix<f64>, width: usize) -> DMatrix<f64> {
    if width < 2 {
        return data.clone();
    }
    let kernel = gaussian_kernel(width);
    let half = (kernel.len() / 2) as isize;
    let (nrows, ncols) = data.shape();
    let clamp = |i: isize, n: usize| i.clamp(0, n as isize - 1) as usize;

    let along_rows: DMatrix<f64> = DMatrix::from_fn(nrows, ncols, |i, j| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * data[(clamp(i as isize + k as isize - half, nrows), j)])
            .sum::<f64>()
    });
    DMatrix::from_fn(nrows, ncols, |i, j| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * along_rows[(i, clamp(j as isize + k as isize - half, ncols))])
            .sum::<f64>()
    })
}

fn gaussian_kernel(width: usize) -> Vec<f64> {
    let size = width | 1;
    let half = (size / 2) as f64;
    let sigma = 0.3 * width as f64;
    let raw: Vec<f64> = (0..size)
        .map(|k| {
            let x = k as f64 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}
