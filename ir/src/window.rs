//! Sliding-window, padding and convolution descriptors.

use smallvec::SmallVec;

/// One dimension of a sliding window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowDimension {
    pub size: usize,
    pub stride: usize,
    pub padding_low: i64,
    pub padding_high: i64,
    /// Dilation applied to the window itself (rhs dilation).
    pub window_dilation: usize,
    /// Dilation applied to the operand before windowing (lhs dilation).
    pub base_dilation: usize,
}

impl WindowDimension {
    /// Window of `size` elements with unit stride, no padding and no dilation.
    pub fn of_size(size: usize) -> Self {
        Self { size, stride: 1, padding_low: 0, padding_high: 0, window_dilation: 1, base_dilation: 1 }
    }

    pub fn has_padding(&self) -> bool {
        self.padding_low != 0 || self.padding_high != 0
    }

    /// Extent covered by the dilated window.
    pub fn dilated_size(&self) -> usize {
        if self.size == 0 { 0 } else { (self.size - 1) * self.window_dilation + 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Window {
    pub dimensions: SmallVec<[WindowDimension; 4]>,
}

impl Window {
    pub fn new(dimensions: impl IntoIterator<Item = WindowDimension>) -> Self {
        Self { dimensions: dimensions.into_iter().collect() }
    }

    /// Window with the given sizes and every other attribute neutral.
    pub fn of_sizes(sizes: impl IntoIterator<Item = usize>) -> Self {
        Self::new(sizes.into_iter().map(WindowDimension::of_size))
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    pub fn has_stride(&self) -> bool {
        self.dimensions.iter().any(|d| d.stride != 1)
    }

    pub fn has_padding(&self) -> bool {
        self.dimensions.iter().any(WindowDimension::has_padding)
    }

    pub fn has_base_dilation(&self) -> bool {
        self.dimensions.iter().any(|d| d.base_dilation != 1)
    }
}

/// Padding amounts for one dimension. Edge amounts may be negative (trimming).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PaddingDim {
    pub low: i64,
    pub high: i64,
    pub interior: usize,
}

impl PaddingDim {
    pub const fn new(low: i64, high: i64, interior: usize) -> Self {
        Self { low, high, interior }
    }

    pub const fn edge(low: i64, high: i64) -> Self {
        Self { low, high, interior: 0 }
    }

    /// Output size when padding a dimension of `size` elements, `None` if it would be negative.
    pub fn padded_size(&self, size: usize) -> Option<usize> {
        let interior = size.saturating_sub(1) * self.interior;
        let total = (size + interior) as i64 + self.low + self.high;
        usize::try_from(total).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PaddingConfig {
    pub dimensions: SmallVec<[PaddingDim; 4]>,
}

impl PaddingConfig {
    pub fn new(dimensions: impl IntoIterator<Item = PaddingDim>) -> Self {
        Self { dimensions: dimensions.into_iter().collect() }
    }

    /// All-zero configuration of the given rank.
    pub fn zero(rank: usize) -> Self {
        Self { dimensions: SmallVec::from_elem(PaddingDim::default(), rank) }
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_noop(&self) -> bool {
        self.dimensions.iter().all(|d| d.low == 0 && d.high == 0 && d.interior == 0)
    }

    pub fn has_negative_edge(&self) -> bool {
        self.dimensions.iter().any(|d| d.low < 0 || d.high < 0)
    }

    pub fn has_interior(&self) -> bool {
        self.dimensions.iter().any(|d| d.interior != 0)
    }
}

/// Axis roles of a convolution's input, kernel and output.
///
/// Input and output share the batch/feature/spatial indices; the kernel has
/// its own input-feature, output-feature and spatial indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConvolutionDimensionNumbers {
    pub batch_dimension: usize,
    pub feature_dimension: usize,
    pub spatial_dimensions: SmallVec<[usize; 2]>,
    pub kernel_input_feature_dimension: usize,
    pub kernel_output_feature_dimension: usize,
    pub kernel_spatial_dimensions: SmallVec<[usize; 2]>,
}

impl ConvolutionDimensionNumbers {
    /// Dimension numbers from layout strings such as `"NHWC"` and `"HWIO"`.
    ///
    /// The activation string uses `N` (batch), `C` (feature) and any other
    /// letters for spatial dimensions; the kernel string uses `I`, `O` and the
    /// same spatial letters. Spatial dimensions are matched by letter in the
    /// order they appear in the activation string.
    pub fn from_strings(activation: &str, kernel: &str) -> Option<Self> {
        let act: Vec<char> = activation.chars().collect();
        let ker: Vec<char> = kernel.chars().collect();
        let batch_dimension = act.iter().position(|&c| c == 'N')?;
        let feature_dimension = act.iter().position(|&c| c == 'C')?;
        let kernel_input_feature_dimension = ker.iter().position(|&c| c == 'I')?;
        let kernel_output_feature_dimension = ker.iter().position(|&c| c == 'O')?;

        let spatial_letters: Vec<char> = act.iter().copied().filter(|&c| c != 'N' && c != 'C').collect();
        let spatial_dimensions = spatial_letters.iter().map(|s| act.iter().position(|c| c == s)).collect::<Option<_>>()?;
        let kernel_spatial_dimensions =
            spatial_letters.iter().map(|s| ker.iter().position(|c| c == s)).collect::<Option<_>>()?;

        Some(Self {
            batch_dimension,
            feature_dimension,
            spatial_dimensions,
            kernel_input_feature_dimension,
            kernel_output_feature_dimension,
            kernel_spatial_dimensions,
        })
    }
}
