// We follow the same approach as the rest of the workspace: the public
// crate defines a single opaque `Error` that wraps a private `ErrorKind`,
// while `xsvs_nostd_internal` reports stringly `&'static str` errors that
// we wrap in `ErrorKind::Internal`.
//
// Each kind gets a small struct that implements Display. This is a little
// more upfront work than a single enum with strings, but it keeps the
// messages consistent and it is easy to grow.

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The underlying internal error type
#[non_exhaustive]
#[derive(Clone, Debug)]
enum ErrorKind {
    /// An error that occurs when a frame doesn't have the label map's shape
    FrameShape(FrameShapeError),
    /// An error that occurs when an integer lies outside of the acceptable
    /// range of values
    IntegerRange(IntegerRangeError),
    /// An error that occurs within `xsvs_nostd_internal`
    Internal(InternalError),
    /// An error that occurs when the ROI label map is malformed
    LabelMap(LabelMapError),
    /// An error that occurs when statistics with a different (level, ROI)
    /// layout are combined
    LayoutMismatch(LayoutMismatchError),
    /// An error that occurs when a plan is built without a maximum count
    MaxCountPresence(MaxCountPresenceError),
    /// An error that occurs when a ROI's mean intensity can't be used to
    /// normalize bin edges
    MeanIntensity(MeanIntensityError),
    /// An error that occurs when a pixel value can't be histogrammed
    PixelValue(PixelValueError),
}

// define constructor methods for Error
impl Error {
    /// produce an error indicating that a frame has the wrong shape
    pub(crate) fn frame_shape(expected: [usize; 2], actual: [usize; 2]) -> Self {
        Error {
            kind: ErrorKind::FrameShape(FrameShapeError { expected, actual }),
        }
    }

    /// produce an error indicating that an integer lies outside the acceptable
    /// range of values
    pub(crate) fn integer_range(
        description: &'static str,
        actual: u64,
        min_val: u64,
        max_val: u64,
    ) -> Self {
        Error {
            kind: ErrorKind::IntegerRange(IntegerRangeError {
                description,
                actual,
                min_val,
                max_val,
            }),
        }
    }

    /// wraps an error string from `xsvs_nostd_internal`
    pub(crate) fn internal(message: &'static str) -> Self {
        Error {
            kind: ErrorKind::Internal(InternalError(message)),
        }
    }

    /// produce an error indicating that the label map holds a negative label
    pub(crate) fn negative_label(label: i64, flat_index: usize) -> Self {
        Error {
            kind: ErrorKind::LabelMap(LabelMapError::Negative { label, flat_index }),
        }
    }

    /// produce an error indicating that a label in 1..=max_label is unused
    pub(crate) fn label_gap(missing: usize, max_label: usize) -> Self {
        Error {
            kind: ErrorKind::LabelMap(LabelMapError::Gap { missing, max_label }),
        }
    }

    /// produce an error indicating that a label exceeds the ROI count
    pub(crate) fn label_too_large(label: i64, n_rois: usize) -> Self {
        Error {
            kind: ErrorKind::LabelMap(LabelMapError::TooLarge { label, n_rois }),
        }
    }

    /// produce an error indicating that the label map selects nothing
    pub(crate) fn no_rois() -> Self {
        Error {
            kind: ErrorKind::LabelMap(LabelMapError::NoRois),
        }
    }

    /// produce an error indicating that two sets of statistics don't share
    /// the same (level, ROI) layout
    pub(crate) fn layout_mismatch(what: &'static str) -> Self {
        Error {
            kind: ErrorKind::LayoutMismatch(LayoutMismatchError { what }),
        }
    }

    /// produce an error indicating that the maximum pixel count is missing
    pub(crate) fn max_count_presence() -> Self {
        Error {
            kind: ErrorKind::MaxCountPresence(MaxCountPresenceError),
        }
    }

    /// produce an error indicating that a ROI has a zero mean intensity
    pub(crate) fn zero_mean_intensity(roi: usize) -> Self {
        Error {
            kind: ErrorKind::MeanIntensity(MeanIntensityError::Zero { roi }),
        }
    }

    /// produce an error indicating that a ROI's mean intensity is negative
    /// or not finite
    pub(crate) fn invalid_mean_intensity(roi: usize, value: f64) -> Self {
        Error {
            kind: ErrorKind::MeanIntensity(MeanIntensityError::Invalid { roi, value }),
        }
    }

    /// produce an error indicating that a (synthesized) pixel count doesn't
    /// land in any count bin of `level`
    pub(crate) fn count_range(
        level: usize,
        roi: usize,
        value: f64,
        upper_edge: f64,
        n_out_of_range: usize,
    ) -> Self {
        Error {
            kind: ErrorKind::PixelValue(PixelValueError::OutsideBins {
                level,
                roi,
                value,
                upper_edge,
                n_out_of_range,
            }),
        }
    }

    /// produce an error indicating that a pixel value is infinite or NaN
    pub(crate) fn non_finite_pixel(value: f64, flat_index: usize) -> Self {
        Error {
            kind: ErrorKind::PixelValue(PixelValueError::NonFinite { value, flat_index }),
        }
    }

    /// Returns `true` when the error reports a ROI with a zero mean intensity
    pub fn is_zero_mean_intensity(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::MeanIntensity(MeanIntensityError::Zero { .. })
        )
    }

    /// Returns `true` when the error reports a malformed label map
    pub fn is_label_map(&self) -> bool {
        matches!(self.kind, ErrorKind::LabelMap(_))
    }

    /// Returns `true` when the error reports a pixel value that is negative,
    /// not finite, or exceeds the maximum count
    pub fn is_pixel_value(&self) -> bool {
        matches!(self.kind, ErrorKind::PixelValue(_))
    }

    /// Returns `true` when the error reports a frame with the wrong shape
    pub fn is_frame_shape(&self) -> bool {
        matches!(self.kind, ErrorKind::FrameShape(_))
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for ErrorKind {}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            ErrorKind::FrameShape(ref err) => err.fmt(f),
            ErrorKind::IntegerRange(ref err) => err.fmt(f),
            ErrorKind::Internal(ref err) => err.fmt(f),
            ErrorKind::LabelMap(ref err) => err.fmt(f),
            ErrorKind::LayoutMismatch(ref err) => err.fmt(f),
            ErrorKind::MaxCountPresence(ref err) => err.fmt(f),
            ErrorKind::MeanIntensity(ref err) => err.fmt(f),
            ErrorKind::PixelValue(ref err) => err.fmt(f),
        }
    }
}

/// An error that occurs when a frame doesn't have the label map's shape
#[derive(Clone, Debug)]
struct FrameShapeError {
    expected: [usize; 2],
    actual: [usize; 2],
}

impl std::error::Error for FrameShapeError {}

impl core::fmt::Display for FrameShapeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "frame has shape {:?}, but the label map has shape {:?}",
            self.actual, self.expected
        )
    }
}

/// An error that occurs when an integer lies outside of the acceptable
/// range of values
#[derive(Clone, Debug)]
struct IntegerRangeError {
    description: &'static str,
    actual: u64,
    min_val: u64,
    max_val: u64,
}

impl std::error::Error for IntegerRangeError {}

impl core::fmt::Display for IntegerRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} has a value of {}. The value should be no less than {} and \
             not exceed {}",
            self.description, self.actual, self.min_val, self.max_val
        )
    }
}

/// Wraps the string errors from `xsvs_nostd_internal`
#[derive(Clone)]
struct InternalError(&'static str);

impl std::error::Error for InternalError {}

impl core::fmt::Display for InternalError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::fmt::Debug for InternalError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.0, f)
    }
}

/// An error that occurs when the ROI label map is malformed
#[derive(Clone, Debug)]
enum LabelMapError {
    Negative { label: i64, flat_index: usize },
    Gap { missing: usize, max_label: usize },
    TooLarge { label: i64, n_rois: usize },
    NoRois,
}

impl std::error::Error for LabelMapError {}

impl core::fmt::Display for LabelMapError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            LabelMapError::Negative { label, flat_index } => write!(
                f,
                "the label map holds a negative label ({label}) at flat index {flat_index}"
            ),
            LabelMapError::Gap { missing, max_label } => write!(
                f,
                "ROI labels must form the dense range 1..={max_label}, but no pixel \
                 carries the label {missing}"
            ),
            LabelMapError::TooLarge { label, n_rois } => write!(
                f,
                "the label map holds the label {label}, which exceeds the number of \
                 ROIs ({n_rois})"
            ),
            LabelMapError::NoRois => write!(f, "the label map doesn't define any ROI"),
        }
    }
}

/// An error that occurs when statistics with different layouts are combined
#[derive(Clone, Debug)]
struct LayoutMismatchError {
    what: &'static str,
}

impl std::error::Error for LayoutMismatchError {}

impl core::fmt::Display for LayoutMismatchError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "mismatched (level, ROI) layout: {}", self.what)
    }
}

/// An error that occurs when a plan is built without a maximum count
#[derive(Clone, Debug)]
struct MaxCountPresenceError;

impl std::error::Error for MaxCountPresenceError {}

impl core::fmt::Display for MaxCountPresenceError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "the maximum pixel count was not specified (it sizes the histogram bins)"
        )
    }
}

/// An error that occurs when a ROI's mean intensity can't be used for
/// normalization
#[derive(Clone, Debug)]
enum MeanIntensityError {
    Zero { roi: usize },
    Invalid { roi: usize, value: f64 },
}

impl std::error::Error for MeanIntensityError {}

impl core::fmt::Display for MeanIntensityError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            MeanIntensityError::Zero { roi } => write!(
                f,
                "the mean intensity of ROI {roi} is zero, so its bin edges can't be normalized"
            ),
            MeanIntensityError::Invalid { roi, value } => write!(
                f,
                "the mean intensity of ROI {roi} is {value}. It must be finite and positive"
            ),
        }
    }
}

/// An error that occurs when a pixel value can't be histogrammed
#[derive(Clone, Debug)]
enum PixelValueError {
    OutsideBins {
        level: usize,
        roi: usize,
        value: f64,
        upper_edge: f64,
        n_out_of_range: usize,
    },
    NonFinite {
        value: f64,
        flat_index: usize,
    },
}

impl std::error::Error for PixelValueError {}

impl core::fmt::Display for PixelValueError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            PixelValueError::OutsideBins {
                level,
                roi,
                value,
                upper_edge,
                n_out_of_range,
            } => write!(
                f,
                "{n_out_of_range} pixel(s) of ROI {roi} at level {level} lie outside of \
                 the count bins [0, {upper_edge}) (first offender: {value}). The \
                 maximum count is probably too small."
            ),
            PixelValueError::NonFinite { value, flat_index } => write!(
                f,
                "the pixel at flat index {flat_index} holds a non-finite value ({value})"
            ),
        }
    }
}
