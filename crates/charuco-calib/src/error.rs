/// Errors that can occur during calibration.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CalibError {
    /// No view was given to the solver.
    #[error("No views to calibrate")]
    NoViews,

    /// A view does not carry enough correspondences.
    #[error("View {0} has {1} points, at least {2} are needed")]
    TooFewPoints(usize, usize, usize),

    /// Object and image points of a view have different lengths.
    #[error("View {0} has {1} object points but {2} image points")]
    PointCountMismatch(usize, usize, usize),

    /// The number of initial poses differs from the number of views.
    #[error("Got {1} poses for {0} views")]
    PoseCountMismatch(usize, usize),

    /// Fewer residuals than free parameters.
    #[error("Not enough observations: {0} residuals for {1} parameters")]
    Underdetermined(usize, usize),

    /// The correspondences do not define a homography.
    #[error("Degenerate point configuration for the homography")]
    DegenerateHomography,

    /// The homographies do not constrain the intrinsics.
    #[error("Cannot initialise the intrinsics from the given views")]
    DegenerateIntrinsics,

    /// The optimisation diverged.
    #[error("Calibration produced non-finite values")]
    NonFinite,

    /// The image size is empty.
    #[error("Invalid image size {0}x{1}")]
    InvalidImageSize(usize, usize),
}
