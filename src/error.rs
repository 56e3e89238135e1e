//! Errors reported by mode data containers and their operations.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ModeError>;

/// Errors that can occur when constructing, rotating or interpolating mode data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModeError {
    #[error("Mode data is expected to be 1- to 5-D, but got a {{ {} }} array", format_shape(.0))]
    UnsupportedShape(Vec<usize>),

    #[error("Vectors must have 3N elements per mode, but got {0}")]
    VectorElementCount(usize),

    #[error("Matrices must have 9N elements per mode, but got {0}")]
    MatrixElementCount(usize),

    #[error("1-D data must represent one scalar per point, but the layout spans {0} elements")]
    ScalarPerPoint(usize),

    #[error("2-D data requires an integer number of modes: {elements} elements per point is not a multiple of {span}")]
    NonIntegerModeCount { elements: usize, span: usize },

    #[error("The last dimension ({found}) does not match the {expected} elements per mode of the layout")]
    LayoutMismatch { expected: usize, found: usize },

    #[error("{dimensions}-D data can only hold {kind}, but got a {{ {} }} array", format_shape(.shape))]
    NotVectorsOrMatrices {
        dimensions: usize,
        kind: &'static str,
        shape: Vec<usize>,
    },

    #[error("{kind} data requires a layout of only {kind}, but got {scalars} scalar, {vector_elements} vector and {matrix_elements} matrix elements per mode")]
    NotPureLayout {
        kind: &'static str,
        scalars: usize,
        vector_elements: usize,
        matrix_elements: usize,
    },

    #[error("Modes must contain at least one element")]
    EmptyModes,

    #[error("Expected data shaped {{ P {} }}, but got {{ {} }}", format_shape(.expected), format_shape(.found))]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Symmetry operation {0} is singular")]
    SingularOperation(usize),

    #[error("Gamma table maps element {element} of operation {operation} to {target}, beyond the {count} elements per mode")]
    GammaElementOutOfRange {
        operation: usize,
        element: usize,
        target: usize,
        count: usize,
    },

    #[error("RotatesLike == Gamma requires complex valued data")]
    GammaRequiresComplex,

    #[error("RotatesLike == Gamma requires a Gamma table")]
    MissingGammaTable,

    #[error("Impossible RotatesLike value {0}")]
    UnknownRotatesLike(u32),

    #[error("Expected {expected} {what}, but got {found}")]
    MappingLengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Symmetry operation index {index} is out of range for {count} operations")]
    OperationOutOfRange { index: usize, count: usize },

    #[error("Vertex index {index} is out of range for {count} vertices")]
    VertexOutOfRange { index: usize, count: usize },

    #[error("Query {query} has {vertices} vertices but {weights} weights")]
    WeightCountMismatch {
        query: usize,
        vertices: usize,
        weights: usize,
    },

    #[error("Query {0} has no contributing vertices")]
    EmptyQuery(usize),

    #[error("Output has {found} elements, but {expected} are required")]
    OutputSizeMismatch { expected: usize, found: usize },

    #[error("Mode data must be stored contiguously in standard layout")]
    NonContiguousData,

    #[error("Cost weights must be finite and non-negative, but got {0:?}")]
    InvalidCostWeights([f64; 3]),
}

fn format_shape(shape: &[usize]) -> String {
    shape
        .iter()
        .map(|size| size.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
