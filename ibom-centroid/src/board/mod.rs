pub mod builder;
pub mod schema;

pub use builder::{
    background_urls, BoardGeometry, BoardModel, BoardModelBuilder, DEFAULT_MARKER_SIZE, MM_PER_INCH,
};
pub use schema::*;
