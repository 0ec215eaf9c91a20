mod go;
mod output;

pub use go::{GoGenerator, go_string};
pub use output::{Output, Region};

use crate::parser::MarkupRegion;

/// Generator options
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Package qualifier for runtime calls (`gox` in `gox.El(...)`)
    pub runtime: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { runtime: "gox".to_string() }
    }
}

/// Generation result
#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub code: String,
    pub regions: Vec<Region>,
}

/// Generator trait - rewrites host source, replacing each markup region
/// with runtime construction calls
pub trait Generator {
    fn generate(&self, source: &str, regions: &[MarkupRegion], options: &GenerateOptions) -> GenerateResult;
}
