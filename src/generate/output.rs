/// Maps one markup region of the source to the code generated for it
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Region {
    /// Tag of the outermost element
    pub tag: String,
    pub source_start: usize,
    pub source_end: usize,
    pub generated_start: usize,
    pub generated_end: usize,
}

/// Output buffer that accumulates generated code and region mappings.
/// Positions are byte offsets.
#[derive(Debug, Default)]
pub struct Output {
    code: String,
    regions: Vec<Region>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str) {
        self.code.push_str(text);
    }

    pub fn push_char(&mut self, c: char) {
        self.code.push(c);
    }

    /// Current byte position in the output
    pub fn position(&self) -> usize {
        self.code.len()
    }

    pub fn add_region(&mut self, region: Region) {
        self.regions.push(region);
    }

    /// Finish and return the generated code with its regions
    pub fn finish(self) -> (String, Vec<Region>) {
        (self.code, self.regions)
    }
}
