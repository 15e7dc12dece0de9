/// Newline table translating byte offsets to 1-based line numbers.
pub struct FileInfo {
    newlines: Vec<usize>,
}

impl FileInfo {
    pub fn new(source: &str) -> Self {
        let mut newlines = Vec::new();
        for (i, c) in source.char_indices() {
            if c == '\n' {
                newlines.push(i);
            }
        }
        FileInfo { newlines }
    }

    /// Line containing the byte at `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        // Count the newlines strictly before `offset`.
        let mut lo = 0;
        let mut hi = self.newlines.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.newlines[mid] < offset {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo + 1
    }
}
