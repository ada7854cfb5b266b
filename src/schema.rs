//! Ordered field layouts shared by size computation and decoding.
//!
//! A table builds one `Layout` from its params. `size()` is the table length,
//! and decoders ask `contains()` before reading any optional section, so both
//! paths evaluate the same predicate.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Segment {
    pub name: &'static str,
    pub width: usize,
    pub count: usize,
}

impl Segment {
    pub const fn len(&self) -> usize {
        self.width * self.count
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Layout {
    segments: Vec<Segment>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(self, name: &'static str, width: usize) -> Self {
        self.repeated(name, width, 1)
    }

    pub fn repeated(mut self, name: &'static str, width: usize, count: usize) -> Self {
        self.segments.push(Segment { name, width, count });
        self
    }

    /// Adds the field only when `present`; absent fields take no space.
    pub fn optional(self, name: &'static str, width: usize, present: bool) -> Self {
        if present {
            self.field(name, width)
        } else {
            self
        }
    }

    /// Appends every segment of `delta`, used by layouts composed from a base layout.
    pub fn extend(mut self, delta: Layout) -> Self {
        self.segments.extend(delta.segments);
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn size(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.segments.iter().any(|s| s.name == name)
    }

    /// Byte offset of the first occurrence of `name`.
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        let mut offset = 0;
        for segment in &self.segments {
            if segment.name == name {
                return Some(offset);
            }
            offset += segment.len();
        }
        None
    }

    pub fn width_of(&self, name: &str) -> Option<usize> {
        self.segments.iter().find(|s| s.name == name).map(Segment::len)
    }
}
