/// Three width tiers, each with its own masonry column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnBreakpoints {
    /// Containers up to this width use `small` columns.
    pub small_max_width: u32,
    /// Containers up to this width (and above `small_max_width`) use `medium` columns.
    pub medium_max_width: u32,
    pub small: u32,
    pub medium: u32,
    pub large: u32,
}

impl Default for ColumnBreakpoints {
    fn default() -> Self {
        Self {
            small_max_width: 600,
            medium_max_width: 1024,
            small: 1,
            medium: 2,
            large: 3,
        }
    }
}

impl ColumnBreakpoints {
    pub fn resolve(&self, container_width: f32) -> u32 {
        let count = if container_width <= self.small_max_width as f32 {
            self.small
        } else if container_width <= self.medium_max_width as f32 {
            self.medium
        } else {
            self.large
        };
        count.max(1)
    }
}

/// How many masonry columns to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnCount {
    Fixed(u32),
    Responsive(ColumnBreakpoints),
}

impl Default for ColumnCount {
    fn default() -> Self {
        ColumnCount::Responsive(ColumnBreakpoints::default())
    }
}

impl ColumnCount {
    /// Column count for a given container width, never below 1.
    pub fn resolve(&self, container_width: f32) -> u32 {
        match self {
            ColumnCount::Fixed(count) => (*count).max(1),
            ColumnCount::Responsive(breakpoints) => breakpoints.resolve(container_width),
        }
    }
}
