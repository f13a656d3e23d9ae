/// Cells in a text progress bar.
pub const BAR_WIDTH: usize = 24;
pub const BAR_FILLED: char = '#';
pub const BAR_EMPTY: char = '-';
