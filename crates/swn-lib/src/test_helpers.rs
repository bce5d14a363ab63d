// Test-only helpers for `swn-lib` unit tests
use crate::geometry::Geometry;
use crate::table::LineTable;

/// Three lines meeting at (60, 100, 14); line 2 is the outlet.
pub fn basic_table() -> LineTable {
    LineTable::from_geometries([
        Geometry::line_string_z([[40.0, 130.0, 15.0], [60.0, 100.0, 14.0]]),
        Geometry::line_string_z([[70.0, 130.0, 15.0], [60.0, 100.0, 14.0]]),
        Geometry::line_string_z([[60.0, 100.0, 14.0], [60.0, 80.0, 12.0]]),
    ])
}
