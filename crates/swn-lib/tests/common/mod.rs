#![allow(dead_code)]

use swn_lib::{Geometry, LineId, LineTable};

/// Three lines meeting at (60, 100, 14); line 2 is the outlet.
pub fn basic_table() -> LineTable {
    segments(&[
        [[40.0, 130.0, 15.0], [60.0, 100.0, 14.0]],
        [[70.0, 130.0, 15.0], [60.0, 100.0, 14.0]],
        [[60.0, 100.0, 14.0], [60.0, 80.0, 12.0]],
    ])
}

/// Range-indexed table of two-point segments.
pub fn segments(points: &[[[f64; 3]; 2]]) -> LineTable {
    LineTable::from_geometries(
        points
            .iter()
            .map(|segment| Geometry::line_string_z(*segment)),
    )
}

/// Outlet identifiers of the generated coastal network, in input order.
pub const COASTAL_OUTLETS: [LineId; 3] = [3046700, 3046737, 3046736];

/// Generate a 304-segment coastal network with three catchments.
///
/// The first catchment is a single segment. The others are combs: a main
/// stem whose junctions each receive a tributary, with two extra tributaries
/// in the last comb, giving 173 and 130 members and 154 headwaters overall.
pub fn coastal_table() -> LineTable {
    let mut table = LineTable::new();
    let mut next_id: LineId = 3047000;

    let single = Geometry::line_string_z([[-500.0, 7.0, 5.0], [-520.0, 3.0, 1.0]]);
    table.push(COASTAL_OUTLETS[0], single).expect("unique id");

    push_comb(&mut table, &mut next_id, COASTAL_OUTLETS[1], 1000.0, 87, 86, &[]);
    push_comb(&mut table, &mut next_id, COASTAL_OUTLETS[2], 5000.0, 64, 64, &[1, 64]);
    table
}

fn stem_point(x_origin: f64, step: usize) -> [f64; 3] {
    let step = step as f64;
    [x_origin + 10.0 * step, 3.0 * step + 0.5, 1.0 + step]
}

fn push_comb(
    table: &mut LineTable,
    next_id: &mut LineId,
    outlet_id: LineId,
    x_origin: f64,
    stem_len: usize,
    tributaries: usize,
    extra_nodes: &[usize],
) {
    // Stem segment i runs from node i + 1 down to node i; segment 0 is the outlet.
    for i in 0..stem_len {
        let id = if i == 0 { outlet_id } else { take(next_id) };
        let geometry =
            Geometry::line_string_z([stem_point(x_origin, i + 1), stem_point(x_origin, i)]);
        table.push(id, geometry).expect("unique id");
    }

    // Tributary i joins the stem at node i + 1.
    for i in 0..tributaries {
        let [x, y, z] = stem_point(x_origin, i + 1);
        let geometry = Geometry::line_string_z([[x - 5.0, y + 8.25, z + 1.0], [x, y, z]]);
        table.push(take(next_id), geometry).expect("unique id");
    }

    for &node in extra_nodes {
        let [x, y, z] = stem_point(x_origin, node);
        let geometry = Geometry::line_string_z([[x + 2.5, y - 4.0, z + 2.0], [x, y, z]]);
        table.push(take(next_id), geometry).expect("unique id");
    }
}

fn take(next_id: &mut LineId) -> LineId {
    let id = *next_id;
    *next_id += 1;
    id
}
