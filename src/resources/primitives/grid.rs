use crate::resources::Color;
use crate::resources::geometry::{Geometry, Topology};

/// Square line grid on the XZ plane.
///
/// The two lines through the origin use `center_color`, every other line
/// uses `grid_color`.
#[must_use]
pub fn create_grid(size: f32, divisions: u32, center_color: Color, grid_color: Color) -> Geometry {
    let divisions = divisions.max(1);
    let center = divisions / 2;
    let step = size / divisions as f32;
    let half_size = size / 2.0;

    let line_count = (divisions + 1) as usize * 4;
    let mut positions = Vec::with_capacity(line_count);
    let mut colors = Vec::with_capacity(line_count);

    for i in 0..=divisions {
        let k = -half_size + i as f32 * step;

        positions.push([-half_size, 0.0, k]);
        positions.push([half_size, 0.0, k]);
        positions.push([k, 0.0, -half_size]);
        positions.push([k, 0.0, half_size]);

        let color = if i == center { center_color } else { grid_color };
        let rgb = color.to_vec3().to_array();
        colors.extend_from_slice(&[rgb; 4]);
    }

    let mut geo = Geometry::new(positions);
    geo.colors = colors;
    geo.topology = Topology::LineList;
    geo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_two_lines_per_division_step() {
        let red = Color::from_hex(0xff_0000);
        let gray = Color::from_hex(0x88_8888);
        let geo = create_grid(100.0, 100, red, gray);

        assert_eq!(geo.vertex_count(), 101 * 4);
        assert_eq!(geo.topology, Topology::LineList);

        // Line 50 runs through the origin
        assert_eq!(geo.positions[200], [-50.0, 0.0, 0.0]);
        assert_eq!(geo.colors[200], red.to_vec3().to_array());
        assert_eq!(geo.colors[0], gray.to_vec3().to_array());
    }
}
