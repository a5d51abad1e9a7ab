//! Texture byte layouts for the external renderer.

use crate::biome::Color;

/// Pack a color grid into tightly packed RGBA8 bytes, row-major.
pub fn color_grid_rgba8(colors: &[Color]) -> Vec<u8> {
    colors.iter().flat_map(|c| c.to_rgba8()).collect()
}

/// Grayscale RGBA8 bytes for a height grid: 0 is black, 1 is white.
pub fn height_grid_rgba8(heights: &[f32]) -> Vec<u8> {
    heights
        .iter()
        .flat_map(|h| Color::BLACK.lerp(Color::WHITE, *h).to_rgba8())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_grid_layout() {
        let bytes = color_grid_rgba8(&[Color::WHITE, Color::TRANSPARENT]);
        assert_eq!(bytes, vec![255, 255, 255, 255, 0, 0, 0, 0]);
    }

    #[test]
    fn test_height_grid_clamps() {
        let bytes = height_grid_rgba8(&[0.0, 1.0, 1.7, -0.2]);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 255]);
        assert_eq!(&bytes[4..8], &[255, 255, 255, 255]);
        assert_eq!(&bytes[8..12], &[255, 255, 255, 255]);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 255]);
    }
}
