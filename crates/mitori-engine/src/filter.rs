//! Color filters applied to the rendered canvas.

/// Convert an RGBA byte buffer to grayscale in place.
///
/// Each pixel's channels are replaced with the luminance
/// `0.3*R + 0.59*G + 0.11*B`, rounded ties-to-even the way a canvas
/// `ImageData` write clamps; alpha is untouched. Operates on the raw
/// buffer so it works on any RGBA surface.
#[allow(clippy::suboptimal_flops)] // plain left-to-right sum matches canvas arithmetic
pub fn grayscale_in_place(pixels: &mut [u8]) {
    for pixel in pixels.chunks_exact_mut(4) {
        let luminance =
            f64::from(pixel[0]) * 0.3 + f64::from(pixel[1]) * 0.59 + f64::from(pixel[2]) * 0.11;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let gray = luminance.round_ties_even().clamp(0.0, 255.0) as u8;
        pixel[0] = gray;
        pixel[1] = gray;
        pixel[2] = gray;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pixel_converts_to_weighted_luminance() {
        // 100*0.3 + 150*0.59 + 200*0.11 = 140.5, ties-to-even -> 140.
        let mut pixels = [100, 150, 200, 255];
        grayscale_in_place(&mut pixels);
        assert_eq!(pixels, [140, 140, 140, 255]);
    }

    #[test]
    fn alpha_is_preserved() {
        let mut pixels = [10, 20, 30, 42];
        grayscale_in_place(&mut pixels);
        assert_eq!(pixels[3], 42);
    }

    #[test]
    fn gray_pixel_is_unchanged() {
        let mut pixels = [128, 128, 128, 255];
        grayscale_in_place(&mut pixels);
        assert_eq!(pixels, [128, 128, 128, 255]);
    }

    #[test]
    fn processes_every_pixel_in_the_buffer() {
        let mut pixels = [255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255];
        grayscale_in_place(&mut pixels);
        // 0.3*255 = 76.5 -> 76, 0.59*255 = 150.45 -> 150, 0.11*255 = 28.05 -> 28
        assert_eq!(&pixels[0..3], &[76, 76, 76]);
        assert_eq!(&pixels[4..7], &[150, 150, 150]);
        assert_eq!(&pixels[8..11], &[28, 28, 28]);
    }
}
