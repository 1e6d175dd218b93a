use opencv::{
    core::{Mat, Point, Scalar},
    imgproc,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::analysis::Measurement;
use crate::error::Result;

pub const NEAR_WARNING_TEXT: &str = "!! TOO CLOSE !!";

const BOX_THICKNESS: i32 = 2;
const LABEL_OFFSET_Y: i32 = 15;
const LABEL_FONT_SCALE: f64 = 0.5;
const LABEL_THICKNESS: i32 = 2;
const WARNING_ORIGIN: (i32, i32) = (50, 50);
const WARNING_FONT_SCALE: f64 = 1.5;
const WARNING_THICKNESS: i32 = 3;

/// One BGR color per class, drawn once from a seeded generator.
#[derive(Clone, Debug)]
pub struct ClassPalette {
    colors: Vec<Scalar>,
}

impl ClassPalette {
    pub fn seeded(seed: u64, num_classes: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let colors = (0..num_classes)
            .map(|_| {
                Scalar::new(
                    rng.gen_range(0. ..255.),
                    rng.gen_range(0. ..255.),
                    rng.gen_range(0. ..255.),
                    0.,
                )
            })
            .collect();

        ClassPalette { colors }
    }

    pub fn color(&self, class_idx: usize) -> Scalar {
        self.colors
            .get(class_idx)
            .copied()
            .unwrap_or_else(|| Scalar::all(255.))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn near_warning_color() -> Scalar {
    Scalar::new(0., 0., 255., 0.)
}

pub fn draw_measurement(
    image: &mut Mat,
    measurement: &Measurement,
    palette: &ClassPalette,
) -> Result<()> {
    let color = palette.color(measurement.class_idx);
    let pixel_box = &measurement.pixel_box;

    imgproc::rectangle_points(
        image,
        Point::new(pixel_box.start_x, pixel_box.start_y),
        Point::new(pixel_box.end_x, pixel_box.end_y),
        color,
        BOX_THICKNESS,
        imgproc::LINE_8,
        0,
    )?;

    imgproc::put_text(
        image,
        &measurement.display_text(),
        Point::new(pixel_box.start_x, pixel_box.start_y - LABEL_OFFSET_Y),
        imgproc::FONT_HERSHEY_SIMPLEX,
        LABEL_FONT_SCALE,
        color,
        LABEL_THICKNESS,
        imgproc::LINE_8,
        false,
    )?;

    Ok(())
}

pub fn draw_near_warning(image: &mut Mat) -> Result<()> {
    imgproc::put_text(
        image,
        NEAR_WARNING_TEXT,
        Point::new(WARNING_ORIGIN.0, WARNING_ORIGIN.1),
        imgproc::FONT_HERSHEY_SIMPLEX,
        WARNING_FONT_SCALE,
        near_warning_color(),
        WARNING_THICKNESS,
        imgproc::LINE_AA,
        false,
    )?;

    Ok(())
}

/// Draws measurements in order; each near one re-stamps the warning.
pub fn annotate(
    image: &mut Mat,
    measurements: &[Measurement],
    palette: &ClassPalette,
) -> Result<()> {
    for measurement in measurements {
        draw_measurement(image, measurement, palette)?;

        if measurement.near {
            draw_near_warning(image)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PixelBox;
    use opencv::core::{self, Vec3b, CV_8UC3};
    use opencv::prelude::*;

    fn blank_frame() -> Mat {
        Mat::new_rows_cols_with_default(480, 640, CV_8UC3, Scalar::all(0.)).unwrap()
    }

    fn bottle(near: bool) -> Measurement {
        Measurement {
            class_idx: 5,
            label: "bottle".to_string(),
            confidence: 0.9,
            pixel_box: PixelBox {
                start_x: 256,
                start_y: 192,
                end_x: 320,
                end_y: 432,
            },
            distance_cm: if near { 38.4375 } else { 76.875 },
            near,
        }
    }

    #[test]
    fn test_palette_is_reproducible_for_a_seed() {
        let a = ClassPalette::seeded(7, 22);
        let b = ClassPalette::seeded(7, 22);
        assert_eq!(a.len(), 22);
        for idx in 0..22 {
            assert_eq!(a.color(idx), b.color(idx));
        }
    }

    #[test]
    fn test_palette_channels_in_byte_range() {
        let palette = ClassPalette::seeded(4904, 22);
        for idx in 0..palette.len() {
            let color = palette.color(idx);
            for channel in 0..3 {
                assert!((0. ..255.).contains(&color[channel]));
            }
        }
    }

    #[test]
    fn test_palette_falls_back_past_the_end() {
        assert_eq!(ClassPalette::seeded(1, 2).color(9), Scalar::all(255.));
    }

    #[test]
    fn test_box_corner_takes_class_color() {
        let palette = ClassPalette::seeded(4904, 22);
        let mut image = blank_frame();

        annotate(&mut image, &[bottle(false)], &palette).unwrap();

        let expected = palette.color(5);
        let corner = image.at_2d::<Vec3b>(432, 320).unwrap();
        for channel in 0..3 {
            assert_eq!(corner[channel] as f64, expected[channel].round());
        }
    }

    #[test]
    fn test_warning_only_drawn_for_near_objects() {
        let palette = ClassPalette::seeded(4904, 22);

        let mut far = blank_frame();
        annotate(&mut far, &[bottle(false)], &palette).unwrap();
        let mut near = blank_frame();
        annotate(&mut near, &[bottle(true)], &palette).unwrap();

        let mut diff = Mat::default();
        core::absdiff(&far, &near, &mut diff).unwrap();
        let mut gray = Mat::default();
        imgproc::cvt_color(&diff, &mut gray, imgproc::COLOR_BGR2GRAY, 0).unwrap();
        assert!(core::count_non_zero(&gray).unwrap() > 0);

        // The warning text sits in the top-left band, away from the box.
        let roi = Mat::roi(&gray, core::Rect::new(0, 0, 256, 100)).unwrap();
        assert!(core::count_non_zero(&*roi).unwrap() > 0);
    }

    #[test]
    fn test_no_measurements_leaves_frame_untouched() {
        let palette = ClassPalette::seeded(4904, 22);
        let mut image = blank_frame();

        annotate(&mut image, &[], &palette).unwrap();

        let mut gray = Mat::default();
        imgproc::cvt_color(&image, &mut gray, imgproc::COLOR_BGR2GRAY, 0).unwrap();
        assert_eq!(core::count_non_zero(&gray).unwrap(), 0);
    }
}
