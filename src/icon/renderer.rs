use std::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    PrimitiveStyleBuilder, Rectangle, RoundedRectangle, StrokeAlignment, Triangle,
};
use image::{Rgba, RgbaImage};

use crate::telemetry::TelemetryFrame;

pub const ICON_WIDTH: u32 = 150;
pub const ICON_HEIGHT: u32 = 70;

/// Fill width at 100%
pub const FILL_MAX_WIDTH: u32 = 93;
/// Highest percentage still drawn in the warning colour
pub const LOW_BATTERY_THRESHOLD: u8 = 20;

pub const OUTLINE_COLOR: Rgb888 = Rgb888::new(80, 80, 80);
pub const FILL_COLOR: Rgb888 = Rgb888::new(0, 0, 0);
pub const LOW_FILL_COLOR: Rgb888 = Rgb888::new(255, 0, 0);
pub const BOLT_COLOR: Rgb888 = Rgb888::new(70, 175, 168);

const BODY_STROKE: u32 = 3;
const BODY_RADIUS: u32 = 12;
const HEAD_SIZE: Size = Size::new(6, 12);
const HEAD_RADIUS: u32 = 5;
const FILL_MARGIN: i32 = 8;
const FILL_RADIUS: u32 = 8;

/// Lightning bolt outline, offsets from the canvas centre
pub const BOLT_OFFSETS: [(i32, i32); 6] = [(-5, -23), (-26, 4), (-13, 4), (-15, 23), (7, -3), (-7, -3)];

/// Width of the charge bar for a percentage, `round(93 * p / 100)`
pub fn fill_width(percentage: u8) -> u32 {
    (FILL_MAX_WIDTH * percentage as u32 + 50) / 100
}

pub fn fill_color(percentage: u8) -> Rgb888 {
    if percentage > LOW_BATTERY_THRESHOLD {
        FILL_COLOR
    } else {
        LOW_FILL_COLOR
    }
}

/// Absolute bolt vertices for the fixed canvas
pub fn bolt_points() -> [Point; 6] {
    let center = Point::new(ICON_WIDTH as i32 / 2, ICON_HEIGHT as i32 / 2);
    BOLT_OFFSETS.map(|(dx, dy)| center + Point::new(dx, dy))
}

/// `DrawTarget` over an RGBA buffer; untouched pixels stay transparent
struct IconCanvas {
    image: RgbaImage,
}

impl OriginDimensions for IconCanvas {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

impl DrawTarget for IconCanvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(coord.x), u32::try_from(coord.y)) {
                if x < self.image.width() && y < self.image.height() {
                    self.image.put_pixel(x, y, Rgba([color.r(), color.g(), color.b(), 255]));
                }
            }
        }
        Ok(())
    }
}

/// Draw the battery icon for a frame.
///
/// Output depends only on `percentage` and `charging`.
pub fn render(frame: &TelemetryFrame) -> RgbaImage {
    let mut canvas = IconCanvas {
        image: RgbaImage::from_pixel(ICON_WIDTH, ICON_HEIGHT, Rgba([255, 255, 255, 0])),
    };
    let width = ICON_WIDTH as i32;
    let height = ICON_HEIGHT as i32;

    // Body outline
    let body = Rectangle::with_corners(Point::new(10, 12), Point::new(width - 35, height - 12));
    let body_style = PrimitiveStyleBuilder::new()
        .stroke_color(OUTLINE_COLOR)
        .stroke_width(BODY_STROKE)
        .stroke_alignment(StrokeAlignment::Inside)
        .build();
    draw(&mut canvas, RoundedRectangle::with_equal_corners(body, Size::new(BODY_RADIUS, BODY_RADIUS)).into_styled(body_style));

    // Head
    let head_origin = Point::new(width - 32, (height - HEAD_SIZE.height as i32) / 2);
    let head = Rectangle::with_corners(head_origin, head_origin + HEAD_SIZE);
    let head_style = PrimitiveStyleBuilder::new().fill_color(OUTLINE_COLOR).build();
    draw(&mut canvas, RoundedRectangle::with_equal_corners(head, Size::new(HEAD_RADIUS, HEAD_RADIUS)).into_styled(head_style));

    // Charge level
    let level_width = fill_width(frame.percentage);
    if level_width > 0 {
        let top = 11 + FILL_MARGIN;
        let bottom = height - 11 - FILL_MARGIN;
        let level = Rectangle::new(
            Point::new(9 + FILL_MARGIN, top),
            Size::new(level_width, (bottom - top + 1) as u32),
        );
        let level_style = PrimitiveStyleBuilder::new().fill_color(fill_color(frame.percentage)).build();
        draw(&mut canvas, RoundedRectangle::with_equal_corners(level, Size::new(FILL_RADIUS, FILL_RADIUS)).into_styled(level_style));
    }

    if frame.charging {
        draw_bolt(&mut canvas);
    }

    canvas.image
}

/// The bolt is two convex quads joined along their shared edge; each quad
/// is filled as two triangles with a 1px stroke to close the seams.
fn draw_bolt(canvas: &mut IconCanvas) {
    let [a, b, c, d, e, f] = bolt_points();
    let style = PrimitiveStyleBuilder::new()
        .fill_color(BOLT_COLOR)
        .stroke_color(BOLT_COLOR)
        .stroke_width(1)
        .build();
    for (p1, p2, p3) in [(a, b, c), (a, c, f), (c, d, e), (c, e, f)] {
        draw(canvas, Triangle::new(p1, p2, p3).into_styled(style));
    }
}

fn draw<D>(canvas: &mut IconCanvas, drawable: D)
where
    D: Drawable<Color = Rgb888>,
{
    let _ = drawable.draw(canvas);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bolt_points_match_canvas_centre() {
        let points = bolt_points();
        assert_eq!(points[0], Point::new(70, 12));
        assert_eq!(points[3], Point::new(60, 58));
    }

    #[test]
    fn full_battery_stays_inside_body() {
        // Inner edge of the 3px outline ends at x = 112
        assert_eq!(9 + FILL_MARGIN + fill_width(100) as i32 - 1, 109);
    }
}
