use crate::braille::BrailleCanvas;
use crate::sizing::Rgb;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a filled, tinted circle (markers and cluster badges)
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32, tint: Rgb) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_tinted(cx + dx, cy + dy, tint);
            }
        }
    }
}

/// Fill the pixel rectangle spanned by two corners, clipped to the canvas
pub fn fill_rect(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32, tint: Rgb) {
    let max_x = (canvas.width() * 2) as i32 - 1;
    let max_y = (canvas.height() * 4) as i32 - 1;
    let (left, right) = (x0.min(x1).max(0), x0.max(x1).min(max_x));
    let (top, bottom) = (y0.min(y1).max(0), y0.max(y1).min(max_y));

    for y in top..=bottom {
        for x in left..=right {
            canvas.set_pixel_tinted(x, y, tint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_fill_rect_is_clipped() {
        let mut canvas = BrailleCanvas::new(2, 1);
        fill_rect(&mut canvas, -5, -5, 100, 100, (1, 1, 1));
        assert_eq!(canvas.to_string(), "⣿⣿");
        assert_eq!(canvas.tint(1, 0), Some((1, 1, 1)));
    }

    #[test]
    fn test_circle_tints_center() {
        let mut canvas = BrailleCanvas::new(4, 2);
        draw_circle(&mut canvas, 4, 4, 1, (9, 8, 7));
        assert_eq!(canvas.tint(2, 1), Some((9, 8, 7)));
    }
}
