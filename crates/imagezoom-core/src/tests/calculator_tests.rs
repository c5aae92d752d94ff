use super::*;

use crate::geometry::Point;
use proptest::prelude::*;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-4 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn image_that_fits_scales_to_native_resolution() {
    let scale = scale_factor(
        Size::new(800.0, 600.0),
        Size::new(100.0, 100.0),
        Size::new(1000.0, 800.0),
        60.0,
    );
    assert_eq!(scale, 8.0);
}

#[test]
fn tall_image_is_constrained_by_height() {
    // bounded viewport 940x740, thumb aspect 0.5 < 940/740
    let scale = scale_factor(
        Size::new(1000.0, 2000.0),
        Size::new(100.0, 200.0),
        Size::new(1000.0, 800.0),
        60.0,
    );
    assert!(approx_eq(scale, (740.0 / 2000.0) * 10.0));
    assert!(approx_eq(200.0 * scale, 740.0));
}

#[test]
fn wide_image_is_constrained_by_width() {
    let scale = scale_factor(
        Size::new(3000.0, 1000.0),
        Size::new(300.0, 100.0),
        Size::new(1000.0, 800.0),
        60.0,
    );
    assert!(approx_eq(scale, (940.0 / 3000.0) * 10.0));
    assert!(approx_eq(300.0 * scale, 940.0));
}

#[test]
fn full_size_equal_to_bounds_does_not_count_as_fitting() {
    // 940 is not strictly less than the bounded width
    let scale = scale_factor(
        Size::new(940.0, 100.0),
        Size::new(94.0, 10.0),
        Size::new(1000.0, 800.0),
        60.0,
    );
    assert!(approx_eq(scale, 10.0));
}

#[test]
fn degenerate_thumbnail_keeps_scale_at_one() {
    assert_eq!(
        scale_factor(
            Size::new(800.0, 600.0),
            Size::new(0.0, 100.0),
            Size::new(1000.0, 800.0),
            60.0
        ),
        1.0
    );
}

#[test]
fn translation_moves_thumb_center_to_viewport_center() {
    let thumb = Rect::new(20.0, 50.0, 100.0, 100.0);
    let viewport = Size::new(1000.0, 800.0);
    let transform = calculate_zoom(Size::new(800.0, 600.0), thumb, viewport, 60.0);

    assert_eq!(transform.translate_x, 500.0 - 70.0);
    assert_eq!(transform.translate_y, 400.0 - 100.0);
    assert_eq!(transform.apply(thumb).center(), Point::new(500.0, 400.0));
}

fn dimension() -> impl Strategy<Value = f32> {
    (1u32..4000).prop_map(|value| value as f32)
}

proptest! {
    #[test]
    fn fitting_images_scale_to_full_width_ratio(
        full_w in dimension(),
        full_h in dimension(),
        thumb_w in dimension(),
        thumb_h in dimension(),
        offset in 0u32..200,
    ) {
        let offset = offset as f32;
        let viewport = Size::new(full_w + offset + 1.0, full_h + offset + 1.0);
        let scale = scale_factor(
            Size::new(full_w, full_h),
            Size::new(thumb_w, thumb_h),
            viewport,
            offset,
        );
        prop_assert_eq!(scale, full_w / thumb_w);
    }

    #[test]
    fn oversized_images_reach_the_bound_in_the_constraining_dimension(
        full_w in dimension(),
        full_h in dimension(),
        thumb_w in dimension(),
        viewport_w in 200u32..3000,
        viewport_h in 200u32..3000,
        offset in 0u32..100,
    ) {
        let viewport = Size::new(viewport_w as f32, viewport_h as f32);
        let offset = offset as f32;
        let bounded = viewport.inset(offset);
        prop_assume!(full_w >= bounded.width || full_h >= bounded.height);

        // Thumbnails keep the aspect ratio of the full image.
        let thumb = Size::new(thumb_w, thumb_w * full_h / full_w);
        let scale = scale_factor(Size::new(full_w, full_h), thumb, viewport, offset);
        let zoomed = Size::new(thumb.width * scale, thumb.height * scale);

        let width_bound = approx_eq(zoomed.width, bounded.width);
        let height_bound = approx_eq(zoomed.height, bounded.height);
        prop_assert!(width_bound || height_bound);
        prop_assert!(zoomed.width <= bounded.width * 1.0001);
        prop_assert!(zoomed.height <= bounded.height * 1.0001);
    }

    #[test]
    fn zoomed_thumbnail_is_centered_in_viewport(
        full_w in dimension(),
        full_h in dimension(),
        x in -500i32..500,
        y in -500i32..500,
        thumb_w in dimension(),
        thumb_h in dimension(),
    ) {
        let thumb = Rect::new(x as f32, y as f32, thumb_w, thumb_h);
        let viewport = Size::new(1280.0, 720.0);
        let transform = calculate_zoom(Size::new(full_w, full_h), thumb, viewport, 60.0);
        let center = transform.apply(thumb).center();
        prop_assert!((center.x - 640.0).abs() < 0.5);
        prop_assert!((center.y - 360.0).abs() < 0.5);
    }
}
