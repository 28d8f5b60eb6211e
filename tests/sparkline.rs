//! Sparkline raster geometry and data-URI encoding.

use traymon::sparkline::{rasterize, render_data_uri, FillStyle, SparklineStyle};

fn style(width: u32, height: u32) -> SparklineStyle {
    SparklineStyle {
        width,
        height,
        ..SparklineStyle::default()
    }
}

#[test]
fn empty_series_renders_a_blank_image_of_configured_size() {
    let s = style(50, 30);
    let raster = rasterize(&[], &s);
    assert_eq!((raster.width, raster.height), (50, 30));
    assert!(raster.rgba.iter().all(|&b| b == 0), "expected fully transparent");
}

#[test]
fn two_point_series_spans_the_full_height() {
    let s = SparklineStyle {
        min_value: Some(0.0),
        max_value: Some(100.0),
        ..style(10, 8)
    };
    let raster = rasterize(&[0.0, 100.0], &s);
    // 0 maps to the bottom-left corner, 100 to the top-right corner
    assert_eq!(raster.pixel(0, 7)[3], 255);
    assert_eq!(raster.pixel(9, 0)[3], 255);
    // every row is touched somewhere (connected polyline)
    for y in 0..8 {
        assert!(
            (0..10).any(|x| raster.pixel(x, y)[3] == 255),
            "row {y} has no line pixel"
        );
    }
}

#[test]
fn constant_series_draws_at_mid_height() {
    // auto range on a constant series pads to [v-1, v+1] -> flat mid line
    let s = style(6, 9);
    let raster = rasterize(&[42.0, 42.0, 42.0], &s);
    let mid = 4; // (9-1) * 0.5
    for x in 0..6 {
        assert_eq!(raster.pixel(x, mid)[3], 255, "column {x} missing mid pixel");
    }
    assert_eq!(raster.pixel(0, 0)[3], 0);
    assert_eq!(raster.pixel(0, 8)[3], 0);
}

#[test]
fn configured_bounds_clamp_out_of_range_values() {
    let s = SparklineStyle {
        min_value: Some(0.0),
        max_value: Some(100.0),
        ..style(4, 6)
    };
    let raster = rasterize(&[500.0, 500.0], &s);
    // clamped to the top row, not out of bounds
    for x in 0..4 {
        assert_eq!(raster.pixel(x, 0)[3], 255);
    }
}

#[test]
fn solid_fill_reaches_the_baseline() {
    let s = SparklineStyle {
        min_value: Some(0.0),
        max_value: Some(100.0),
        fill_style: FillStyle::Solid,
        fill_color: "#102030".to_string(),
        ..style(5, 10)
    };
    let raster = rasterize(&[50.0, 50.0], &s);
    // below the mid line everything is opaque fill (or the line itself)
    for x in 0..5 {
        for y in 6..10 {
            assert_eq!(raster.pixel(x, y), [0x10, 0x20, 0x30, 255]);
        }
    }
    // above the line stays transparent
    assert_eq!(raster.pixel(2, 1)[3], 0);
}

#[test]
fn gradient_fill_fades_toward_the_baseline() {
    let s = SparklineStyle {
        min_value: Some(0.0),
        max_value: Some(100.0),
        fill_style: FillStyle::Gradient,
        ..style(5, 20)
    };
    let raster = rasterize(&[100.0, 100.0], &s);
    // line at the top row, fill fading below it
    let upper = raster.pixel(2, 2)[3];
    let lower = raster.pixel(2, 18)[3];
    assert!(upper > lower, "expected fade: {upper} !> {lower}");
    assert_eq!(raster.pixel(2, 19)[3], 0, "baseline should be transparent");
}

#[test]
fn oversized_dimensions_are_clamped_not_fatal() {
    // width * height * 4 would overflow u32 at these sizes
    let raster = rasterize(&[1.0, 2.0], &style(65_536, 65_536));
    assert_eq!((raster.width, raster.height), (4096, 4096));
    assert_eq!(raster.rgba.len(), 4096 * 4096 * 4);
    // the polyline still lands on the canvas
    assert!((0..raster.width).any(|x| raster.pixel(x, raster.height - 1)[3] == 255));
}

#[test]
fn data_uri_has_png_prefix() {
    let s = style(8, 8);
    let uri = render_data_uri(&[1.0, 2.0, 3.0], &s).unwrap();
    assert!(uri.starts_with("data:image/png;base64,"));
    assert!(uri.len() > "data:image/png;base64,".len());
}
