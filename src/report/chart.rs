//! Trend chart generation (plotters)
//!
//! Renders day-series trend charts as PNG bytes for embedding into the
//! PDF document.

use printpdf::image_crate::{DynamicImage, ImageFormat, RgbImage};

use crate::analytics::trend::{BloodPressurePoint, TrendPoint};

fn short_date(date: &chrono::NaiveDate) -> String {
    date.format("%m/%d").to_string()
}

/// Generate a blood pressure trend chart as PNG bytes
pub fn generate_bp_chart(
    points: &[BloodPressurePoint],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    use plotters::prelude::*;

    if points.is_empty() {
        return Err("No data to chart".to_string());
    }

    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let y_min = points
            .iter()
            .map(|p| p.diastolic)
            .fold(f64::INFINITY, f64::min)
            .max(40.0)
            - 10.0;
        let y_max = points
            .iter()
            .map(|p| p.systolic)
            .fold(f64::NEG_INFINITY, f64::max)
            .min(220.0)
            + 10.0;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0..(points.len() as i32), y_min..y_max)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_labels(points.len().min(10))
            .x_label_formatter(&|x| {
                if *x >= 0 && (*x as usize) < points.len() {
                    short_date(&points[*x as usize].date)
                } else {
                    String::new()
                }
            })
            .y_desc("mmHg")
            .draw()
            .map_err(|e| e.to_string())?;

        // Reference lines at the High thresholds
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0, 140.0), (points.len() as i32, 140.0)],
                ShapeStyle::from(&RGBColor(255, 0, 0).mix(0.5)).stroke_width(1),
            )))
            .map_err(|e| e.to_string())?;

        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0, 90.0), (points.len() as i32, 90.0)],
                ShapeStyle::from(&RGBColor(255, 165, 0).mix(0.5)).stroke_width(1),
            )))
            .map_err(|e| e.to_string())?;

        // Systolic line
        let systolic_points: Vec<(i32, f64)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as i32, p.systolic))
            .collect();

        chart
            .draw_series(LineSeries::new(systolic_points.clone(), RED.stroke_width(2)))
            .map_err(|e| e.to_string())?
            .label("Systolic (avg)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

        chart
            .draw_series(
                systolic_points
                    .iter()
                    .map(|(x, y)| Circle::new((*x, *y), 3, RED.filled())),
            )
            .map_err(|e| e.to_string())?;

        // Diastolic line
        let diastolic_points: Vec<(i32, f64)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as i32, p.diastolic))
            .collect();

        chart
            .draw_series(LineSeries::new(diastolic_points.clone(), BLUE.stroke_width(2)))
            .map_err(|e| e.to_string())?
            .label("Diastolic (avg)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

        chart
            .draw_series(
                diastolic_points
                    .iter()
                    .map(|(x, y)| Circle::new((*x, *y), 3, BLUE.filled())),
            )
            .map_err(|e| e.to_string())?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
    }

    png_from_rgb(buffer, width, height)
}

/// Generate a single-series trend chart as PNG bytes
pub fn generate_series_chart(
    label: &str,
    y_desc: &str,
    color: (u8, u8, u8),
    points: &[TrendPoint],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    use plotters::prelude::*;

    if points.is_empty() {
        return Err("No data to chart".to_string());
    }

    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let raw_min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
        let raw_max = points
            .iter()
            .map(|p| p.value)
            .fold(f64::NEG_INFINITY, f64::max);
        let pad = ((raw_max - raw_min) * 0.15).max(1.0);
        let y_min = raw_min - pad;
        let y_max = raw_max + pad;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0..(points.len() as i32), y_min..y_max)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_labels(points.len().min(10))
            .x_label_formatter(&|x| {
                if *x >= 0 && (*x as usize) < points.len() {
                    short_date(&points[*x as usize].date)
                } else {
                    String::new()
                }
            })
            .y_desc(y_desc)
            .draw()
            .map_err(|e| e.to_string())?;

        let series_color = RGBColor(color.0, color.1, color.2);
        let series_points: Vec<(i32, f64)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as i32, p.value))
            .collect();

        chart
            .draw_series(LineSeries::new(
                series_points.clone(),
                series_color.stroke_width(2),
            ))
            .map_err(|e| e.to_string())?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], series_color.stroke_width(2))
            });

        chart
            .draw_series(
                series_points
                    .iter()
                    .map(|(x, y)| Circle::new((*x, *y), 3, series_color.filled())),
            )
            .map_err(|e| e.to_string())?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
    }

    png_from_rgb(buffer, width, height)
}

/// Convert an RGB buffer to PNG bytes
fn png_from_rgb(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, String> {
    let img = RgbImage::from_raw(width, height, buffer)
        .ok_or("Failed to create image from buffer")?;

    let mut png_bytes = Vec::new();
    let dyn_img = DynamicImage::ImageRgb8(img);
    dyn_img
        .write_to(&mut std::io::Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    Ok(png_bytes)
}
