//! Paginated document rendering (PDF)
//!
//! Cover section, bordered striped statistics table, bordered
//! reading-history table, then landscape trend chart pages. Table layout
//! is an explicit cursor state machine: new-page -> draw-header ->
//! draw-rows, breaking to a fresh page (with the header re-emitted)
//! whenever the cursor crosses the bottom threshold. Every page gets a
//! running "Page X of Y" footer in a final pass.

use std::io::BufWriter;

use printpdf::path::PaintMode;
use printpdf::*;

use crate::analytics::classify::{Band, ReadingStatus};

use super::chart::{generate_bp_chart, generate_series_chart};
use super::ReportInputs;

// ============================================================================
// Page Geometry (Letter)
// ============================================================================

const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN_LEFT: f32 = 15.0;
const MARGIN_RIGHT: f32 = 15.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
const PAGE_BOTTOM_THRESHOLD: f32 = 25.0;

const TABLE_FONT_SIZE: f32 = 8.0;
const LINE_HEIGHT: f32 = 4.2;
const CELL_PADDING: f32 = 1.6;
/// Approximate Helvetica glyph advance per point of font size, in mm
const CHAR_WIDTH_FACTOR: f32 = 0.5 * 0.3528;

// ============================================================================
// Color Constants (RGB 0-255)
// ============================================================================

const COLOR_TITLE: (u8, u8, u8) = (0, 102, 153);
const COLOR_BLACK: (u8, u8, u8) = (0, 0, 0);
const COLOR_GRAY: (u8, u8, u8) = (128, 128, 128);
const COLOR_LIGHT_GRAY: (u8, u8, u8) = (220, 220, 220);
const COLOR_STRIPE: (u8, u8, u8) = (243, 243, 243);
const COLOR_NORMAL: (u8, u8, u8) = (0, 176, 80);
const COLOR_ATTENTION: (u8, u8, u8) = (255, 165, 0);
const COLOR_ABNORMAL: (u8, u8, u8) = (255, 0, 0);
const COLOR_LOW: (u8, u8, u8) = (0, 112, 192);

fn band_color(band: Band) -> (u8, u8, u8) {
    match band {
        Band::Low => COLOR_LOW,
        Band::Normal => COLOR_NORMAL,
        Band::High => COLOR_ABNORMAL,
    }
}

fn status_color(status: ReadingStatus) -> (u8, u8, u8) {
    match status {
        ReadingStatus::Normal => COLOR_NORMAL,
        ReadingStatus::Attention => COLOR_ATTENTION,
        ReadingStatus::Abnormal => COLOR_ABNORMAL,
    }
}

// ============================================================================
// Drawing Helpers
// ============================================================================

fn rgb_to_printpdf(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn add_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    x: Mm,
    y: Mm,
    size: f32,
    color: (u8, u8, u8),
) {
    layer.set_fill_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.use_text(text, size, x, y, font);
}

fn add_line(
    layer: &PdfLayerReference,
    x1: Mm,
    y1: Mm,
    x2: Mm,
    y2: Mm,
    color: (u8, u8, u8),
    width: f32,
) {
    layer.set_outline_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.set_outline_thickness(width);

    let line = Line {
        points: vec![(Point::new(x1, y1), false), (Point::new(x2, y2), false)],
        is_closed: false,
    };
    layer.add_line(line);
}

fn fill_rect(layer: &PdfLayerReference, x: f32, y: f32, width: f32, height: f32, color: (u8, u8, u8)) {
    layer.set_fill_color(rgb_to_printpdf(color.0, color.1, color.2));
    let rect = Rect::new(Mm(x), Mm(y), Mm(x + width), Mm(y + height)).with_mode(PaintMode::Fill);
    layer.add_rect(rect);
}

// ============================================================================
// Text Wrapping
// ============================================================================

/// Wrap text to a maximum number of characters per line, breaking words
/// longer than a full line
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > max {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(max).collect();
            word = &word[head.len()..];
            lines.push(head);
        }
        if word.is_empty() {
            continue;
        }
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Characters that fit in a column of the given width at the table font size
fn max_chars_for(width: f32) -> usize {
    (((width - 2.0 * CELL_PADDING) / (TABLE_FONT_SIZE * CHAR_WIDTH_FACTOR)) as usize).max(4)
}

// ============================================================================
// Document Writer
// ============================================================================

struct PageRef {
    page: PdfPageIndex,
    layer: PdfLayerIndex,
    width: f32,
}

/// Cursor state for the paginated document
struct DocWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    pages: Vec<PageRef>,
    layer: PdfLayerReference,
    y: f32,
}

impl DocWriter {
    fn new(title: &str) -> Result<Self, String> {
        let (doc, page, layer_idx) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Page 1");

        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| e.to_string())?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| e.to_string())?;

        let layer = doc.get_page(page).get_layer(layer_idx);

        Ok(Self {
            doc,
            font,
            font_bold,
            pages: vec![PageRef {
                page,
                layer: layer_idx,
                width: PAGE_WIDTH,
            }],
            layer,
            y: PAGE_HEIGHT - 20.0,
        })
    }

    /// Start a fresh portrait page and reset the cursor
    fn new_page(&mut self) {
        let name = format!("Page {}", self.pages.len() + 1);
        let (page, layer_idx) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), name);
        self.layer = self.doc.get_page(page).get_layer(layer_idx);
        self.pages.push(PageRef {
            page,
            layer: layer_idx,
            width: PAGE_WIDTH,
        });
        self.y = PAGE_HEIGHT - 20.0;
    }

    /// Start a fresh landscape page (used for chart embedding)
    fn new_landscape_page(&mut self) {
        let name = format!("Page {}", self.pages.len() + 1);
        let (page, layer_idx) = self.doc.add_page(Mm(PAGE_HEIGHT), Mm(PAGE_WIDTH), name);
        self.layer = self.doc.get_page(page).get_layer(layer_idx);
        self.pages.push(PageRef {
            page,
            layer: layer_idx,
            width: PAGE_HEIGHT,
        });
        self.y = PAGE_WIDTH - 20.0;
    }

    /// Break to a new page if fewer than `needed` millimeters remain
    fn ensure_room(&mut self, needed: f32) {
        if self.y - needed < PAGE_BOTTOM_THRESHOLD {
            self.new_page();
        }
    }

    /// Stamp footers and serialize the document
    fn finish(self) -> Result<Vec<u8>, String> {
        let total = self.pages.len();
        for (i, page_ref) in self.pages.iter().enumerate() {
            let layer = self.doc.get_page(page_ref.page).get_layer(page_ref.layer);
            add_text(
                &layer,
                &self.font,
                &format!("Page {} of {}", i + 1, total),
                Mm(page_ref.width / 2.0 - 8.0),
                Mm(10.0),
                8.0,
                COLOR_GRAY,
            );
        }

        let mut buffer = BufWriter::new(Vec::new());
        self.doc.save(&mut buffer).map_err(|e| e.to_string())?;
        buffer
            .into_inner()
            .map_err(|e| format!("Failed to flush document buffer: {}", e))
    }
}

// ============================================================================
// Table Rendering
// ============================================================================

struct TableSpec<'a> {
    headers: &'a [&'a str],
    widths: &'a [f32],
    /// Column whose text takes the row's status color
    status_col: Option<usize>,
}

struct TableRow {
    cells: Vec<String>,
    status_color: Option<(u8, u8, u8)>,
}

fn draw_row_borders(writer: &DocWriter, spec: &TableSpec, top: f32, height: f32) {
    let total_width: f32 = spec.widths.iter().sum();

    let mut x = MARGIN_LEFT;
    add_line(&writer.layer, Mm(x), Mm(top), Mm(x), Mm(top - height), COLOR_GRAY, 0.3);
    for width in spec.widths {
        x += width;
        add_line(&writer.layer, Mm(x), Mm(top), Mm(x), Mm(top - height), COLOR_GRAY, 0.3);
    }

    add_line(
        &writer.layer,
        Mm(MARGIN_LEFT),
        Mm(top - height),
        Mm(MARGIN_LEFT + total_width),
        Mm(top - height),
        COLOR_GRAY,
        0.3,
    );
}

fn draw_table_header(writer: &mut DocWriter, spec: &TableSpec) {
    let height = LINE_HEIGHT + 2.0 * CELL_PADDING;
    let top = writer.y;
    let total_width: f32 = spec.widths.iter().sum();

    fill_rect(&writer.layer, MARGIN_LEFT, top - height, total_width, height, COLOR_LIGHT_GRAY);
    add_line(
        &writer.layer,
        Mm(MARGIN_LEFT),
        Mm(top),
        Mm(MARGIN_LEFT + total_width),
        Mm(top),
        COLOR_GRAY,
        0.3,
    );

    let mut x = MARGIN_LEFT;
    for (i, header) in spec.headers.iter().enumerate() {
        add_text(
            &writer.layer,
            &writer.font_bold,
            header,
            Mm(x + CELL_PADDING),
            Mm(top - CELL_PADDING - 2.8),
            TABLE_FONT_SIZE,
            COLOR_BLACK,
        );
        x += spec.widths[i];
    }

    draw_row_borders(writer, spec, top, height);
    writer.y = top - height;
}

/// Draw a table with wrapped cells, striped rows, full borders, and page
/// re-flow with the header repeated after each break
fn draw_table(writer: &mut DocWriter, spec: &TableSpec, rows: &[TableRow]) {
    draw_table_header(writer, spec);

    for (index, row) in rows.iter().enumerate() {
        let wrapped: Vec<Vec<String>> = row
            .cells
            .iter()
            .zip(spec.widths)
            .map(|(cell, width)| wrap_text(cell, max_chars_for(*width)))
            .collect();
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(1);
        let row_height = line_count as f32 * LINE_HEIGHT + 2.0 * CELL_PADDING;

        if writer.y - row_height < PAGE_BOTTOM_THRESHOLD {
            writer.new_page();
            draw_table_header(writer, spec);
        }

        let top = writer.y;
        if index % 2 == 1 {
            let total_width: f32 = spec.widths.iter().sum();
            fill_rect(&writer.layer, MARGIN_LEFT, top - row_height, total_width, row_height, COLOR_STRIPE);
        }

        let mut x = MARGIN_LEFT;
        for (col, cell_lines) in wrapped.iter().enumerate() {
            let color = if spec.status_col == Some(col) {
                row.status_color.unwrap_or(COLOR_BLACK)
            } else {
                COLOR_BLACK
            };
            for (line_index, line) in cell_lines.iter().enumerate() {
                add_text(
                    &writer.layer,
                    &writer.font,
                    line,
                    Mm(x + CELL_PADDING),
                    Mm(top - CELL_PADDING - 2.8 - line_index as f32 * LINE_HEIGHT),
                    TABLE_FONT_SIZE,
                    color,
                );
            }
            x += spec.widths[col];
        }

        draw_row_borders(writer, spec, top, row_height);
        writer.y = top - row_height;
    }
}

// ============================================================================
// Sections
// ============================================================================

fn change_text(change_percent: f64) -> String {
    format!("{:+.2}%", change_percent)
}

fn draw_cover(writer: &mut DocWriter, inputs: &ReportInputs) {
    add_text(
        &writer.layer,
        &writer.font_bold,
        "Health History Report",
        Mm(MARGIN_LEFT),
        Mm(writer.y),
        18.0,
        COLOR_TITLE,
    );
    writer.y -= 10.0;

    add_text(
        &writer.layer,
        &writer.font,
        &format!("Patient: {}", inputs.subject.name),
        Mm(MARGIN_LEFT),
        Mm(writer.y),
        11.0,
        COLOR_BLACK,
    );
    let age = inputs
        .subject
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());
    add_text(
        &writer.layer,
        &writer.font,
        &format!("Age: {}", age),
        Mm(120.0),
        Mm(writer.y),
        11.0,
        COLOR_BLACK,
    );
    writer.y -= 6.0;

    let height = inputs
        .subject
        .height_cm
        .map(|h| format!("{} cm", h))
        .unwrap_or_else(|| "-".to_string());
    add_text(
        &writer.layer,
        &writer.font,
        &format!("Height: {}", height),
        Mm(MARGIN_LEFT),
        Mm(writer.y),
        11.0,
        COLOR_BLACK,
    );
    add_text(
        &writer.layer,
        &writer.font,
        &format!("Generated: {}", inputs.generated_at),
        Mm(120.0),
        Mm(writer.y),
        11.0,
        COLOR_BLACK,
    );
    writer.y -= 6.0;

    add_text(
        &writer.layer,
        &writer.font,
        &format!(
            "Report Period: {} to {}",
            inputs.period.start_date, inputs.period.end_date
        ),
        Mm(MARGIN_LEFT),
        Mm(writer.y),
        11.0,
        COLOR_BLACK,
    );
    writer.y -= 8.0;

    add_line(
        &writer.layer,
        Mm(MARGIN_LEFT),
        Mm(writer.y),
        Mm(PAGE_WIDTH - MARGIN_RIGHT),
        Mm(writer.y),
        COLOR_GRAY,
        0.5,
    );
    writer.y -= 10.0;
}

fn statistics_rows(inputs: &ReportInputs) -> Vec<TableRow> {
    let mut rows = Vec::new();
    let stats = &inputs.statistics;

    if let Some(ref bp) = stats.blood_pressure {
        rows.push(TableRow {
            cells: vec![
                "Blood Pressure".to_string(),
                format!("{:.2}/{:.2} mmHg", bp.avg_systolic, bp.avg_diastolic),
                change_text(bp.change_percent),
                bp.status.as_str().to_string(),
                bp.normal_range.clone(),
            ],
            status_color: Some(band_color(bp.status)),
        });
    }
    if let Some(ref sugar) = stats.blood_sugar {
        rows.push(TableRow {
            cells: vec![
                "Blood Sugar".to_string(),
                format!("{:.2} mg/dL", sugar.average),
                change_text(sugar.change_percent),
                sugar.status.as_str().to_string(),
                sugar.normal_range.clone(),
            ],
            status_color: Some(band_color(sugar.status)),
        });
    }
    if let Some(ref weight) = stats.weight {
        rows.push(TableRow {
            cells: vec![
                "Weight".to_string(),
                format!("{:.2} kg", weight.average),
                change_text(weight.change_percent),
                weight.status.as_str().to_string(),
                weight.normal_range.clone(),
            ],
            status_color: Some(band_color(weight.status)),
        });
    }
    if let Some(ref activity) = stats.activity {
        rows.push(TableRow {
            cells: vec![
                "Activity".to_string(),
                format!(
                    "{} sessions (~{} steps)",
                    activity.session_count, activity.estimated_steps
                ),
                change_text(activity.change_percent),
                activity.status.as_str().to_string(),
                "-".to_string(),
            ],
            status_color: Some(band_color(activity.status)),
        });
    }

    rows
}

fn draw_statistics(writer: &mut DocWriter, inputs: &ReportInputs) {
    writer.ensure_room(30.0);
    add_text(
        &writer.layer,
        &writer.font_bold,
        "Statistics",
        Mm(MARGIN_LEFT),
        Mm(writer.y),
        12.0,
        COLOR_BLACK,
    );
    writer.y -= 7.0;

    let rows = statistics_rows(inputs);
    if rows.is_empty() {
        add_text(
            &writer.layer,
            &writer.font,
            "No measurements recorded for this period.",
            Mm(MARGIN_LEFT),
            Mm(writer.y),
            10.0,
            COLOR_GRAY,
        );
        writer.y -= 10.0;
        return;
    }

    let spec = TableSpec {
        headers: &["Metric", "Average", "Change", "Status", "Normal Range"],
        widths: &[36.0, 52.0, 22.0, 24.0, CONTENT_WIDTH - 36.0 - 52.0 - 22.0 - 24.0],
        status_col: Some(3),
    };
    draw_table(writer, &spec, &rows);
    writer.y -= 8.0;
}

fn draw_history(writer: &mut DocWriter, inputs: &ReportInputs) {
    writer.ensure_room(30.0);
    add_text(
        &writer.layer,
        &writer.font_bold,
        "Reading History",
        Mm(MARGIN_LEFT),
        Mm(writer.y),
        12.0,
        COLOR_BLACK,
    );
    writer.y -= 7.0;

    if inputs.reading_history.is_empty() {
        add_text(
            &writer.layer,
            &writer.font,
            "No readings recorded for this period.",
            Mm(MARGIN_LEFT),
            Mm(writer.y),
            10.0,
            COLOR_GRAY,
        );
        writer.y -= 10.0;
        return;
    }

    let rows: Vec<TableRow> = inputs
        .reading_history
        .iter()
        .map(|entry| TableRow {
            cells: vec![
                entry.timestamp.replace('T', " "),
                entry.family.display_name().to_string(),
                entry.value.clone(),
                entry.status.as_str().to_string(),
                entry.notes.clone().unwrap_or_default(),
            ],
            status_color: Some(status_color(entry.status)),
        })
        .collect();

    let spec = TableSpec {
        headers: &["Date", "Metric", "Value", "Status", "Notes"],
        widths: &[36.0, 28.0, 38.0, 22.0, CONTENT_WIDTH - 36.0 - 28.0 - 38.0 - 22.0],
        status_col: Some(3),
    };
    draw_table(writer, &spec, &rows);
    writer.y -= 8.0;
}

fn embed_chart(writer: &mut DocWriter, title: &str, chart: Result<Vec<u8>, String>) {
    writer.new_landscape_page();

    add_text(
        &writer.layer,
        &writer.font_bold,
        title,
        Mm(MARGIN_LEFT),
        Mm(writer.y),
        16.0,
        COLOR_TITLE,
    );
    writer.y -= 10.0;

    match chart {
        Ok(png_bytes) => match printpdf::image_crate::load_from_memory(&png_bytes) {
            Ok(dynamic_image) => {
                let pdf_image = Image::from_dynamic_image(&dynamic_image);

                // 1000x400 pixels at 120 DPI = ~212mm x 85mm
                let transform = ImageTransform {
                    translate_x: Some(Mm(MARGIN_LEFT)),
                    translate_y: Some(Mm(writer.y - 90.0)),
                    dpi: Some(120.0),
                    ..Default::default()
                };

                pdf_image.add_to_layer(writer.layer.clone(), transform);
                writer.y -= 95.0;
            }
            Err(e) => {
                add_text(
                    &writer.layer,
                    &writer.font,
                    &format!("Chart decode error: {}", e),
                    Mm(MARGIN_LEFT),
                    Mm(writer.y - 10.0),
                    9.0,
                    COLOR_ABNORMAL,
                );
                writer.y -= 15.0;
            }
        },
        Err(e) => {
            add_text(
                &writer.layer,
                &writer.font,
                &format!("Chart generation error: {}", e),
                Mm(MARGIN_LEFT),
                Mm(writer.y - 10.0),
                9.0,
                COLOR_GRAY,
            );
            writer.y -= 15.0;
        }
    }
}

fn draw_chart_pages(writer: &mut DocWriter, inputs: &ReportInputs) {
    let quarter = &inputs.charts.quarter;

    if !quarter.blood_pressure.is_empty() {
        embed_chart(
            writer,
            "Blood Pressure Trend (90 days)",
            generate_bp_chart(&quarter.blood_pressure, 1000, 400),
        );
    }
    if !quarter.blood_sugar.is_empty() {
        embed_chart(
            writer,
            "Blood Sugar Trend (90 days)",
            generate_series_chart("Blood Sugar (avg)", "mg/dL", COLOR_ATTENTION, &quarter.blood_sugar, 1000, 400),
        );
    }
    if !quarter.weight.is_empty() {
        embed_chart(
            writer,
            "Weight Trend (90 days)",
            generate_series_chart("Weight (avg)", "kg", COLOR_NORMAL, &quarter.weight, 1000, 400),
        );
    }
    if !quarter.heart_rate.is_empty() {
        embed_chart(
            writer,
            "Heart Rate Trend (90 days)",
            generate_series_chart("Heart Rate (avg)", "bpm", (112, 48, 160), &quarter.heart_rate, 1000, 400),
        );
    }
}

/// Render the full paginated document
pub fn render_document(inputs: &ReportInputs) -> Result<Vec<u8>, String> {
    let mut writer = DocWriter::new("Health History Report")?;

    draw_cover(&mut writer, inputs);
    draw_statistics(&mut writer, inputs);
    draw_history(&mut writer, inputs);
    draw_chart_pages(&mut writer, inputs);

    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::super::tests::empty_inputs;
    use super::*;
    use crate::analytics::aggregate::summarize;
    use crate::analytics::history::build_history;
    use crate::models::HealthRecord;

    #[test]
    fn test_wrap_text_plain() {
        assert_eq!(wrap_text("short", 20), vec!["short"]);
        assert_eq!(wrap_text("", 20), vec![""]);
    }

    #[test]
    fn test_wrap_text_wraps_on_word_boundaries() {
        let lines = wrap_text("took reading after the morning walk", 14);
        assert_eq!(lines, vec!["took reading", "after the", "morning walk"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 14));
    }

    #[test]
    fn test_wrap_text_hard_breaks_long_words() {
        let lines = wrap_text("pneumonoultramicroscopic", 10);
        assert_eq!(lines, vec!["pneumonoul", "tramicrosc", "opic"]);
    }

    #[test]
    fn test_max_chars_shrinks_with_column() {
        assert!(max_chars_for(20.0) < max_chars_for(60.0));
        assert!(max_chars_for(0.0) >= 4);
    }

    fn full_record(id: i64, timestamp: &str) -> HealthRecord {
        HealthRecord {
            id,
            timestamp: timestamp.to_string(),
            systolic: Some(128),
            diastolic: Some(82),
            blood_sugar: Some(105),
            weight: Some(71.5),
            height: Some(175),
            heart_rate: Some(74),
            activity: Some("30 min walk".to_string()),
            notes: Some("taken after breakfast, seated and rested".to_string()),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_empty_inputs_produce_a_document() {
        let bytes = render_document(&empty_inputs()).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn test_long_history_still_renders() {
        let records: Vec<HealthRecord> = (0..40)
            .map(|i| full_record(i, &format!("2026-02-{:02}T08:00:00", (i % 28) + 1)))
            .collect();
        let mut inputs = empty_inputs();
        inputs.statistics = summarize(&records, &[], &[]);
        inputs.reading_history = build_history(&records);

        let empty_len = render_document(&empty_inputs()).unwrap().len();
        let bytes = render_document(&inputs).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
        // 200 history entries span multiple pages of table content
        assert!(bytes.len() > empty_len);
    }
}
