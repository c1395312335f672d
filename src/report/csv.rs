//! CSV report rendering
//!
//! Patient-info block, blank line, one row per reading-history entry, then
//! a statistics block grouped by metric family.

use crate::models::MetricFamily;

use super::ReportInputs;

/// Quote a field when it contains a separator, quote, or newline
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn push_row(out: &mut String, fields: &[&str]) {
    let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    out.push_str(&row.join(","));
    out.push('\n');
}

fn change_text(change_percent: f64) -> String {
    format!("{:+.2}%", change_percent)
}

/// Render the full CSV report
pub fn render_csv(inputs: &ReportInputs) -> String {
    let mut out = String::new();

    // Patient info block
    push_row(&mut out, &["Health History Report"]);
    push_row(&mut out, &["Name", &inputs.subject.name]);
    let age = inputs
        .subject
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());
    push_row(&mut out, &["Age", &age]);
    let height = inputs
        .subject
        .height_cm
        .map(|h| format!("{} cm", h))
        .unwrap_or_else(|| "-".to_string());
    push_row(&mut out, &["Height", &height]);
    push_row(
        &mut out,
        &[
            "Period",
            &format!("{} to {}", inputs.period.start_date, inputs.period.end_date),
        ],
    );
    push_row(&mut out, &["Generated", &inputs.generated_at]);
    out.push('\n');

    // Reading history, in the order given
    push_row(&mut out, &["Date", "Metric", "Value", "Status", "Notes"]);
    for entry in &inputs.reading_history {
        push_row(
            &mut out,
            &[
                &entry.timestamp,
                entry.family.display_name(),
                &entry.value,
                entry.status.as_str(),
                entry.notes.as_deref().unwrap_or(""),
            ],
        );
    }
    out.push('\n');

    // Statistics block, grouped by family
    push_row(&mut out, &["Statistics"]);
    push_row(&mut out, &["Metric", "Measure", "Value"]);

    if let Some(ref bp) = inputs.statistics.blood_pressure {
        let name = MetricFamily::BloodPressure.display_name();
        push_row(&mut out, &[name, "Average Systolic", &format!("{:.2}", bp.avg_systolic)]);
        push_row(&mut out, &[name, "Average Diastolic", &format!("{:.2}", bp.avg_diastolic)]);
        push_row(&mut out, &[name, "Readings", &bp.reading_count.to_string()]);
        push_row(&mut out, &[name, "Change", &change_text(bp.change_percent)]);
        push_row(&mut out, &[name, "Status", bp.status.as_str()]);
        push_row(&mut out, &[name, "Normal Range", &bp.normal_range]);
    }

    if let Some(ref sugar) = inputs.statistics.blood_sugar {
        let name = MetricFamily::BloodSugar.display_name();
        push_row(&mut out, &[name, "Average", &format!("{:.2}", sugar.average)]);
        push_row(&mut out, &[name, "Readings", &sugar.reading_count.to_string()]);
        push_row(&mut out, &[name, "Change", &change_text(sugar.change_percent)]);
        push_row(&mut out, &[name, "Status", sugar.status.as_str()]);
        push_row(&mut out, &[name, "Normal Range", &sugar.normal_range]);
    }

    if let Some(ref weight) = inputs.statistics.weight {
        let name = MetricFamily::Weight.display_name();
        push_row(&mut out, &[name, "Average", &format!("{:.2} kg", weight.average)]);
        push_row(&mut out, &[name, "Readings", &weight.reading_count.to_string()]);
        push_row(&mut out, &[name, "Change", &change_text(weight.change_percent)]);
        push_row(&mut out, &[name, "Status", weight.status.as_str()]);
        push_row(&mut out, &[name, "Normal Range", &weight.normal_range]);
    }

    if let Some(ref activity) = inputs.statistics.activity {
        let name = MetricFamily::Activity.display_name();
        push_row(&mut out, &[name, "Sessions", &activity.session_count.to_string()]);
        push_row(&mut out, &[name, "Estimated Steps", &activity.estimated_steps.to_string()]);
        push_row(&mut out, &[name, "Estimated Calories", &activity.estimated_calories.to_string()]);
        push_row(&mut out, &[name, "Change", &change_text(activity.change_percent)]);
    }

    out
}
