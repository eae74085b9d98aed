//! Report renderer. Pure formatting of a Report into one Markdown text block.

use crate::domain::report::SAMPLE_LIMIT;
use crate::domain::{ActivityPoint, Report, UserActivity};

pub const NO_SAMPLES: &str = "No samples.";
pub const NO_USERS: &str = "No users with unproductive messages.";
pub const NO_ACTIVITY: &str = "No activity data.";

/// Render the report. Section order is fixed: header, summary, samples,
/// users, hourly activity, indicator.
pub fn render_report(report: &Report) -> String {
    let mut md = String::new();

    md.push_str(&format!(
        "📊 *Chat report*: {} for {}\n\n",
        report.chat_title,
        report.date.format("%d.%m.%Y")
    ));

    md.push_str("📋 *Summary:*\n");
    md.push_str(&format!("Total messages: {}\n", report.total_messages));
    md.push_str(&format!("Productive messages: {}\n", report.productive_messages));
    md.push_str(&format!(
        "Unproductive messages: {}\n",
        report.unproductive_messages
    ));
    md.push_str(&format!(
        "Unproductive share: {:.2}%\n",
        report.unproductive_percentage
    ));
    if report.pending_messages > 0 {
        md.push_str(&format!(
            "Awaiting classification: {}\n",
            report.pending_messages
        ));
    }
    md.push('\n');

    md.push_str("🚫 *Unproductive message samples:*\n");
    md.push_str(&format_samples(
        &report.unproductive_samples,
        report.unproductive_messages,
    ));
    md.push('\n');

    md.push_str("👥 *Most distracting users:*\n");
    md.push_str(&format_top_users(&report.top_distracting_users));
    md.push('\n');

    md.push_str("📈 *Unproductive activity by hour:*\n");
    md.push_str(&format_timeline(&report.activity_timeline));
    md.push('\n');

    md.push_str(&format!("📌 *Productivity indicator*: {}", report.indicator));
    md
}

fn format_samples(samples: &[String], unproductive_total: usize) -> String {
    if samples.is_empty() {
        return format!("{}\n", NO_SAMPLES);
    }
    let mut out = String::new();
    for sample in samples.iter().take(SAMPLE_LIMIT) {
        out.push_str(&format!("- {}\n", sample));
    }
    let shown = samples.len().min(SAMPLE_LIMIT);
    if unproductive_total > shown {
        out.push_str(&format!("…and {} more\n", unproductive_total - shown));
    }
    out
}

fn format_top_users(users: &[UserActivity]) -> String {
    if users.is_empty() {
        return format!("{}\n", NO_USERS);
    }
    users
        .iter()
        .map(|u| format!("- {}: {} messages\n", u.user_name, u.count))
        .collect()
}

fn format_timeline(timeline: &[ActivityPoint]) -> String {
    if timeline.is_empty() {
        return format!("{}\n", NO_ACTIVITY);
    }
    timeline
        .iter()
        .map(|p| {
            format!(
                "- {}: {} messages\n",
                p.timestamp.format("%d.%m.%Y %H:00"),
                p.count
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductivityIndicator;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn report() -> Report {
        Report {
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            chat_id: 42,
            chat_title: "Backend".into(),
            total_messages: 3,
            productive_messages: 1,
            unproductive_messages: 2,
            pending_messages: 0,
            unproductive_percentage: 200.0 / 3.0,
            unproductive_samples: vec!["lol".into(), "meme".into()],
            top_distracting_users: vec![UserActivity {
                user_name: "A".into(),
                count: 2,
            }],
            activity_timeline: vec![ActivityPoint {
                timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap(),
                count: 1,
            }],
            indicator: ProductivityIndicator::Low,
        }
    }

    #[test]
    fn test_render_sections_in_order() {
        let text = render_report(&report());
        assert!(text.starts_with("📊 *Chat report*: Backend for 05.03.2024"));
        assert!(text.contains("Unproductive share: 66.67%"));
        assert!(text.contains("- lol\n- meme\n"));
        assert!(text.contains("- A: 2 messages"));
        assert!(text.contains("- 05.03.2024 10:00: 1 messages"));
        assert!(text.ends_with("📌 *Productivity indicator*: low productivity"));
        assert!(!text.contains("Awaiting classification"));

        let positions: Vec<usize> = ["📋", "🚫", "👥", "📈", "📌"]
            .iter()
            .map(|marker| text.find(marker).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_sections_render_placeholders() {
        let mut r = report();
        r.unproductive_samples.clear();
        r.top_distracting_users.clear();
        r.activity_timeline.clear();
        r.unproductive_messages = 0;
        r.pending_messages = 4;
        let text = render_report(&r);
        assert!(text.contains(NO_SAMPLES));
        assert!(text.contains(NO_USERS));
        assert!(text.contains(NO_ACTIVITY));
        assert!(text.contains("Awaiting classification: 4"));
    }

    #[test]
    fn test_samples_truncated_with_remainder() {
        let samples: Vec<String> = (0..10).map(|i| format!("s{}", i)).collect();
        let out = format_samples(&samples, 14);
        assert_eq!(out.lines().count(), 11);
        assert!(out.ends_with("…and 4 more\n"));
        assert!(!format_samples(&samples, 10).contains("more"));
    }
}
