//! Productivity report value object and the aggregation that builds it.
//!
//! Aggregation is pure: the use case fetches messages and chat info, this
//! module only turns them into numbers.

use crate::domain::{Chat, DomainError, Label, Message};
use chrono::{DateTime, Duration, DurationRound, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum number of unproductive texts kept as samples.
pub const SAMPLE_LIMIT: usize = 10;

const LOW_PRODUCTIVITY_ABOVE: f64 = 50.0;
const HIGH_PRODUCTIVITY_BELOW: f64 = 20.0;

/// Aggregated statistics for one chat on one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub date: NaiveDate,
    pub chat_id: u64,
    pub chat_title: String,
    /// Classified messages only: `productive + unproductive`.
    pub total_messages: usize,
    pub productive_messages: usize,
    pub unproductive_messages: usize,
    /// Messages of the day that the classifier has not labeled yet.
    pub pending_messages: usize,
    pub unproductive_percentage: f64,
    pub unproductive_samples: Vec<String>,
    pub top_distracting_users: Vec<UserActivity>,
    pub activity_timeline: Vec<ActivityPoint>,
    pub indicator: ProductivityIndicator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserActivity {
    pub user_name: String,
    pub count: usize,
}

/// Unproductive message count for one hour bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityPoint {
    pub timestamp: DateTime<Utc>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductivityIndicator {
    High,
    Normal,
    Low,
}

impl ProductivityIndicator {
    /// `> 50%` is low, `< 20%` is high; both boundaries are normal.
    pub fn from_percentage(pct: f64) -> Self {
        if pct > LOW_PRODUCTIVITY_ABOVE {
            ProductivityIndicator::Low
        } else if pct < HIGH_PRODUCTIVITY_BELOW {
            ProductivityIndicator::High
        } else {
            ProductivityIndicator::Normal
        }
    }
}

impl fmt::Display for ProductivityIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProductivityIndicator::High => "high productivity",
            ProductivityIndicator::Normal => "normal",
            ProductivityIndicator::Low => "low productivity",
        };
        f.write_str(s)
    }
}

/// Build a report from the day's messages of `chat`.
///
/// # Errors
/// * `NoDataForPeriod` when `messages` is empty.
/// * `AwaitingClassification` when no message of the day is labeled yet.
pub fn aggregate(chat: &Chat, date: NaiveDate, messages: &[Message]) -> Result<Report, DomainError> {
    if messages.is_empty() {
        return Err(DomainError::NoDataForPeriod {
            chat_id: chat.id,
            date,
        });
    }

    let mut productive = 0usize;
    let mut unproductive = 0usize;
    let mut pending = 0usize;
    let mut samples = Vec::new();
    let mut per_user: BTreeMap<&str, usize> = BTreeMap::new();
    let mut per_hour: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();

    for msg in messages {
        match msg.label {
            Label::Productive => productive += 1,
            Label::Unproductive => {
                unproductive += 1;
                if samples.len() < SAMPLE_LIMIT {
                    samples.push(msg.text.clone());
                }
                *per_user.entry(msg.user_full_name.as_str()).or_default() += 1;
                *per_hour.entry(truncate_to_hour(msg.date)).or_default() += 1;
            }
            Label::Unclassified => pending += 1,
        }
    }

    let total = productive + unproductive;
    if total == 0 {
        return Err(DomainError::AwaitingClassification {
            chat_id: chat.id,
            date,
            pending,
        });
    }

    let unproductive_percentage = unproductive as f64 / total as f64 * 100.0;

    // BTreeMap yields names ascending; the stable sort keeps that order for equal counts.
    let mut top_distracting_users: Vec<UserActivity> = per_user
        .into_iter()
        .map(|(user_name, count)| UserActivity {
            user_name: user_name.to_string(),
            count,
        })
        .collect();
    top_distracting_users.sort_by(|a, b| b.count.cmp(&a.count));

    let activity_timeline = per_hour
        .into_iter()
        .map(|(timestamp, count)| ActivityPoint { timestamp, count })
        .collect();

    Ok(Report {
        date,
        chat_id: chat.id,
        chat_title: chat.title.clone(),
        total_messages: total,
        productive_messages: productive,
        unproductive_messages: unproductive,
        pending_messages: pending,
        unproductive_percentage,
        unproductive_samples: samples,
        top_distracting_users,
        activity_timeline,
        indicator: ProductivityIndicator::from_percentage(unproductive_percentage),
    })
}

fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(Duration::hours(1)).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChatType;
    use chrono::TimeZone;

    fn chat() -> Chat {
        Chat {
            id: 42,
            title: "Backend team".into(),
            kind: ChatType::Supergroup,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn msg(id: u64, label: Label, text: &str, user: &str, h: u32, m: u32) -> Message {
        Message {
            message_id: id,
            chat_id: 42,
            user_full_name: user.into(),
            text: text.into(),
            date: Utc.with_ymd_and_hms(2024, 3, 5, h, m, 0).unwrap(),
            label,
        }
    }

    #[test]
    fn test_end_to_end_example() {
        let messages = vec![
            msg(1, Label::Unproductive, "lol", "A", 10, 0),
            msg(2, Label::Productive, "ok", "B", 11, 0),
            msg(3, Label::Unproductive, "meme", "A", 11, 30),
        ];
        let report = aggregate(&chat(), day(), &messages).unwrap();

        assert_eq!(report.total_messages, 3);
        assert_eq!(report.productive_messages, 1);
        assert_eq!(report.unproductive_messages, 2);
        assert!((report.unproductive_percentage - 66.67).abs() < 0.01);
        assert_eq!(
            report.top_distracting_users,
            vec![UserActivity {
                user_name: "A".into(),
                count: 2
            }]
        );
        assert_eq!(
            report.activity_timeline,
            vec![
                ActivityPoint {
                    timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap(),
                    count: 1
                },
                ActivityPoint {
                    timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 11, 0, 0).unwrap(),
                    count: 1
                },
            ]
        );
        assert_eq!(report.indicator, ProductivityIndicator::Low);
        assert_eq!(report.unproductive_samples, vec!["lol", "meme"]);
        assert_eq!(report.chat_title, "Backend team");
    }

    #[test]
    fn test_no_messages_is_no_data() {
        let err = aggregate(&chat(), day(), &[]).unwrap_err();
        assert!(matches!(err, DomainError::NoDataForPeriod { chat_id: 42, .. }));
    }

    #[test]
    fn test_only_unclassified_awaits_classification() {
        let messages = vec![
            msg(1, Label::Unclassified, "a", "A", 9, 0),
            msg(2, Label::Unclassified, "b", "B", 9, 5),
        ];
        let err = aggregate(&chat(), day(), &messages).unwrap_err();
        assert!(matches!(
            err,
            DomainError::AwaitingClassification { pending: 2, .. }
        ));
    }

    #[test]
    fn test_unclassified_excluded_from_statistics() {
        let messages = vec![
            msg(1, Label::Productive, "deploy done", "A", 9, 0),
            msg(2, Label::Unclassified, "new", "B", 9, 5),
        ];
        let report = aggregate(&chat(), day(), &messages).unwrap();
        assert_eq!(report.total_messages, 1);
        assert_eq!(report.pending_messages, 1);
        assert_eq!(report.unproductive_percentage, 0.0);
        assert!(report.activity_timeline.is_empty());
        assert!(report.top_distracting_users.is_empty());
        assert_eq!(report.indicator, ProductivityIndicator::High);
    }

    #[test]
    fn test_totals_and_percentage_bounds() {
        let labels = [
            Label::Productive,
            Label::Unproductive,
            Label::Unproductive,
            Label::Productive,
            Label::Unproductive,
        ];
        for n in 1..=labels.len() {
            let messages: Vec<Message> = labels[..n]
                .iter()
                .enumerate()
                .map(|(i, l)| msg(i as u64, *l, "t", "U", 8 + i as u32, 0))
                .collect();
            let report = aggregate(&chat(), day(), &messages).unwrap();
            assert_eq!(
                report.total_messages,
                report.productive_messages + report.unproductive_messages
            );
            assert!((0.0..=100.0).contains(&report.unproductive_percentage));
            assert_eq!(
                report.unproductive_percentage == 0.0,
                report.unproductive_messages == 0
            );
        }
    }

    #[test]
    fn test_ties_broken_by_user_name() {
        let messages = vec![
            msg(1, Label::Unproductive, "x", "Zed", 10, 0),
            msg(2, Label::Unproductive, "x", "Amy", 10, 1),
            msg(3, Label::Unproductive, "x", "Bob", 10, 2),
            msg(4, Label::Unproductive, "x", "Bob", 10, 3),
        ];
        let report = aggregate(&chat(), day(), &messages).unwrap();
        let names: Vec<&str> = report
            .top_distracting_users
            .iter()
            .map(|u| u.user_name.as_str())
            .collect();
        assert_eq!(names, vec!["Bob", "Amy", "Zed"]);
    }

    #[test]
    fn test_timeline_sorted_and_unique() {
        let messages = vec![
            msg(1, Label::Unproductive, "x", "A", 15, 10),
            msg(2, Label::Unproductive, "x", "A", 9, 59),
            msg(3, Label::Unproductive, "x", "A", 15, 45),
            msg(4, Label::Unproductive, "x", "A", 9, 0),
        ];
        let report = aggregate(&chat(), day(), &messages).unwrap();
        let counts: Vec<usize> = report.activity_timeline.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![2, 2]);
        assert!(
            report
                .activity_timeline
                .windows(2)
                .all(|w| w[0].timestamp < w[1].timestamp)
        );
    }

    #[test]
    fn test_samples_capped() {
        let messages: Vec<Message> = (0..15)
            .map(|i| msg(i, Label::Unproductive, &format!("m{}", i), "A", 12, i as u32))
            .collect();
        let report = aggregate(&chat(), day(), &messages).unwrap();
        assert_eq!(report.unproductive_samples.len(), SAMPLE_LIMIT);
        assert_eq!(report.unproductive_samples[0], "m0");
        assert_eq!(report.unproductive_messages, 15);
    }

    #[test]
    fn test_indicator_boundaries() {
        assert_eq!(
            ProductivityIndicator::from_percentage(50.0),
            ProductivityIndicator::Normal
        );
        assert_eq!(
            ProductivityIndicator::from_percentage(20.0),
            ProductivityIndicator::Normal
        );
        assert_eq!(
            ProductivityIndicator::from_percentage(50.01),
            ProductivityIndicator::Low
        );
        assert_eq!(
            ProductivityIndicator::from_percentage(19.99),
            ProductivityIndicator::High
        );
        assert_eq!(ProductivityIndicator::Low.to_string(), "low productivity");
    }
}
