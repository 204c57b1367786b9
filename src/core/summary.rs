//! Plain-text digest: buckets, then titles, then one line per showing.

use chrono::{Datelike, NaiveDate};
use std::fmt::Write;

use crate::domain::model::{Bucket, ClassifiedTitle, Digest};
use crate::utils::collation::PolishCollation;
use crate::utils::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryFormatter {
    show_links: bool,
}

impl SummaryFormatter {
    pub fn new(show_links: bool) -> Self {
        Self { show_links }
    }

    pub fn format(&self, digest: &Digest) -> Result<String> {
        let polish = PolishCollation::new()?;
        let mut out = String::new();

        for bucket in Bucket::ALL {
            let mut titles: Vec<&ClassifiedTitle> = digest.in_bucket(bucket).collect();
            if titles.is_empty() {
                continue;
            }
            titles.sort_by(|a, b| polish.compare(&a.title, &b.title));

            let _ = writeln!(out, "||{}||", bucket.header());
            for title in titles {
                self.write_title(&mut out, title);
            }
        }

        let _ = writeln!(out, "TOTAL: {}", digest.titles.len());

        let missing = digest.received.missing();
        if !missing.is_empty() {
            out.push_str("RESULTS NOT RECEIVED FROM:\n");
            for venue in missing {
                let _ = writeln!(out, "{}", venue.display_name());
            }
        }

        Ok(out)
    }

    fn write_title(&self, out: &mut String, title: &ClassifiedTitle) {
        let secondary = title
            .secondary_title
            .as_deref()
            .map(str::to_uppercase)
            .filter(|s| *s != title.title);
        match secondary {
            Some(secondary) => {
                let _ = writeln!(out, "|{}| ({})", title.title, secondary);
            }
            None => {
                let _ = writeln!(out, "|{}|", title.title);
            }
        }

        let mut last_date: Option<NaiveDate> = None;
        for showing in &title.showings {
            let date = showing.time.date_naive();
            if last_date != Some(date) {
                let _ = writeln!(out, "======{}======", day_month_year(date));
                last_date = Some(date);
            }

            let _ = write!(
                out,
                "{}  {}",
                showing.venue.display_name(),
                showing.time.format("%H:%M")
            );
            if let (true, Some(url)) = (self.show_links, &showing.url) {
                let _ = write!(out, "  {}", url);
            }
            out.push('\n');
        }

        out.push('\n');
    }
}

/// `DD/MM/YYYY`, used for date headers and the push title.
pub fn day_month_year(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{}", date.day(), date.month(), date.year())
}

pub fn summary_file_name(date: NaiveDate) -> String {
    format!("summary-{}.txt", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ReceivedSet, Showing};
    use crate::domain::venue::Venue;
    use chrono::{Local, TimeZone};

    fn at(day: u32, hour: u32, minute: u32) -> chrono::DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, day, hour, minute, 0).unwrap()
    }

    fn title(name: &str, bucket: Bucket, showings: Vec<Showing>) -> ClassifiedTitle {
        ClassifiedTitle {
            title: name.to_string(),
            bucket,
            showings,
            secondary_title: None,
            catalog_id: None,
            newly_seen: false,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_full_layout() {
        let mut received = ReceivedSet::expecting([Venue::Kika, Venue::Mikro, Venue::Sfinks]);
        received.mark(Venue::Kika);
        received.mark(Venue::Mikro);

        let mut flow = title(
            "FLOW",
            Bucket::NewToday,
            vec![
                Showing::new(Venue::Kika, at(17, 18, 0), Some("https://kika/1".into())),
                Showing::new(Venue::Mikro, at(17, 20, 30), None),
                Showing::new(Venue::Kika, at(18, 9, 5), None),
            ],
        );
        flow.secondary_title = Some("Straume".to_string());

        let digest = Digest {
            date: today(),
            titles: vec![
                flow,
                title(
                    "ANORA",
                    Bucket::LastWeek,
                    vec![Showing::new(Venue::Mikro, at(20, 21, 0), None)],
                ),
            ],
            received,
        };

        let expected = "\
||TODAY||
|FLOW| (STRAUME)
======17/10/2026======
Kika  18:00
Mikro  20:30
======18/10/2026======
Kika  09:05

||LAST WEEK||
|ANORA|
======20/10/2026======
Mikro  21:00

TOTAL: 2
RESULTS NOT RECEIVED FROM:
Sfinks
";
        assert_eq!(SummaryFormatter::new(false).format(&digest).unwrap(), expected);
    }

    #[test]
    fn test_links_are_appended_when_enabled() {
        let digest = Digest {
            date: today(),
            titles: vec![title(
                "FLOW",
                Bucket::Yesterday,
                vec![Showing::new(
                    Venue::Kijow,
                    at(17, 18, 0),
                    Some("https://kijow.pl/e/1".into()),
                )],
            )],
            received: ReceivedSet::expecting([Venue::Kijow]),
        };

        let text = SummaryFormatter::new(true).format(&digest).unwrap();
        assert!(text.contains("Kijów  18:00  https://kijow.pl/e/1\n"));
        assert!(text.starts_with("||YESTERDAY||\n"));
    }

    #[test]
    fn test_titles_follow_polish_order() {
        let digest = Digest {
            date: today(),
            titles: ["ŻYCIE", "ZAMEK", "ŁÓDŹ", "LATO", "ŚWIT"]
                .into_iter()
                .map(|t| title(t, Bucket::Earlier, Vec::new()))
                .collect(),
            received: ReceivedSet::default(),
        };

        let text = SummaryFormatter::default().format(&digest).unwrap();
        let order: Vec<&str> = text.lines().filter(|l| l.starts_with('|') && !l.starts_with("||")).collect();
        assert_eq!(order, vec!["|LATO|", "|ŁÓDŹ|", "|ŚWIT|", "|ZAMEK|", "|ŻYCIE|"]);
    }

    #[test]
    fn test_empty_digest_only_has_total() {
        let digest = Digest {
            date: today(),
            titles: Vec::new(),
            received: ReceivedSet::default(),
        };
        assert_eq!(SummaryFormatter::default().format(&digest).unwrap(), "TOTAL: 0\n");
    }

    #[test]
    fn test_secondary_title_equal_to_title_is_not_repeated() {
        let mut anora = title("ANORA", Bucket::NewToday, Vec::new());
        anora.secondary_title = Some("Anora".to_string());
        let mut flow = title("FLOW", Bucket::NewToday, Vec::new());
        flow.secondary_title = Some("Straume".to_string());

        let digest = Digest {
            date: today(),
            titles: vec![anora, flow],
            received: ReceivedSet::default(),
        };

        let text = SummaryFormatter::default().format(&digest).unwrap();
        assert!(text.contains("|ANORA|\n"));
        assert!(text.contains("|FLOW| (STRAUME)\n"));
    }

    #[test]
    fn test_file_and_push_names() {
        assert_eq!(summary_file_name(today()), "summary-2026-10-16.txt");
        assert_eq!(day_month_year(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()), "04/03/2026");
    }
}
