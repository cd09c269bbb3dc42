//! CSV rendering of an analytics summary
//!
//! The format is hand-assembled: a summary header block, the per-day
//! table, then labeled sub-tables. String cells are double-quoted and
//! numeric cells are bare. Embedded quotes and newlines in page URLs or
//! referrers are NOT escaped; consumers of this export rely on the
//! column order, not on strict RFC 4180 parsing.

use super::aggregate::AnalyticsSummary;

/// Suggested download filename for a rendered export
pub fn export_filename(summary: &AnalyticsSummary) -> String {
    format!("analytics_{}_{}.csv", summary.start_date, summary.end_date)
}

pub fn render_csv(summary: &AnalyticsSummary) -> String {
    let mut out = String::new();

    out.push_str("\"Analytics Summary\"\n");
    out.push_str(&format!(
        "\"Period\",\"{}\",\"{}\"\n",
        summary.start_date, summary.end_date
    ));
    out.push_str(&format!("\"Total Views\",{}\n", summary.total_views));
    out.push_str(&format!("\"Unique Visitors\",{}\n", summary.unique_visitors));
    out.push('\n');

    out.push_str("Date,Views,Unique Visitors\n");
    for point in &summary.daily {
        out.push_str(&format!(
            "\"{}\",{},{}\n",
            point.date, point.views, point.unique_visitors
        ));
    }
    out.push('\n');

    out.push_str("\"Top Pages\"\n");
    out.push_str("Page,Views\n");
    for page in &summary.top_pages {
        out.push_str(&format!("\"{}\",{}\n", page.url, page.views));
    }
    out.push('\n');

    out.push_str("\"Devices\"\n");
    out.push_str("Device,Sessions,Percentage\n");
    for slice in &summary.devices {
        out.push_str(&format!(
            "\"{}\",{},{:.1}\n",
            slice.label, slice.count, slice.percentage
        ));
    }
    out.push('\n');

    out.push_str("\"Browsers\"\n");
    out.push_str("Browser,Sessions,Percentage\n");
    for slice in &summary.browsers {
        out.push_str(&format!(
            "\"{}\",{},{:.1}\n",
            slice.label, slice.count, slice.percentage
        ));
    }
    out.push('\n');

    out.push_str("\"Referrers\"\n");
    out.push_str("Referrer,Views,Percentage\n");
    for referrer in &summary.top_referrers {
        out.push_str(&format!(
            "\"{}\",{},{:.1}\n",
            referrer.referrer, referrer.count, referrer.percentage
        ));
    }
    out.push('\n');

    out.push_str("\"Visitor Flow\"\n");
    out.push_str("From,To,Count\n");
    for edge in &summary.visitor_flow {
        out.push_str(&format!("\"{}\",\"{}\",{}\n", edge.from, edge.to, edge.count));
    }
    out.push('\n');

    out.push_str("\"Web Vitals\"\n");
    out.push_str("Metric,Samples,Average\n");
    for vital in &summary.web_vitals {
        out.push_str(&format!(
            "\"{}\",{},{:.2}\n",
            vital.name, vital.samples, vital.average
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::aggregate::{DailyPoint, PageCount};

    fn two_day_summary() -> AnalyticsSummary {
        AnalyticsSummary {
            start_date: "2026-08-01".to_string(),
            end_date: "2026-08-02".to_string(),
            total_views: 12,
            unique_visitors: 3,
            daily: vec![
                DailyPoint {
                    date: "2026-08-01".to_string(),
                    views: 7,
                    unique_visitors: 2,
                },
                DailyPoint {
                    date: "2026-08-02".to_string(),
                    views: 5,
                    unique_visitors: 1,
                },
            ],
            top_pages: vec![PageCount {
                url: "/projects".to_string(),
                views: 9,
            }],
            top_referrers: vec![],
            devices: vec![],
            browsers: vec![],
            countries: vec![],
            hourly: vec![],
            visitor_flow: vec![],
            web_vitals: vec![],
        }
    }

    #[test]
    fn test_daily_table_shape() {
        let csv = render_csv(&two_day_summary());
        let lines: Vec<&str> = csv.lines().collect();

        let header_idx = lines
            .iter()
            .position(|l| *l == "Date,Views,Unique Visitors")
            .expect("daily header missing");
        assert_eq!(lines[header_idx + 1], "\"2026-08-01\",7,2");
        assert_eq!(lines[header_idx + 2], "\"2026-08-02\",5,1");
        // table ends after exactly two data rows
        assert_eq!(lines[header_idx + 3], "");
    }

    #[test]
    fn test_strings_quoted_numbers_bare() {
        let csv = render_csv(&two_day_summary());
        assert!(csv.contains("\"/projects\",9\n"));
        assert!(csv.contains("\"Total Views\",12\n"));
    }

    #[test]
    fn test_filename() {
        assert_eq!(
            export_filename(&two_day_summary()),
            "analytics_2026-08-01_2026-08-02.csv"
        );
    }
}
