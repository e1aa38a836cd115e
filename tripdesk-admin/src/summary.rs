use chrono::NaiveDate;
use serde::Serialize;
use tripdesk_core::Booking;

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_bookings: usize,
    pub total_revenue: f64,
    pub total_travelers: i64,
    pub todays_bookings: usize,
}

impl DashboardSummary {
    pub fn from_rows(rows: &[Booking], today: NaiveDate) -> Self {
        Self {
            total_bookings: rows.len(),
            total_revenue: rows.iter().map(|b| b.price).sum(),
            total_travelers: rows.iter().map(|b| i64::from(b.people)).sum(),
            todays_bookings: rows.iter().filter(|b| b.travel_date == today).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_summary_totals() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mk = |id, people, price, date| Booking {
            id,
            name: "Guest".into(),
            email: "g@mail.com".into(),
            phone: None,
            location: "Hyderabad".into(),
            travel_date: date,
            people,
            place_name: "Araku".into(),
            price,
            created_at: Utc::now(),
        };
        let rows = vec![
            mk(1, 2, 6500.0, today),
            mk(2, 4, 9000.0, today.succ_opt().unwrap()),
        ];

        let s = DashboardSummary::from_rows(&rows, today);
        assert_eq!(s.total_bookings, 2);
        assert_eq!(s.total_revenue, 15500.0);
        assert_eq!(s.total_travelers, 6);
        assert_eq!(s.todays_bookings, 1);

        assert_eq!(DashboardSummary::from_rows(&[], today).total_revenue, 0.0);
    }
}
