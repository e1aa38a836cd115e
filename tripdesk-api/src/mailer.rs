use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;
use tripdesk_core::pii::mask_email;
use tripdesk_core::Booking;
use tripdesk_store::app_config::MailConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_confirmation(&self, booking: &Booking) -> Result<(), MailError>;
}

pub struct Confirmation {
    pub subject: String,
    pub html: String,
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Booking reference shown to the traveller.
pub fn reference(booking: &Booking) -> String {
    format!("#TRV-{}", booking.id)
}

pub fn render_confirmation(booking: &Booking) -> Confirmation {
    let subject = "Your Travel Booking is Confirmed".to_string();
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: auto;">
  <h2 style="color: #16a34a;">Booking Confirmed</h2>
  <p>Hello <strong>{name}</strong>,</p>
  <p>Your trip has been successfully booked. Here are your travel details:</p>
  <table style="width: 100%; border-collapse: collapse;">
    <tr><td><strong>Booking ID</strong></td><td>{reference}</td></tr>
    <tr><td><strong>Destination</strong></td><td>{place}</td></tr>
    <tr><td><strong>Travel Date</strong></td><td>{date}</td></tr>
    <tr><td><strong>People</strong></td><td>{people}</td></tr>
    <tr><td><strong>City</strong></td><td>{location}</td></tr>
    <tr><td><strong>Total Price</strong></td><td>&#8377;{price:.2}</td></tr>
  </table>
  <p>We look forward to making your journey memorable.</p>
  <p>Regards,<br/><strong>Travel Website Team</strong></p>
</div>"#,
        name = escape_html(&booking.name),
        reference = reference(booking),
        place = escape_html(&booking.place_name),
        location = escape_html(&booking.location),
        date = booking.travel_date.format("%d %B %Y"),
        people = booking.people,
        price = booking.price,
    );
    Confirmation { subject, html }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    cc: Option<Mailbox>,
}

impl SmtpMailer {
    /// Returns `None` when no SMTP host is configured.
    pub fn from_config(cfg: &MailConfig) -> Result<Option<Self>, MailError> {
        let Some(host) = cfg.smtp_host.as_deref() else {
            return Ok(None);
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(cfg.smtp_port);
        if let (Some(user), Some(pass)) = (&cfg.smtp_username, &cfg.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.expose().clone()));
        }

        let from = Mailbox::new(Some(cfg.from_name.clone()), cfg.from_email.parse::<Address>()?);
        let cc = cfg
            .admin_cc
            .as_deref()
            .map(|addr| addr.parse::<Address>().map(|a| Mailbox::new(None, a)))
            .transpose()?;

        Ok(Some(Self { transport: builder.build(), from, cc }))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_confirmation(&self, booking: &Booking) -> Result<(), MailError> {
        let Confirmation { subject, html } = render_confirmation(booking);
        let to = Mailbox::new(Some(booking.name.clone()), booking.email.parse::<Address>()?);

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML);
        if let Some(cc) = &self.cc {
            builder = builder.cc(cc.clone());
        }

        self.transport.send(builder.body(html)?).await?;
        Ok(())
    }
}

/// Stand-in used when SMTP is not configured: records the send in the log only.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_confirmation(&self, booking: &Booking) -> Result<(), MailError> {
        let Confirmation { subject, .. } = render_confirmation(booking);
        info!(booking_id = booking.id, to = %mask_email(&booking.email), %subject, "Confirmation mail (not sent, SMTP disabled)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn booking() -> Booking {
        Booking {
            id: 42,
            name: "Asha <Rao>".into(),
            email: "a@x.com".into(),
            phone: None,
            location: "Pune".into(),
            travel_date: NaiveDate::from_ymd_opt(2027, 1, 5).unwrap(),
            people: 2,
            place_name: "Coorg".into(),
            price: 12000.0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_confirmation_content() {
        let mail = render_confirmation(&booking());
        assert_eq!(mail.subject, "Your Travel Booking is Confirmed");
        assert!(mail.html.contains("Coorg"));
        assert!(mail.html.contains("#TRV-42"));
        assert!(mail.html.contains("05 January 2027"));
        assert!(mail.html.contains("12000.00"));
        assert!(mail.html.contains("Asha &lt;Rao&gt;"));
    }

    #[test]
    fn test_smtp_disabled_without_host() {
        assert!(SmtpMailer::from_config(&MailConfig::default()).unwrap().is_none());
    }
}
