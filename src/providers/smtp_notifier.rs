//! SMTP booking notifier using Lettre.

use crate::config::SmtpConfig;
use crate::error::{BookingError, Result};
use crate::providers::BookingNotifier;
use crate::types::{Booking, Departure, Trip};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// SMTP notifier using Lettre, suitable for production use.
///
/// Sends the customer confirmation and the operator alert as separate
/// messages; a fresh transport is built per message to avoid connection
/// pooling issues.
#[derive(Clone)]
pub struct SmtpNotifier {
    /// SMTP server address.
    server: String,
    /// SMTP server port.
    port: u16,
    /// SMTP credentials.
    credentials: Credentials,
    /// Sender email address.
    from_email: String,
    /// Sender display name.
    from_name: String,
    /// Operator address receiving booking alerts.
    operator_email: String,
}

impl SmtpNotifier {
    /// Create a new SMTP notifier from configuration.
    #[must_use]
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            server: config.server.clone(),
            port: config.port,
            credentials: Credentials::new(config.username.clone(), config.password.clone()),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
            operator_email: config.operator_email.clone(),
        }
    }

    fn build_transport(&self) -> Result<SmtpTransport> {
        let relay = SmtpTransport::relay(&self.server)
            .map_err(|e| BookingError::Email(format!("SMTP relay error: {e}")))?;
        Ok(relay
            .port(self.port)
            .credentials(self.credentials.clone())
            .build())
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    /// Build and send one message off the async runtime's worker threads.
    async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<()> {
        let email = Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|e| BookingError::Email(format!("Invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| BookingError::Email(format!("Invalid to address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .map_err(|e| BookingError::Email(format!("Failed to build email: {e}")))?;

        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            mailer
                .send(&email)
                .map_err(|e| BookingError::Email(format!("Failed to send email: {e}")))
        })
        .await
        .map_err(|e| BookingError::Email(format!("Email task failed: {e}")))?
        .map(|_| ())
    }

    fn created_body(booking: &Booking, trip: &Trip, departure: Option<&Departure>) -> String {
        let departure_line = departure.map_or_else(String::new, |d| {
            format!(
                r"<p><strong>Departure:</strong> {}</p>",
                d.date.format("%B %e, %Y")
            )
        });

        format!(
            r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Booking received</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #2563eb;">Thanks, {first_name} — we received your booking</h2>
        <p><strong>Booking number:</strong> {number}</p>
        <p><strong>Trip:</strong> {trip_name}</p>
        {departure_line}
        <p><strong>Travelers:</strong> {travelers}</p>
        <p><strong>Total:</strong> {total:.2}</p>
        <p style="color: #666; font-size: 14px;">
            Your booking is pending. We will confirm it shortly and send payment details.
        </p>
    </div>
</body>
</html>
            "#,
            first_name = booking.first_name,
            number = booking.booking_number,
            trip_name = trip.name,
            travelers = booking.travelers,
            total = booking.total_price,
        )
    }

    fn confirmed_body(booking: &Booking, trip: &Trip) -> String {
        format!(
            r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Booking confirmed</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #16a34a;">Your booking is confirmed</h2>
        <p><strong>Booking number:</strong> {number}</p>
        <p><strong>Trip:</strong> {trip_name}</p>
        <p>We look forward to traveling with you. Reply to this email with any questions.</p>
    </div>
</body>
</html>
            "#,
            number = booking.booking_number,
            trip_name = trip.name,
        )
    }

    fn operator_body(booking: &Booking, trip: &Trip) -> String {
        format!(
            r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>New booking</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2>New booking {number}</h2>
        <p>{first} {last} &lt;{email}&gt; booked <strong>{trip_name}</strong>
           for {travelers} traveler(s), total {total:.2}.</p>
    </div>
</body>
</html>
            "#,
            number = booking.booking_number,
            first = booking.first_name,
            last = booking.last_name,
            email = booking.email,
            trip_name = trip.name,
            travelers = booking.travelers,
            total = booking.total_price,
        )
    }
}

impl BookingNotifier for SmtpNotifier {
    async fn booking_created(
        &self,
        booking: &Booking,
        trip: &Trip,
        departure: Option<&Departure>,
    ) -> Result<()> {
        self.send(
            &booking.email,
            &format!("Booking received — {}", booking.booking_number),
            Self::created_body(booking, trip, departure),
        )
        .await?;

        self.send(
            &self.operator_email,
            &format!("New booking {} — {}", booking.booking_number, trip.name),
            Self::operator_body(booking, trip),
        )
        .await
    }

    async fn booking_confirmed(&self, booking: &Booking, trip: &Trip) -> Result<()> {
        self.send(
            &booking.email,
            &format!("Booking confirmed — {}", booking.booking_number),
            Self::confirmed_body(booking, trip),
        )
        .await
    }
}
