use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};
use lettre::Message;

use super::{OutgoingEmail, TransportError};

fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| TransportError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// Build the MIME message for `email`.
///
/// A single body goes out as one `text/plain` or `text/html` part; both
/// bodies become `multipart/alternative` with the plain-text part first.
pub fn build_message(from: &str, email: &OutgoingEmail) -> Result<Message, TransportError> {
    let builder = Message::builder()
        .from(parse_mailbox(from)?)
        .to(parse_mailbox(&email.to)?)
        .subject(email.subject.as_str());

    let message = match (email.text.as_deref(), email.html.as_deref()) {
        (Some(text), Some(html)) => builder.multipart(MultiPart::alternative_plain_html(
            text.to_string(),
            html.to_string(),
        ))?,
        (None, Some(html)) => builder
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?,
        (Some(text), None) => builder
            .header(ContentType::TEXT_PLAIN)
            .body(text.to_string())?,
        (None, None) => builder
            .header(ContentType::TEXT_PLAIN)
            .body(String::new())?,
    };

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(text: Option<&str>, html: Option<&str>) -> OutgoingEmail {
        OutgoingEmail {
            to: "ana@example.com".to_string(),
            subject: "Welcome aboard".to_string(),
            text: text.map(str::to_string),
            html: html.map(str::to_string),
        }
    }

    fn formatted(message: &Message) -> String {
        String::from_utf8_lossy(&message.formatted()).into_owned()
    }

    #[test]
    fn test_multipart_puts_text_before_html() {
        let message = build_message(
            "noreply@example.com",
            &email(Some("plain body"), Some("<p>html body</p>")),
        )
        .unwrap();
        let raw = formatted(&message);

        assert!(raw.contains("multipart/alternative"));
        let text_at = raw.find("text/plain").unwrap();
        let html_at = raw.find("text/html").unwrap();
        assert!(text_at < html_at);
        assert!(raw.contains("Subject: Welcome aboard"));
        assert!(raw.contains("MIME-Version: 1.0"));
    }

    #[test]
    fn test_single_html_part() {
        let message = build_message("noreply@example.com", &email(None, Some("<b>hi</b>"))).unwrap();
        let raw = formatted(&message);

        assert!(raw.contains("text/html"));
        assert!(!raw.contains("multipart"));
        assert!(raw.contains("<b>hi</b>"));
    }

    #[test]
    fn test_single_text_part() {
        let message = build_message("noreply@example.com", &email(Some("hi"), None)).unwrap();
        let raw = formatted(&message);

        assert!(raw.contains("text/plain"));
        assert!(!raw.contains("text/html"));
    }

    #[test]
    fn test_invalid_recipient() {
        let mut bad = email(Some("hi"), None);
        bad.to = "not an address".to_string();
        assert!(matches!(
            build_message("noreply@example.com", &bad),
            Err(TransportError::InvalidAddress { .. })
        ));
    }
}
