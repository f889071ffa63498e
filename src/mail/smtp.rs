//! SMTP delivery over lettre's async transport

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

use super::types::{InlineImage, MailError, MailResult, OutgoingEmail};
use super::MailTransport;
use crate::config::SmtpConfig;

/// Sends email through an SMTP relay.
///
/// With `secure` the connection uses implicit TLS (typically port 465);
/// otherwise it starts in plain text and upgrades with STARTTLS when the
/// server offers it. The connection is made lazily on first send.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    logo: Option<InlineImage>,
}

impl SmtpTransport {
    pub fn new(config: &SmtpConfig, logo: Option<InlineImage>) -> MailResult<Self> {
        let from = sender_mailbox(config)?;

        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Connection(e.to_string()))?
        } else {
            let tls = TlsParameters::new(config.host.clone())
                .map_err(|e| MailError::Config(e.to_string()))?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .tls(Tls::Opportunistic(tls))
        };

        let mut builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            secure = config.secure,
            inline_logo = logo.is_some(),
            "SMTP transport initialized"
        );

        Ok(Self {
            transport: builder.build(),
            from,
            logo,
        })
    }

    fn build_message(&self, email: &OutgoingEmail, message_id: &str) -> MailResult<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(email.subject.clone())
            .message_id(Some(message_id.to_string()));

        for to in &email.to {
            builder = builder.to(parse_mailbox(to)?);
        }
        for cc in &email.cc {
            builder = builder.cc(parse_mailbox(cc)?);
        }
        for bcc in &email.bcc {
            builder = builder.bcc(parse_mailbox(bcc)?);
        }
        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(parse_mailbox(reply_to)?);
        }

        let html = SinglePart::builder()
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone());

        let message = match &self.logo {
            Some(logo) => {
                let content_type = ContentType::parse(&logo.content_type)
                    .map_err(|e| MailError::Build(e.to_string()))?;
                let inline = Attachment::new_inline(logo.content_id.clone())
                    .body(logo.bytes.clone(), content_type);
                builder.multipart(MultiPart::related().singlepart(html).singlepart(inline))
            }
            None => builder.singlepart(html),
        };

        message.map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, email: OutgoingEmail) -> MailResult<String> {
        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain());
        let message = self.build_message(&email, &message_id)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;

        tracing::debug!(
            message_id = %message_id,
            recipients = email.recipient_count(),
            "SMTP relay accepted message"
        );

        Ok(message_id)
    }

    async fn verify(&self) -> bool {
        match self.transport.test_connection().await {
            Ok(connected) => connected,
            Err(e) => {
                tracing::warn!(error = %e, "SMTP connection check failed");
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

fn sender_mailbox(config: &SmtpConfig) -> MailResult<Mailbox> {
    let address = config
        .from
        .parse()
        .map_err(|e| MailError::Config(format!("smtp.from {:?}: {}", config.from, e)))?;

    Ok(Mailbox::new(config.from_name.clone(), address))
}

fn parse_mailbox(address: &str) -> MailResult<Mailbox> {
    address
        .parse()
        .map_err(|e| MailError::Address(format!("{}: {}", address, e)))
}
