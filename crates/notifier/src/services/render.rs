//! Notification bodies.
//!
//! Both bodies come from Askama templates under `templates/email/`. The HTML
//! template escapes every user-supplied value.

use askama::Template;

use registration_notifier_core::{
    Email, NotificationMessage, REGISTRATION_SUBJECT, Sender, UserRecord,
};

/// Plain text template for the registration notification.
#[derive(Template)]
#[template(path = "email/new_registration.txt")]
struct RegistrationEmailText<'a> {
    name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    role: &'a str,
    status: &'a str,
    address: Option<&'a str>,
    portal_url: &'a str,
}

/// HTML template for the registration notification.
#[derive(Template)]
#[template(path = "email/new_registration.html")]
struct RegistrationEmailHtml<'a> {
    name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    role: &'a str,
    status: &'a str,
    address: Option<&'a str>,
    portal_url: &'a str,
}

/// Render the text and HTML bodies for `user`.
///
/// # Errors
///
/// Returns error if a template fails to render.
pub fn render_bodies(
    user: &UserRecord,
    portal_url: &str,
) -> Result<(String, String), askama::Error> {
    let text = RegistrationEmailText {
        name: user.display_name(),
        email: user.email(),
        phone: user.phone(),
        role: user.role(),
        status: user.status(),
        address: user.address(),
        portal_url,
    }
    .render()?;

    let html = RegistrationEmailHtml {
        name: user.display_name(),
        email: user.email(),
        phone: user.phone(),
        role: user.role(),
        status: user.status(),
        address: user.address(),
        portal_url,
    }
    .render()?;

    Ok((text, html))
}

/// Build the notification for `user` addressed to `recipients`.
///
/// # Errors
///
/// Returns error if a template fails to render.
pub fn compose_message(
    user: &UserRecord,
    recipients: Vec<Email>,
    from: Sender,
    portal_url: &str,
) -> Result<NotificationMessage, askama::Error> {
    let (text, html) = render_bodies(user, portal_url)?;

    Ok(NotificationMessage {
        from,
        to: recipients,
        subject: REGISTRATION_SUBJECT.to_string(),
        text,
        html,
        reply_to: user.reply_to().map(str::to_string),
    })
}
