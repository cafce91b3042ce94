//! Transactional email bodies

pub const PASSWORD_CHANGED_SUBJECT: &str = "Password Changed";
pub const RESET_PASSWORD_SUBJECT: &str = "Reset Your Password";
pub const CONFIRM_EMAIL_SUBJECT: &str = "Confirm Your Email";

/// Minimal HTML escaping for interpolated values
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
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

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 24px;">
      <h2 style="color: #222;">{title}</h2>
      {body}
    </div>
  </body>
</html>"#
    )
}

pub fn password_changed(name: &str, email: &str, support_email: Option<&str>) -> String {
    let support = match support_email {
        Some(address) => format!(
            r#"<p>If you did not make this change, contact us at <a href="mailto:{0}">{0}</a> right away.</p>"#,
            escape(address)
        ),
        None => "<p>If you did not make this change, contact support right away.</p>".to_string(),
    };

    layout(
        "Your password was changed",
        &format!(
            "<p>Hello {},</p>\n      <p>The password for <strong>{}</strong> was just changed.</p>\n      {}",
            escape(name),
            escape(email),
            support
        ),
    )
}

pub fn reset_password(name: &str, email: &str, link: &str) -> String {
    layout(
        "Reset your password",
        &format!(
            r#"<p>Hello {},</p>
      <p>We received a request to reset the password for <strong>{}</strong>.</p>
      <p><a href="{}" style="background: #222; color: #fff; padding: 10px 18px; text-decoration: none;">Reset password</a></p>
      <p>The link expires shortly. If you did not ask for a reset, ignore this email.</p>"#,
            escape(name),
            escape(email),
            escape(link)
        ),
    )
}

pub fn confirm_email(name: &str, link: &str) -> String {
    layout(
        "Confirm your email",
        &format!(
            r#"<p>Hello {},</p>
      <p>Please confirm your email address to activate your account.</p>
      <p><a href="{}" style="background: #222; color: #fff; padding: 10px 18px; text-decoration: none;">Confirm email</a></p>"#,
            escape(name),
            escape(link)
        ),
    )
}
