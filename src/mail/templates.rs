use chrono::Utc;

pub const CONFIRMATION_SUBJECT: &str = "Email confirmation for SaleWallet";

/// Page returned to browsers after a successful confirmation.
pub const CONFIRMED_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <title>Account confirmed</title>
    <style>
      body {
        display: flex;
        align-items: center;
        justify-content: center;
        height: 100vh;
        font-family: Arial, sans-serif;
        background-color: #f5f7fa;
      }
      .card {
        padding: 32px;
        border-radius: 12px;
        background: #ffffff;
        box-shadow: 0 10px 25px rgba(0,0,0,0.1);
        text-align: center;
      }
      h1 { color: #97689B; }
      p { margin-top: 12px; color: #555; }
    </style>
  </head>
  <body>
    <div class="card">
      <h1>Account confirmed</h1>
      <p>Your email address has been successfully confirmed</p>
    </div>
  </body>
</html>
"#;

/// Minimal HTML escaping for text interpolated into mail bodies.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn confirmation_html(username: &str, link: &str) -> String {
    let username = escape_html(username);
    let link = escape_html(link);
    let sent_on = Utc::now().format("%Y-%m-%d %H:%M UTC");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>Account Confirmation</title>
</head>
<body style="margin:0;padding:20px;font-family:Helvetica, Arial, sans-serif;background:#f2f3f4;text-align:center;">
  <div style="display:inline-block;width:90%;max-width:360px;background:#ffffff;padding:24px;border-radius:8px;box-shadow:0 4px 12px rgba(0,0,0,0.1);text-align:left;box-sizing:border-box;">
    <h1 style="margin:0 0 24px 0;font-size:22px;color:#000000;line-height:1.2;">Hello, {username}!</h1>
    <p style="font-size:14px;line-height:1.5;color:#333333;">
      To activate your SaleWallet account, we need to verify your email.<br><br>
      Please click the button below to complete the verification.
    </p>
    <div style="text-align:center;margin:32px 0;">
      <a href="{link}" target="_blank" rel="noopener noreferrer"
         style="display:inline-block;padding:14px 50px;background:#97689B;color:#ffffff;text-decoration:none;border-radius:8px;font-size:14px;white-space:nowrap;">
        Activate Account
      </a>
    </div>
    <hr style="border:none;border-top:1px solid #e0e0e0;margin:20px 0;">
    <p style="font-size:10px;color:#999999;margin:0;text-align:center;">
      If you did not register for SaleWallet, please ignore this email.
    </p>
  </div>
  <p style="font-size:10px;color:#999999;margin-top:10px;">Sent on {sent_on}</p>
</body>
</html>
"#
    )
}

/// Plain-text alternative of [`confirmation_html`].
pub fn confirmation_text(username: &str, link: &str) -> String {
    format!(
        "Hello, {username}!\n\nTo activate your SaleWallet account, open this link:\n{link}\n\n\
         If you did not register for SaleWallet, please ignore this email.\n"
    )
}
