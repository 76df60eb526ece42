use chrono::{DateTime, FixedOffset, Utc};

use crate::domain::Voter;
use crate::timefmt::schedule_datetime;

const ACCENT: &str = "#080c18";
const FALLBACK_SENDER: &str = "Election Poll";

/// Association-level values shared by every notice in one dispatch.
#[derive(Debug, Clone)]
pub struct NoticeContext {
    pub association_name: Option<String>,
    pub logo_url: Option<String>,
    pub login_url: String,
    pub election_start: Option<DateTime<Utc>>,
    pub zone: FixedOffset,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotice {
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl NoticeContext {
    fn sender_label(&self) -> &str {
        self.association_name.as_deref().unwrap_or(FALLBACK_SENDER)
    }

    fn starts(&self) -> String {
        self.election_start
            .map(|start| schedule_datetime(start, self.zone))
            .unwrap_or_else(|| "TBA".to_string())
    }
}

/// Credential email for one voter.
pub fn render_notice(voter: &Voter, context: &NoticeContext) -> RenderedNotice {
    let subject = format!("Voting Credentials - {}", context.sender_label());
    RenderedNotice {
        html: render_html(voter, context),
        text: render_text(voter, context, &subject),
        subject,
    }
}

fn render_html(voter: &Voter, context: &NoticeContext) -> String {
    let sender = escape_html(context.sender_label());
    let association = escape_html(context.association_name.as_deref().unwrap_or("Association"));
    let header = match &context.logo_url {
        Some(logo) => format!(
            r#"<img src="{}" alt="{}" style="max-height:80px;width:auto;display:block;margin:0 auto;">"#,
            escape_html(logo),
            escape_html(context.association_name.as_deref().unwrap_or("Logo"))
        ),
        None => format!(r#"<h2 style="color:{ACCENT};margin:0;">{sender}</h2>"#),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Voting Credentials</title></head>
<body style="font-family:Helvetica,Arial,sans-serif;background:#f4f4f5;color:#1a1a1a;">
<div style="max-width:600px;margin:40px auto;background:#ffffff;border-radius:8px;">
<div style="text-align:center;padding:40px 40px 20px;">{header}</div>
<div style="padding:20px 40px 40px;">
<p>Hello <strong>{first} {last}</strong>,</p>
<p>You have been registered to vote in the upcoming <strong>{association}</strong> election. Below are your secure login credentials.</p>
<div style="background:#f8fafc;border:1px solid #e2e8f0;border-radius:8px;padding:24px;text-align:center;">
<p><span style="color:#64748b;">STUDENT ID</span><br><strong style="color:{ACCENT};font-family:monospace;">{student_id}</strong></p>
<p><span style="color:#64748b;">ONE-TIME PASSWORD</span><br><strong style="color:{ACCENT};font-family:monospace;">{password}</strong></p>
</div>
<p style="text-align:center;"><a href="{login_url}" style="background:{ACCENT};color:#ffffff;padding:16px 32px;border-radius:6px;text-decoration:none;">Login to Vote</a></p>
<h3 style="color:{ACCENT};">Election Schedule</h3>
<p><strong>Starts:</strong> {starts}</p>
<p style="font-size:13px;color:#666;"><strong>Note:</strong> You will only be able to login and cast your vote during this period. Please plan accordingly.</p>
</div>
<div style="text-align:center;padding:20px;font-size:12px;color:#94a3b8;">
<p>Secure Voting Platform</p>
<p>&copy; {year} {sender}. All rights reserved.</p>
</div>
</div>
</body>
</html>
"#,
        first = escape_html(&voter.first_name),
        last = escape_html(&voter.last_name),
        student_id = escape_html(&voter.student_id),
        password = escape_html(&voter.password),
        login_url = escape_html(&context.login_url),
        starts = escape_html(&context.starts()),
        year = context.year,
    )
}

fn render_text(voter: &Voter, context: &NoticeContext, subject: &str) -> String {
    format!(
        "{subject}\n\n\
         Hello {first} {last},\n\n\
         You have been registered to vote in the upcoming {association} election.\n\n\
         YOUR CREDENTIALS:\n\
         ------------------\n\
         Student ID: {student_id}\n\
         Password: {password}\n\
         ------------------\n\n\
         LOGIN HERE: {login_url}\n\n\
         ELECTION SCHEDULE:\n\
         Starts: {starts}\n\n\
         NOTE: You will only be able to login and cast your vote during this period.\n\n\
         Secure Voting Platform\n\
         \u{a9} {year} {sender}\n",
        first = voter.first_name,
        last = voter.last_name,
        association = context.association_name.as_deref().unwrap_or("Association"),
        student_id = voter.student_id,
        password = voter.password,
        login_url = context.login_url,
        starts = context.starts(),
        year = context.year,
        sender = context.sender_label(),
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
