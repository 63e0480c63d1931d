use crate::html::{escape, escape_attribute};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Welcome,
    PasswordReset,
}

fn layout(subject: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(subject),
        body
    )
}

impl Template {
    pub fn render(self, first_name: &str, url: &str, subject: &str) -> String {
        let name = escape(first_name);
        let url = escape_attribute(url);
        let body = match self {
            Template::Welcome => format!(
                "<p>Hi {name},</p>\n\
                 <p>Welcome to Natours, we're glad to have you!</p>\n\
                 <p>We're all a big family here, so make sure to upload your user photo so we get to know you a bit better!</p>\n\
                 <p><a href=\"{url}\">Upload user photo</a></p>\n\
                 <p>If you need any help with booking your next tour, please don't hesitate to contact us!</p>\n\
                 <p>- The Natours team</p>"
            ),
            Template::PasswordReset => format!(
                "<p>Hi {name},</p>\n\
                 <p>Forgot your password? Submit a PATCH request with your new password and passwordConfirm to the link below.</p>\n\
                 <p><a href=\"{url}\">Reset your password</a></p>\n\
                 <p>If you didn't forget your password, please ignore this email!</p>"
            ),
        };
        layout(subject, &body)
    }
}
