use html_escape::{encode_double_quoted_attribute, encode_text};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::types::note::{NoteDraft, NoteView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

fn head(s: &mut String) {
    s.push_str("<!DOCTYPE html><html><head><meta charset='utf-8'>");
    s.push_str("<title>My Notes App</title></head><body>");
    s.push_str("<main style='padding: 20px'><h1>My Notes App</h1>");
}

fn foot(s: &mut String) {
    s.push_str("</main></body></html>");
}

fn notice(s: &mut String, notice: Option<&Notice>) {
    match notice {
        Some(Notice::Info(message)) => {
            s.push_str(&format!("<p class='notice'>{}</p>", encode_text(message)));
        }
        Some(Notice::Error(message)) => {
            s.push_str(&format!("<p class='error' role='alert'>{}</p>", encode_text(message)));
        }
        None => {}
    }
}

pub fn sign_in_page(message: Option<&Notice>) -> String {
    let mut s = String::new();
    head(&mut s);
    notice(&mut s, message);
    s.push_str("<form method='post' action='/sign_in'>");
    s.push_str("<input name='user_name' placeholder='User name' autocomplete='username' required>");
    s.push_str("<input name='password' type='password' placeholder='Password' autocomplete='current-password' required>");
    s.push_str("<button type='submit'>Sign in</button>");
    s.push_str("</form>");
    s.push_str("<h2>New here?</h2>");
    s.push_str("<form method='post' action='/sign_up'>");
    s.push_str("<input name='user_name' placeholder='User name' autocomplete='username' required>");
    s.push_str("<input name='password' type='password' placeholder='Password' autocomplete='new-password' required>");
    s.push_str("<button type='submit'>Create Account</button>");
    s.push_str("</form>");
    foot(&mut s);
    s
}

/// Form, note list and sign-out button. `submission` is the one-time token of the form.
pub fn board_page(
    user_name: &str,
    notes: &[NoteView],
    draft: &NoteDraft,
    message: Option<&Notice>,
    submission: &str,
) -> String {
    let mut s = String::new();
    head(&mut s);
    s.push_str(&format!("<p class='user'>{}</p>", encode_text(user_name)));
    notice(&mut s, message);

    s.push_str("<form method='post' action='/notes' enctype='multipart/form-data' style='margin-bottom: 20px'>");
    s.push_str(&format!(
        "<input type='hidden' name='submission' value=\"{}\">",
        encode_double_quoted_attribute(submission)
    ));
    s.push_str(&format!(
        "<input name='name' placeholder='Note name' value=\"{}\">",
        encode_double_quoted_attribute(&draft.name)
    ));
    s.push_str(&format!(
        "<input name='description' placeholder='Note description' value=\"{}\">",
        encode_double_quoted_attribute(&draft.description)
    ));
    s.push_str("<input type='file' name='image'>");
    s.push_str("<button type='submit'>Create Note</button>");
    s.push_str("</form>");

    for view in notes {
        s.push_str("<div class='note' style='margin-bottom: 10px'>");
        s.push_str(&format!("<h3>{}</h3>", encode_text(&view.note.name)));
        s.push_str(&format!("<p>{}</p>", encode_text(&view.note.description)));
        if let Some(url) = &view.image_url {
            s.push_str(&format!(
                "<img src=\"{}\" alt='note' style='height: 100px'>",
                encode_double_quoted_attribute(url)
            ));
        }
        s.push_str(&format!(
            "<form method='post' action='/notes/{}/delete'><button type='submit'>Delete</button></form>",
            utf8_percent_encode(view.id(), NON_ALPHANUMERIC)
        ));
        s.push_str("</div>");
    }

    s.push_str("<form method='post' action='/sign_out'><button type='submit'>Sign out</button></form>");
    foot(&mut s);
    s
}
