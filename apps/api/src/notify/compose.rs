use crate::forms::{ContactMessage, Enrollment};
use crate::notify::OutgoingEmail;
use crate::render::escape_html;

const SIGNATURE: &str = "Equipo Vocari Project";

/// Everything the quiz report emails show.
#[derive(Debug, Clone, Copy)]
pub struct QuizReport<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub profile: &'a str,
    pub description: &'a str,
    pub courses: &'a [String],
}

fn course_list_html(courses: &[String]) -> String {
    courses
        .iter()
        .map(|c| format!("<li>{}</li>", escape_html(c)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn html_message(subject: String, html: String, from: &str, to: &str) -> OutgoingEmail {
    OutgoingEmail {
        subject,
        text_body: strip_tags(&html),
        html_body: Some(html),
        from: from.to_string(),
        to: vec![to.to_string()],
        reply_to: None,
    }
}

/// User report and operator copy, in that order.
pub fn quiz_report_emails(report: &QuizReport<'_>, from: &str) -> [OutgoingEmail; 2] {
    let name = escape_html(report.name);
    let email = escape_html(report.email);
    let profile = escape_html(report.profile);
    let description = escape_html(report.description);
    let courses = course_list_html(report.courses);

    let user_html = format!(
        r#"<html>
<body style="font-family: Arial; background:#f4f4f4; padding:20px;">
  <div style="max-width:600px;margin:auto;background:white;padding:20px;border-radius:10px;">
    <h2 style="color:#333;">Hola {name},</h2>
    <p>Gracias por completar el <strong>Test Vocacional</strong>.</p>
    <h3>Perfil obtenido: <strong>{profile}</strong></h3>
    <p>{description}</p>
    <h3>Cursos recomendados:</h3>
    <ul>{courses}</ul>
    <p style="margin-top:20px;">¡Gracias por usar Vocari Project!<br>
    <strong>{SIGNATURE}</strong></p>
  </div>
</body>
</html>"#
    );

    let operator_html = format!(
        r#"<html>
<body style="font-family: Arial;">
  <h2 style="color:#444;">Nuevo informe generado</h2>
  <p><strong>Nombre:</strong> {name}</p>
  <p><strong>Correo:</strong> {email}</p>
  <p><strong>Perfil:</strong> {profile}</p>
  <p><strong>Descripción:</strong> {description}</p>
  <h3>Cursos recomendados:</h3>
  <ul>{courses}</ul>
</body>
</html>"#
    );

    [
        html_message(
            format!("Informe Vocacional | {}", report.name),
            user_html,
            from,
            report.email,
        ),
        html_message(
            format!("Nueva evaluación | {} - {}", report.profile, report.name),
            operator_html,
            from,
            from,
        ),
    ]
}

/// Enrollment confirmation and operator copy, in that order.
pub fn enrollment_emails(enrollment: &Enrollment, from: &str) -> [OutgoingEmail; 2] {
    let name = escape_html(&enrollment.name);
    let email = escape_html(&enrollment.email);
    let courses = course_list_html(&enrollment.courses);

    let user_html = format!(
        r#"<html>
<body style="font-family:Arial;background:#f4f4f4;padding:20px;">
  <div style="max-width:600px;margin:auto;background:white;padding:20px;border-radius:10px;">
    <h2>Hola {name},</h2>
    <p>Tu inscripción fue recibida correctamente.</p>
    <h3>Cursos seleccionados:</h3>
    <ul>{courses}</ul>
    <p>Nos contactaremos contigo pronto.<br>
    <strong>{SIGNATURE}</strong></p>
  </div>
</body>
</html>"#
    );

    let operator_html = format!(
        r#"<html>
<body style="font-family:Arial;">
  <h2>Nueva inscripción</h2>
  <p><strong>Nombre:</strong> {name}</p>
  <p><strong>Correo:</strong> {email}</p>
  <h3>Cursos:</h3>
  <ul>{courses}</ul>
</body>
</html>"#
    );

    [
        html_message(
            format!("Inscripción confirmada | {}", enrollment.name),
            user_html,
            from,
            &enrollment.email,
        ),
        html_message(
            format!("Inscripción recibida | {}", enrollment.name),
            operator_html,
            from,
            from,
        ),
    ]
}

/// Plain-text message to the operator; replies go to the sender.
pub fn contact_email(message: &ContactMessage, from: &str) -> OutgoingEmail {
    OutgoingEmail {
        subject: format!("Consulta de contacto desde Vocari | De: {}", message.name),
        text_body: format!(
            "Nombre: {}\nCorreo: {}\n\nMensaje:\n{}\n",
            message.name, message.email, message.message
        ),
        html_body: None,
        from: from.to_string(),
        to: vec![from.to_string()],
        reply_to: Some(message.email.clone()),
    }
}

/// Plain-text rendition of an HTML body: tags removed, basic entities
/// decoded, blank lines collapsed.
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
