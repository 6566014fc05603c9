//! Server-rendered HTML pages for interactive (non-XHR) callers.

use crate::forms::{ContactForm, Enrollment, FieldErrors, QuizForm, RegistrationForm, NON_FIELD_ERRORS};
use crate::models::quiz::QuizRecord;
use crate::profile::category::Category;
use crate::profile::submission::SubmissionOutcome;

const QUESTIONS: [(&str, &str); 5] = [
    ("q1", "¿Qué actividad disfrutás más en tu tiempo libre?"),
    ("q2", "¿Qué materia te resulta más interesante?"),
    ("q3", "¿Cómo preferís resolver un problema?"),
    ("q4", "¿En qué tipo de proyecto te gustaría participar?"),
    ("q5", "¿Qué te gustaría lograr con tu trabajo?"),
];

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title} | Vocari</title>
</head>
<body>
  <nav>
    <a href="/">Test vocacional</a> ·
    <a href="/about">Sobre nosotros</a> ·
    <a href="/contact">Contacto</a> ·
    <a href="/login">Ingresar</a>
  </nav>
  <main>
{body}
  </main>
</body>
</html>"#,
        title = escape_html(title),
    )
}

fn alert(status_class: &str, message: &str) -> String {
    format!(
        r#"<div class="alert alert-{}">{}</div>"#,
        escape_html(status_class),
        escape_html(message)
    )
}

fn field_errors(errors: Option<&FieldErrors>, field: &str) -> String {
    errors
        .and_then(|e| e.get(field))
        .unwrap_or(&[])
        .iter()
        .map(|msg| format!(r#"<p class="error">{}</p>"#, escape_html(msg)))
        .collect()
}

fn text_input(label: &str, field: &str, kind: &str, value: Option<&str>, errors: Option<&FieldErrors>) -> String {
    format!(
        r#"<label>{label} <input type="{kind}" name="{field}" value="{value}"></label>{errors}"#,
        label = escape_html(label),
        value = escape_html(value.unwrap_or("")),
        errors = field_errors(errors, field),
    )
}

fn answer_select(field: &str, question: &str, selected: Option<&str>, errors: Option<&FieldErrors>) -> String {
    let options: String = Category::ALL
        .iter()
        .map(|c| {
            let chosen = if selected == Some(c.label()) { " selected" } else { "" };
            format!(
                r#"<option value="{label}"{chosen}>{label}</option>"#,
                label = escape_html(c.label())
            )
        })
        .collect();
    format!(
        r#"<label>{question} <select name="{field}"><option value="">---------</option>{options}</select></label>{errors}"#,
        question = escape_html(question),
        errors = field_errors(errors, field),
    )
}

fn quiz_fields(form: &QuizForm, errors: Option<&FieldErrors>) -> String {
    let answers = [&form.q1, &form.q2, &form.q3, &form.q4, &form.q5];
    let mut html = field_errors(errors, NON_FIELD_ERRORS);
    html.push_str(&text_input("Nombre", "name", "text", form.name.as_deref(), errors));
    html.push_str(&text_input("Edad", "age", "number", form.age.as_deref(), errors));
    html.push_str(&text_input("Correo", "email", "email", form.email.as_deref(), errors));
    html.push_str(&text_input("Nivel educativo", "level", "text", form.level.as_deref(), errors));
    for ((field, question), answer) in QUESTIONS.iter().zip(answers) {
        html.push_str(&answer_select(field, question, answer.as_deref(), errors));
    }
    html
}

/// The quiz page: the form, plus results and an enrollment form after a
/// successful submission.
pub fn quiz_page(form: &QuizForm, errors: Option<&FieldErrors>, outcome: Option<&SubmissionOutcome>) -> String {
    let mut body = String::from("<h1>Test vocacional</h1>\n");

    if errors.is_some() {
        body.push_str(&alert("danger", "Por favor, revisa los errores en el formulario."));
    }

    if let Some(outcome) = outcome {
        let report = &outcome.report;
        body.push_str(&alert(outcome.status.as_str(), outcome.status.user_message()));
        body.push_str(&format!(
            "<section id=\"resultados\"><h2>Perfil obtenido: {}</h2><p>{}</p>",
            escape_html(&report.profile),
            escape_html(&report.description)
        ));
        if let Some(translation) = report.description_translation.as_deref() {
            body.push_str(&format!("<p class=\"translation\">{}</p>", escape_html(translation)));
        }
        body.push_str(r#"<form method="post" action="/enroll"><h3>Cursos recomendados</h3><ul>"#);
        for course in &report.courses {
            let translated = course
                .translation
                .as_deref()
                .map(|t| format!(" <small>({})</small>", escape_html(t)))
                .unwrap_or_default();
            body.push_str(&format!(
                r#"<li><label><input type="checkbox" name="courses" value="{name}"> {name}{translated}</label></li>"#,
                name = escape_html(&course.name),
            ));
        }
        body.push_str(&format!(
            r#"</ul><input type="hidden" name="name" value="{}"><input type="hidden" name="email" value="{}"><button type="submit">Inscribirme</button></form></section>"#,
            escape_html(&outcome.submission.name),
            escape_html(&outcome.submission.email),
        ));
    }

    body.push_str(&format!(
        r#"<form id="formulario-principal" method="post" action="/">{}<button type="submit" class="btn-enviar">ENVIAR</button></form>"#,
        quiz_fields(form, errors)
    ));
    layout("Test vocacional", &body)
}

pub fn enroll_page(result: Option<(&Enrollment, &str, bool)>, errors: Option<&FieldErrors>) -> String {
    let mut body = String::from("<h1>Inscripción</h1>\n");
    if let Some(errors) = errors {
        body.push_str(&alert("danger", "Por favor, revisa los errores en el formulario."));
        for field in errors.fields() {
            body.push_str(&field_errors(Some(errors), field));
        }
    }
    match result {
        Some((enrollment, message, success)) => {
            body.push_str(&alert(if success { "success" } else { "warning" }, message));
            body.push_str(&format!(
                "<p>{} ({})</p><h3>Cursos seleccionados:</h3><ul>",
                escape_html(&enrollment.name),
                escape_html(&enrollment.email)
            ));
            for course in &enrollment.courses {
                body.push_str(&format!("<li>{}</li>", escape_html(course)));
            }
            body.push_str("</ul>");
        }
        None if errors.is_none() => {
            body.push_str(r#"<p>Completá el <a href="/">test vocacional</a> para elegir tus cursos.</p>"#);
        }
        None => {}
    }
    layout("Inscripción", &body)
}

pub fn contact_page(form: &ContactForm, errors: Option<&FieldErrors>, message: Option<&str>) -> String {
    let mut body = String::from("<h1>Contacto</h1>\n");
    if let Some(message) = message {
        body.push_str(&alert("info", message));
    }
    body.push_str(&format!(
        r#"<form method="post" action="/contact">{}{}{}<label>Mensaje <textarea name="message">{}</textarea></label>{}<button type="submit">Enviar</button></form>"#,
        field_errors(errors, NON_FIELD_ERRORS),
        text_input("Nombre", "name", "text", form.name.as_deref(), errors),
        text_input("Correo", "email", "email", form.email.as_deref(), errors),
        escape_html(form.message.as_deref().unwrap_or("")),
        field_errors(errors, "message"),
    ));
    layout("Contacto", &body)
}

pub fn about_page() -> String {
    layout(
        "Sobre nosotros",
        "<h1>Sobre nosotros</h1>\n<p>Vocari Project acompaña a estudiantes a descubrir su perfil vocacional \
         y los cursos que mejor se ajustan a sus intereses.</p>",
    )
}

pub fn dashboard_page(username: &str) -> String {
    layout(
        "Panel",
        &format!(
            r#"<h1>Panel de administración</h1><p>Hola {}.</p><ul><li><a href="/staff/records">Consultas</a></li></ul>{}"#,
            escape_html(username),
            LOGOUT_FORM
        ),
    )
}

const LOGOUT_FORM: &str = r#"<form method="post" action="/logout"><button type="submit">Cerrar sesión</button></form>"#;

fn password_input(label: &str, field: &str, errors: Option<&FieldErrors>) -> String {
    format!(
        r#"<label>{label} <input type="password" name="{field}"></label>{errors}"#,
        label = escape_html(label),
        errors = field_errors(errors, field),
    )
}

pub fn login_page(username: Option<&str>, errors: Option<&FieldErrors>) -> String {
    let body = format!(
        r#"<h1>Iniciar sesión</h1><form method="post" action="/login">{}{}{}<button type="submit">Ingresar</button></form><p>¿No tenés cuenta? <a href="/register">Registrate</a></p>"#,
        field_errors(errors, NON_FIELD_ERRORS),
        text_input("Usuario", "username", "text", username, errors),
        password_input("Contraseña", "password", errors),
    );
    layout("Iniciar sesión", &body)
}

pub fn register_page(form: &RegistrationForm, errors: Option<&FieldErrors>) -> String {
    let body = format!(
        r#"<h1>Crear cuenta</h1><form method="post" action="/register">{}{}{}{}<button type="submit">Registrarme</button></form>"#,
        field_errors(errors, NON_FIELD_ERRORS),
        text_input("Usuario", "username", "text", form.username.as_deref(), errors),
        password_input("Contraseña", "password1", errors),
        password_input("Confirmar contraseña", "password2", errors),
    );
    layout("Crear cuenta", &body)
}

/// Landing page for logged-in users without staff access.
pub fn no_admin_page(username: &str) -> String {
    layout(
        "Sin acceso",
        &format!(
            r#"<h1>Hola {}</h1><p>Tu cuenta no tiene acceso al panel de administración.</p><p><a href="/">Volver al test vocacional</a></p>{}"#,
            escape_html(username),
            LOGOUT_FORM
        ),
    )
}

pub fn records_page(records: &[QuizRecord]) -> String {
    let mut body = String::from(
        "<h1>Consultas</h1>\n<table><thead><tr><th>ID</th><th>Fecha</th><th>Nombre</th><th>Edad</th>\
         <th>Correo</th><th>Nivel</th><th>Perfil</th><th></th></tr></thead><tbody>",
    );
    if records.is_empty() {
        body.push_str(r#"<tr><td colspan="8">No hay consultas registradas.</td></tr>"#);
    }
    for record in records {
        body.push_str(&format!(
            r#"<tr><td>{id}</td><td>{date}</td><td>{name}</td><td>{age}</td><td>{email}</td><td>{level}</td><td>{profile}</td><td><a href="/staff/records/{id}/edit">Editar</a> <form method="post" action="/staff/records/{id}/delete"><button type="submit">Eliminar</button></form></td></tr>"#,
            id = record.id,
            date = record.submitted_at.format("%Y-%m-%d %H:%M"),
            name = escape_html(&record.name),
            age = record.age,
            email = escape_html(&record.email),
            level = escape_html(&record.level),
            profile = escape_html(&record.profile),
        ));
    }
    body.push_str("</tbody></table>");
    layout("Consultas", &body)
}

pub fn edit_record_page(id: i64, form: &QuizForm, errors: Option<&FieldErrors>) -> String {
    let body = format!(
        r#"<h1>Editar consulta #{id}</h1><form method="post" action="/staff/records/{id}/edit">{}<button type="submit">Guardar</button></form><p><a href="/staff/records">Volver</a></p>"#,
        quiz_fields(form, errors)
    );
    layout("Editar consulta", &body)
}
