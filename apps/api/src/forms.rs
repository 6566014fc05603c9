use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::models::quiz::QuizSubmission;
use crate::profile::category::Category;
use crate::profile::scoring::AnswerSet;

/// Key for errors that belong to the form as a whole.
pub const NON_FIELD_ERRORS: &str = "__all__";

const REQUIRED: &str = "Este campo es obligatorio.";
const UNREADABLE_BODY: &str = "No se pudieron leer los datos enviados.";
const INVALID_EMAIL: &str = "Introduzca una dirección de correo electrónico válida.";
const MAX_NAME_CHARS: usize = 100;
const MAX_LEVEL_CHARS: usize = 50;
const MAX_MESSAGE_CHARS: usize = 2000;
const MIN_AGE: i32 = 1;
const MAX_AGE: i32 = 120;

/// Field name → messages, serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn unreadable() -> Self {
        let mut errors = FieldErrors::default();
        errors.add(NON_FIELD_ERRORS, UNREADABLE_BODY);
        errors
    }

    fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Posted fields in body order. Repeated keys are kept; single-valued
/// lookups take the first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    /// Reads a urlencoded body, or a flat JSON object when the content type
    /// says so. Anything else that cannot be read becomes a form-level error.
    pub fn parse(content_type: Option<&str>, body: &[u8]) -> Result<Self, FieldErrors> {
        let is_json = content_type
            .map(|v| v.trim_start().starts_with("application/json"))
            .unwrap_or(false);
        if !is_json {
            let pairs = url::form_urlencoded::parse(body)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            return Ok(FormFields(pairs));
        }

        let Ok(Value::Object(object)) = serde_json::from_slice::<Value>(body) else {
            return Err(FieldErrors::unreadable());
        };
        let mut pairs = Vec::new();
        for (key, value) in object {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items {
                        pairs.push((key.clone(), json_scalar(item)?));
                    }
                }
                other => pairs.push((key, json_scalar(other)?)),
            }
        }
        Ok(FormFields(pairs))
    }

    pub fn first(&self, key: &str) -> Option<String> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Every value posted under any of `keys`, in body order.
    pub fn all(&self, keys: &[&str]) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| keys.contains(&k.as_str()))
            .map(|(_, v)| v.clone())
            .collect()
    }
}

fn json_scalar(value: Value) -> Result<String, FieldErrors> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(FieldErrors::unreadable()),
    }
}

fn required_text(errors: &mut FieldErrors, field: &str, value: Option<&str>, max_chars: usize) -> String {
    let value = value.map(str::trim).unwrap_or("");
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else if value.chars().count() > max_chars {
        errors.add(
            field,
            format!("Asegúrese de que este valor tenga como máximo {max_chars} caracteres."),
        );
    }
    value.to_string()
}

fn check_email(errors: &mut FieldErrors, field: &str, value: &str) {
    if !value.is_empty() && value.parse::<lettre::Address>().is_err() {
        errors.add(field, INVALID_EMAIL);
    }
}

fn check_answers(errors: &mut FieldErrors, answers: &AnswerSet) {
    let fields = [
        ("q1", &answers.q1),
        ("q2", &answers.q2),
        ("q3", &answers.q3),
        ("q4", &answers.q4),
        ("q5", &answers.q5),
    ];
    for (field, value) in fields {
        if value.is_empty() {
            errors.add(field, REQUIRED);
        } else if Category::from_label(value).is_none() {
            errors.add(
                field,
                format!("Escoja una opción válida. {value} no es una de las opciones disponibles."),
            );
        }
    }
}

fn check_age(errors: &mut FieldErrors, age: i32) {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        errors.add("age", format!("La edad debe estar entre {MIN_AGE} y {MAX_AGE}."));
    }
}

/// Validates an already-typed submission (API payloads, edited records).
pub fn validate_submission(submission: QuizSubmission) -> Result<QuizSubmission, FieldErrors> {
    let mut errors = FieldErrors::default();
    let QuizSubmission {
        name,
        age,
        email,
        level,
        answers,
    } = submission;

    let name = required_text(&mut errors, "name", Some(&name), MAX_NAME_CHARS);
    let email = required_text(&mut errors, "email", Some(&email), 254);
    check_email(&mut errors, "email", &email);
    let level = required_text(&mut errors, "level", Some(&level), MAX_LEVEL_CHARS);
    check_age(&mut errors, age);
    let answers = AnswerSet {
        q1: answers.q1.trim().to_string(),
        q2: answers.q2.trim().to_string(),
        q3: answers.q3.trim().to_string(),
        q4: answers.q4.trim().to_string(),
        q5: answers.q5.trim().to_string(),
    };
    check_answers(&mut errors, &answers);

    errors.finish(QuizSubmission {
        name,
        age,
        email,
        level,
        answers,
    })
}

/// The quiz form as posted by a browser. Every field is optional text so that
/// missing or malformed values become field errors instead of rejections.
#[derive(Debug, Clone, Default)]
pub struct QuizForm {
    pub name: Option<String>,
    pub age: Option<String>,
    pub email: Option<String>,
    pub level: Option<String>,
    pub q1: Option<String>,
    pub q2: Option<String>,
    pub q3: Option<String>,
    pub q4: Option<String>,
    pub q5: Option<String>,
}

impl QuizForm {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            name: fields.first("name"),
            age: fields.first("age"),
            email: fields.first("email"),
            level: fields.first("level"),
            q1: fields.first("q1"),
            q2: fields.first("q2"),
            q3: fields.first("q3"),
            q4: fields.first("q4"),
            q5: fields.first("q5"),
        }
    }

    pub fn from_record(record: &crate::models::quiz::QuizRecord) -> Self {
        let answers = record.answers();
        Self {
            name: Some(record.name.clone()),
            age: Some(record.age.to_string()),
            email: Some(record.email.clone()),
            level: Some(record.level.clone()),
            q1: Some(answers.q1),
            q2: Some(answers.q2),
            q3: Some(answers.q3),
            q4: Some(answers.q4),
            q5: Some(answers.q5),
        }
    }

    pub fn validate(&self) -> Result<QuizSubmission, FieldErrors> {
        let age_text = self.age.as_deref().map(str::trim).unwrap_or("");
        let age = if age_text.is_empty() {
            None
        } else {
            age_text.parse::<i32>().ok()
        };

        let submission = QuizSubmission {
            name: self.name.clone().unwrap_or_default(),
            age: age.unwrap_or(MIN_AGE),
            email: self.email.clone().unwrap_or_default(),
            level: self.level.clone().unwrap_or_default(),
            answers: AnswerSet {
                q1: self.q1.clone().unwrap_or_default(),
                q2: self.q2.clone().unwrap_or_default(),
                q3: self.q3.clone().unwrap_or_default(),
                q4: self.q4.clone().unwrap_or_default(),
                q5: self.q5.clone().unwrap_or_default(),
            },
        };

        let mut errors = match validate_submission(submission) {
            Ok(valid) if age.is_some() => return Ok(valid),
            Ok(_) => FieldErrors::default(),
            Err(errors) => errors,
        };
        if age_text.is_empty() {
            errors.add("age", REQUIRED);
        } else if age.is_none() {
            errors.add("age", "Introduzca un número entero.");
        }
        Err(errors)
    }
}

/// Validated course enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    pub name: String,
    pub email: String,
    pub courses: Vec<String>,
}

/// Enrollment form. `courses` is a repeated key (`courses` or `courses[]`).
#[derive(Debug, Clone, Default)]
pub struct EnrollmentForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub courses: Vec<String>,
}

impl EnrollmentForm {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            name: fields.first("name"),
            email: fields.first("email"),
            courses: fields.all(&["courses", "courses[]"]),
        }
    }

    /// Selections are deduplicated in first-seen order, the same policy the
    /// quiz recommendations follow.
    pub fn validate(&self) -> Result<Enrollment, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = required_text(&mut errors, "name", self.name.as_deref(), MAX_NAME_CHARS);
        let email = required_text(&mut errors, "email", self.email.as_deref(), 254);
        check_email(&mut errors, "email", &email);

        let courses = crate::profile::courses::dedup_first_seen(
            self.courses
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty()),
        );
        if courses.is_empty() {
            errors.add("courses", "Seleccione al menos un curso.");
        }

        errors.finish(Enrollment {
            name,
            email,
            courses,
        })
    }
}

/// Validated contact message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl ContactForm {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            name: fields.first("name"),
            email: fields.first("email"),
            message: fields.first("message"),
        }
    }

    pub fn validate(&self) -> Result<ContactMessage, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = required_text(&mut errors, "name", self.name.as_deref(), MAX_NAME_CHARS);
        let email = required_text(&mut errors, "email", self.email.as_deref(), 254);
        check_email(&mut errors, "email", &email);
        let message = required_text(
            &mut errors,
            "message",
            self.message.as_deref(),
            MAX_MESSAGE_CHARS,
        );
        errors.finish(ContactMessage {
            name,
            email,
            message,
        })
    }
}

const MAX_USERNAME_CHARS: usize = 150;
const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginForm {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            username: fields.first("username"),
            password: fields.first("password"),
        }
    }

    /// Both fields present. Whether they match an account is the caller's job.
    pub fn validate(&self) -> Result<(String, String), FieldErrors> {
        let mut errors = FieldErrors::default();
        let username = required_text(&mut errors, "username", self.username.as_deref(), MAX_USERNAME_CHARS);
        let password = self.password.clone().unwrap_or_default();
        if password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.finish((username, password))
    }
}

/// A validated sign-up: the username is well formed and both password
/// entries agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
}

impl RegistrationForm {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            username: fields.first("username"),
            password1: fields.first("password1"),
            password2: fields.first("password2"),
        }
    }

    pub fn validate(&self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::default();
        let username = required_text(&mut errors, "username", self.username.as_deref(), MAX_USERNAME_CHARS);
        let valid_chars = username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c));
        if !username.is_empty() && !valid_chars {
            errors.add(
                "username",
                "Introduzca un nombre de usuario válido. Este valor puede contener sólo letras, \
                 números y los caracteres @/./+/-/_.",
            );
        }

        let password = self.password1.clone().unwrap_or_default();
        let confirmation = self.password2.clone().unwrap_or_default();
        if password.is_empty() {
            errors.add("password1", REQUIRED);
        } else {
            if password.chars().count() < MIN_PASSWORD_CHARS {
                errors.add(
                    "password1",
                    format!("Esta contraseña es demasiado corta. Debe contener al menos {MIN_PASSWORD_CHARS} caracteres."),
                );
            }
            if password.chars().all(|c| c.is_ascii_digit()) {
                errors.add("password1", "Esta contraseña es completamente numérica.");
            }
        }
        if confirmation.is_empty() {
            errors.add("password2", REQUIRED);
        } else if !password.is_empty() && password != confirmation {
            errors.add("password2", "Los dos campos de contraseña no coinciden.");
        }

        errors.finish(Registration { username, password })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> QuizForm {
        QuizForm {
            name: Some("Ana".into()),
            age: Some("17".into()),
            email: Some("ana@example.com".into()),
            level: Some("Secundario".into()),
            q1: Some("Tecnológico".into()),
            q2: Some("Tecnológico".into()),
            q3: Some("Creativo/Artístico".into()),
            q4: Some("Tecnológico".into()),
            q5: Some("Social/Humanístico".into()),
        }
    }

    #[test]
    fn test_valid_quiz_form() {
        let submission = valid_form().validate().unwrap();
        assert_eq!(submission.name, "Ana");
        assert_eq!(submission.age, 17);
        assert_eq!(submission.answers.q3, "Creativo/Artístico");
    }

    #[test]
    fn test_missing_fields_are_reported_per_field() {
        let errors = QuizForm::default().validate().unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["age", "email", "level", "name", "q1", "q2", "q3", "q4", "q5"]
        );
        assert_eq!(errors.get("name").unwrap(), &[REQUIRED.to_string()]);
    }

    #[test]
    fn test_non_numeric_age() {
        let mut form = valid_form();
        form.age = Some("diecisiete".into());
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["age"]);
    }

    #[test]
    fn test_age_out_of_range() {
        let mut form = valid_form();
        form.age = Some("0".into());
        assert!(form.validate().unwrap_err().get("age").is_some());
    }

    #[test]
    fn test_unknown_answer_is_rejected() {
        let mut form = valid_form();
        form.q2 = Some("Deportivo".into());
        let errors = form.validate().unwrap_err();
        assert!(errors.get("q2").unwrap()[0].contains("Deportivo"));
    }

    #[test]
    fn test_bad_email() {
        let mut form = valid_form();
        form.email = Some("not-an-email".into());
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("email").unwrap(), &[INVALID_EMAIL.to_string()]);
    }

    #[test]
    fn test_field_errors_serialize_as_object() {
        let mut errors = FieldErrors::default();
        errors.add("q1", "bad");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({ "q1": ["bad"] })
        );
    }

    #[test]
    fn test_enrollment_collects_repeated_courses_and_dedups() {
        let body = "name=Ana&email=ana%40example.com\
                    &courses=Dise%C3%B1o+Gr%C3%A1fico&courses=Dise%C3%B1o+Gr%C3%A1fico&courses=Oratoria";
        let fields = FormFields::parse(None, body.as_bytes()).unwrap();
        let enrollment = EnrollmentForm::from_fields(&fields).validate().unwrap();
        assert_eq!(enrollment.courses, vec!["Diseño Gráfico", "Oratoria"]);
        assert_eq!(enrollment.email, "ana@example.com");
    }

    #[test]
    fn test_enrollment_requires_a_course() {
        let fields = FormFields::parse(None, b"name=Ana&email=ana%40example.com&courses=+").unwrap();
        let form = EnrollmentForm::from_fields(&fields);
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["courses"]);
    }

    #[test]
    fn test_contact_form() {
        let form = ContactForm {
            name: Some(" Ana ".into()),
            email: Some("ana@example.com".into()),
            message: Some("Hola".into()),
        };
        let message = form.validate().unwrap();
        assert_eq!(message.name, "Ana");

        let errors = ContactForm::default().validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["email", "message", "name"]
        );
    }

    #[test]
    fn test_repeated_keys_keep_first_value() {
        let fields = FormFields::parse(
            Some("application/x-www-form-urlencoded"),
            b"name=Ana&name=Bea&q1=x",
        )
        .unwrap();
        let form = QuizForm::from_fields(&fields);
        assert_eq!(form.name.as_deref(), Some("Ana"));
        assert_eq!(form.q1.as_deref(), Some("x"));
    }

    #[test]
    fn test_json_body_is_flattened() {
        let body = r#"{"name":"Ana","age":17,"courses":["Oratoria","Fotografía Digital"],"level":null}"#;
        let fields =
            FormFields::parse(Some("application/json; charset=utf-8"), body.as_bytes()).unwrap();

        assert_eq!(fields.first("age").as_deref(), Some("17"));
        assert_eq!(fields.first("level"), None);
        assert_eq!(fields.all(&["courses"]), vec!["Oratoria", "Fotografía Digital"]);
    }

    #[test]
    fn test_unreadable_json_is_a_form_error() {
        let bodies: [&[u8]; 3] = [b"{\"name\":", b"[1,2]", br#"{"name":{"first":"Ana"}}"#];
        for body in bodies {
            let errors = FormFields::parse(Some("application/json"), body).unwrap_err();
            assert_eq!(errors.fields().collect::<Vec<_>>(), vec![NON_FIELD_ERRORS]);
        }
    }

    #[test]
    fn test_registration_rules() {
        let form = RegistrationForm {
            username: Some("ana.perez".into()),
            password1: Some("vocacion2025".into()),
            password2: Some("vocacion2025".into()),
        };
        assert_eq!(form.validate().unwrap().username, "ana.perez");

        let errors = RegistrationForm {
            username: Some("ana perez".into()),
            password1: Some("1234".into()),
            password2: Some("4321".into()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["password1", "password2", "username"]
        );
        assert_eq!(errors.get("password1").unwrap().len(), 2);
    }

    #[test]
    fn test_login_form_requires_both_fields() {
        let errors = LoginForm {
            username: Some("ana".into()),
            password: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["password"]);
    }
}
