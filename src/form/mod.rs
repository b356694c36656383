//! Contact form validation.
//!
//! [`ContactForm`] keeps the current text and validation result of every
//! field. Each change returns what the page should show for that field (the
//! possibly reformatted value and a [`FieldView`]) plus whether the submit
//! button should be enabled. Submitting a complete form yields a
//! [`FormSummary`] with the average of the three ratings; nothing leaves the
//! page.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::FormConfig;

mod rules;

pub use rules::{
    FieldError, FieldKind, FieldView, format_phone, normalize_phone, parse_rating, phone_digits,
    validate, validate_address, validate_email, validate_name, validate_phone,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
    Rating1,
    Rating2,
    Rating3,
}

impl FieldId {
    pub const ALL: [FieldId; 8] = [
        FieldId::FirstName,
        FieldId::LastName,
        FieldId::Email,
        FieldId::Phone,
        FieldId::Address,
        FieldId::Rating1,
        FieldId::Rating2,
        FieldId::Rating3,
    ];

    pub const RATINGS: [FieldId; 3] = [FieldId::Rating1, FieldId::Rating2, FieldId::Rating3];

    pub fn kind(self) -> FieldKind {
        match self {
            FieldId::FirstName | FieldId::LastName => FieldKind::Name,
            FieldId::Email => FieldKind::Email,
            FieldId::Phone => FieldKind::Phone,
            FieldId::Address => FieldKind::Address,
            FieldId::Rating1 | FieldId::Rating2 | FieldId::Rating3 => FieldKind::Rating,
        }
    }

    /// Id of the `<input>` element.
    pub fn dom_id(self) -> &'static str {
        match self {
            FieldId::FirstName => "firstName",
            FieldId::LastName => "lastName",
            FieldId::Email => "email",
            FieldId::Phone => "phone",
            FieldId::Address => "address",
            FieldId::Rating1 => "rating1",
            FieldId::Rating2 => "rating2",
            FieldId::Rating3 => "rating3",
        }
    }

    pub fn from_dom_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.dom_id() == id)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Page input the form reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    FieldChanged { field: FieldId, raw: String },
    Submitted,
}

/// Result of one field edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: FieldId,
    /// Text to write back into the input (phone numbers get reformatted).
    pub value: String,
    pub view: FieldView,
    pub submit_enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    Field(FieldChange),
    Submitted(FormSummary),
    /// Every field that blocks submission, with the view it should now show.
    Rejected(Vec<(FieldId, FieldView)>),
}

/// Popup text when a submit is rejected.
pub const REJECTED_MESSAGE: &str = "❌ Prašome ištaisyti klaidas formoje";

/// Submitted data as rendered into the results box. Serialized keys follow the
/// page's own labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSummary {
    #[serde(rename = "vardas")]
    pub first_name: String,
    #[serde(rename = "pavarde")]
    pub last_name: String,
    #[serde(rename = "pastas")]
    pub email: String,
    #[serde(rename = "telefonas")]
    pub phone: String,
    #[serde(rename = "adresas")]
    pub address: String,
    #[serde(rename = "vidurkis", serialize_with = "one_decimal")]
    pub average: f64,
}

impl FormSummary {
    pub fn average_display(&self) -> String {
        format!("{:.1}", self.average)
    }

    /// Popup text after a successful submit.
    pub fn confirmation(&self) -> String {
        format!(
            "✅ Ačiū, {}! Jūsų atsiliepimas gautas. Vidutinis įvertinimas: {}/10",
            self.first_name,
            self.average_display()
        )
    }

    /// Labelled rows in display order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Vardas", self.first_name.clone()),
            ("Pavardė", self.last_name.clone()),
            ("El. paštas", self.email.clone()),
            ("Tel. numeris", self.phone.clone()),
            ("Adresas", self.address.clone()),
            ("Vidurkis", self.average_display()),
        ]
    }
}

fn one_decimal<S: serde::Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.1}"))
}

#[derive(Debug, Clone)]
pub struct ContactForm {
    config: FormConfig,
    values: [String; 8],
    results: [Result<(), FieldError>; 8],
}

impl ContactForm {
    pub fn new(config: FormConfig) -> Self {
        let results = FieldId::ALL.map(|f| validate(f.kind(), "", &config));
        Self {
            config,
            values: Default::default(),
            results,
        }
    }

    pub fn handle_event(&mut self, event: FormEvent) -> FormOutcome {
        match event {
            FormEvent::FieldChanged { field, raw } => {
                FormOutcome::Field(self.on_field_changed(field, &raw))
            }
            FormEvent::Submitted => match self.submit() {
                Ok(summary) => FormOutcome::Submitted(summary),
                Err(rejected) => FormOutcome::Rejected(rejected),
            },
        }
    }

    /// Stores and validates the new text. Phone input is normalized and
    /// regrouped before validation.
    pub fn on_field_changed(&mut self, field: FieldId, raw: &str) -> FieldChange {
        let value = match field.kind() {
            FieldKind::Phone => {
                let canonical = normalize_phone(raw, &self.config);
                format_phone(&canonical, &self.config.phone_prefix)
            }
            _ => raw.to_owned(),
        };
        let result = validate(field.kind(), &value, &self.config);
        debug!(?field, ok = result.is_ok(), "field changed");
        self.values[field.index()] = value.clone();
        self.results[field.index()] = result;
        FieldChange {
            field,
            value,
            view: FieldView::from_result(result, &self.config),
            submit_enabled: self.is_valid(),
        }
    }

    pub fn value(&self, field: FieldId) -> &str {
        &self.values[field.index()]
    }

    pub fn result(&self, field: FieldId) -> Result<(), FieldError> {
        self.results[field.index()]
    }

    pub fn view(&self, field: FieldId) -> FieldView {
        FieldView::from_result(self.result(field), &self.config)
    }

    /// Every field passes; gates the submit button.
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(Result::is_ok)
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn submit(&self) -> Result<FormSummary, Vec<(FieldId, FieldView)>> {
        let rejected: Vec<(FieldId, FieldView)> = FieldId::ALL
            .into_iter()
            .filter(|f| self.result(*f).is_err())
            .map(|f| (f, self.view(f)))
            .collect();
        if !rejected.is_empty() {
            debug!(invalid = rejected.len(), "submit rejected");
            return Err(rejected);
        }

        let mut total = 0.0;
        for field in FieldId::RATINGS {
            // Already validated, so a parse failure cannot happen here.
            total += parse_rating(self.value(field)).unwrap_or_default();
        }
        let summary = FormSummary {
            first_name: self.value(FieldId::FirstName).trim().to_owned(),
            last_name: self.value(FieldId::LastName).trim().to_owned(),
            email: self.value(FieldId::Email).trim().to_owned(),
            phone: self.value(FieldId::Phone).to_owned(),
            address: self.value(FieldId::Address).trim().to_owned(),
            average: total / FieldId::RATINGS.len() as f64,
        };
        match serde_json::to_string(&summary) {
            Ok(json) => info!(form = %json, "form submitted"),
            Err(err) => info!(error = %err, "form submitted"),
        }
        Ok(summary)
    }
}
