use serde::{Deserialize, Serialize};

/// One person whose birthday matched the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub father_email: Option<String>,
    #[serde(default)]
    pub father_phone: Option<String>,
    #[serde(default)]
    pub mother_email: Option<String>,
    #[serde(default)]
    pub mother_phone: Option<String>,
}

impl Person {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "(No name)",
        }
    }
}

/// Response of `GET /filter`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BirthdayResults {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub month_day: Option<String>,
    #[serde(default)]
    pub people: Vec<Person>,
}

impl BirthdayResults {
    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.people.is_empty()
    }

    /// Date label for headings, preferring the full date.
    pub fn date_label(&self) -> &str {
        self.date
            .as_deref()
            .or(self.month_day.as_deref())
            .unwrap_or("")
    }
}

/// Body of `POST /send_card`. Missing contact details are sent as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRequest {
    pub name: String,
    pub recipient: String,
    pub recipient_phone: String,
    pub father_email: String,
    pub father_phone: String,
    pub mother_email: String,
    pub mother_phone: String,
}

impl From<&Person> for CardRequest {
    fn from(p: &Person) -> Self {
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            name: field(&p.name),
            recipient: field(&p.email),
            recipient_phone: field(&p.phone),
            father_email: field(&p.father_email),
            father_phone: field(&p.father_phone),
            mother_email: field(&p.mother_email),
            mother_phone: field(&p.mother_phone),
        }
    }
}
